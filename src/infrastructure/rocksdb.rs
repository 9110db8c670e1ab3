use crate::domain::disbursement::Disbursement;
use crate::domain::merchant::Merchant;
use crate::domain::monthly::MonthlyFee;
use crate::domain::ports::{DisbursementStore, MerchantStore, MonthlyFeeStore};
use crate::error::{DisburseError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Column Family for merchants, keyed by reference.
pub const CF_MERCHANTS: &str = "merchants";
/// Column Family for ledger rows, keyed by insertion sequence.
pub const CF_DISBURSEMENTS: &str = "disbursements";
/// Column Family for monthly fee records, keyed by insertion sequence.
pub const CF_MONTHLY_FEES: &str = "monthly_fees";
/// Column Family mapping `payout_date|merchant_reference` to a group id.
pub const CF_GROUPS: &str = "disbursement_groups";
/// Column Family locating rows by record id (`record:<id>`) and the latest row
/// of each group (`tail:<id>`), both as sequence numbers.
pub const CF_INDEX: &str = "disbursement_index";

/// A persistent store backed by RocksDB.
///
/// Every entity lives in its own Column Family with JSON values. Rows are keyed
/// by a big-endian sequence number so iteration returns them in insertion
/// order, across restarts too.
///
/// `Clone` shares the underlying `Arc<DB>` and sequence counters.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    next_row: Arc<AtomicU64>,
    next_fee: Arc<AtomicU64>,
    group_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a database at `path`, creating missing column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [
            CF_MERCHANTS,
            CF_DISBURSEMENTS,
            CF_MONTHLY_FEES,
            CF_GROUPS,
            CF_INDEX,
        ]
        .into_iter()
        .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, families)?;

        let store = Self {
            db: Arc::new(db),
            next_row: Arc::new(AtomicU64::new(0)),
            next_fee: Arc::new(AtomicU64::new(0)),
            group_lock: Arc::new(Mutex::new(())),
        };
        store
            .next_row
            .store(store.next_sequence(CF_DISBURSEMENTS)?, Ordering::SeqCst);
        store
            .next_fee
            .store(store.next_sequence(CF_MONTHLY_FEES)?, Ordering::SeqCst);
        Ok(store)
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| DisburseError::StorageError(format!("{name} column family not found")))
    }

    /// One past the highest sequence key in `name`.
    fn next_sequence(&self, name: &str) -> Result<u64> {
        let cf = self.cf(name)?;
        let Some(item) = self.db.iterator_cf(cf, IteratorMode::End).next() else {
            return Ok(0);
        };
        let (key, _) = item?;
        let bytes: [u8; 8] = key[..].try_into().map_err(|_| {
            DisburseError::StorageError(format!("malformed sequence key in {name}"))
        })?;
        Ok(u64::from_be_bytes(bytes) + 1)
    }

    fn values<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        let cf = self.cf(name)?;
        self.db
            .iterator_cf(cf, IteratorMode::Start)
            .map(|item| -> Result<T> {
                let (_key, value) = item?;
                Ok(serde_json::from_slice(&value)?)
            })
            .collect()
    }

    /// Sequence key stored under `key` in the index column family.
    fn indexed_sequence(&self, key: &str) -> Result<Option<[u8; 8]>> {
        let cf = self.cf(CF_INDEX)?;
        let Some(bytes) = self.db.get_cf(cf, key)? else {
            return Ok(None);
        };
        let seq: [u8; 8] = bytes[..].try_into().map_err(|_| {
            DisburseError::StorageError(format!("malformed index entry {key}"))
        })?;
        Ok(Some(seq))
    }

    fn group_key(payout_date: NaiveDate, merchant_reference: &str) -> String {
        format!("{payout_date}|{merchant_reference}")
    }

    fn read_group(&self, key: &str) -> Result<Option<Uuid>> {
        let cf = self.cf(CF_GROUPS)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_group_if_absent(&self, key: &str, candidate: Uuid) -> Result<Uuid> {
        if let Some(existing) = self.read_group(key)? {
            return Ok(existing);
        }
        let cf = self.cf(CF_GROUPS)?;
        self.db.put_cf(cf, key, serde_json::to_vec(&candidate)?)?;
        Ok(candidate)
    }
}

#[async_trait]
impl MerchantStore for RocksDBStore {
    async fn store(&self, merchant: Merchant) -> Result<()> {
        let cf = self.cf(CF_MERCHANTS)?;
        let value = serde_json::to_vec(&merchant)?;
        self.db.put_cf(cf, merchant.reference.as_bytes(), value)?;
        Ok(())
    }

    async fn get(&self, reference: &str) -> Result<Option<Merchant>> {
        let cf = self.cf(CF_MERCHANTS)?;
        match self.db.get_cf(cf, reference.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn get_all(&self) -> Result<Vec<Merchant>> {
        self.values(CF_MERCHANTS)
    }
}

#[async_trait]
impl DisbursementStore for RocksDBStore {
    async fn insert(&self, row: Disbursement) -> Result<Uuid> {
        let _guard = self.group_lock.lock().await;
        let key = Self::group_key(row.payout_date, &row.merchant_reference);
        self.write_group_if_absent(&key, row.disbursement_group_id)?;

        let seq = self.next_row.fetch_add(1, Ordering::SeqCst).to_be_bytes();
        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_DISBURSEMENTS)?, seq, serde_json::to_vec(&row)?);
        let index = self.cf(CF_INDEX)?;
        batch.put_cf(index, format!("record:{}", row.record_id), seq);
        batch.put_cf(index, format!("tail:{}", row.disbursement_group_id), seq);
        self.db.write(batch)?;
        Ok(row.record_id)
    }

    async fn group_id(
        &self,
        payout_date: NaiveDate,
        merchant_reference: &str,
    ) -> Result<Option<Uuid>> {
        self.read_group(&Self::group_key(payout_date, merchant_reference))
    }

    async fn register_group(
        &self,
        payout_date: NaiveDate,
        merchant_reference: &str,
        candidate: Uuid,
    ) -> Result<Uuid> {
        let _guard = self.group_lock.lock().await;
        self.write_group_if_absent(&Self::group_key(payout_date, merchant_reference), candidate)
    }

    async fn last_in_group(&self, group_id: Uuid) -> Result<Option<Disbursement>> {
        let Some(seq) = self.indexed_sequence(&format!("tail:{group_id}"))? else {
            return Ok(None);
        };
        match self.db.get_cf(self.cf(CF_DISBURSEMENTS)?, seq)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, row: Disbursement) -> Result<()> {
        let seq = self
            .indexed_sequence(&format!("record:{}", row.record_id))?
            .ok_or_else(|| {
                DisburseError::StorageError(format!("disbursement {} not found", row.record_id))
            })?;
        self.db
            .put_cf(self.cf(CF_DISBURSEMENTS)?, seq, serde_json::to_vec(&row)?)?;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Disbursement>> {
        self.values(CF_DISBURSEMENTS)
    }
}

#[async_trait]
impl MonthlyFeeStore for RocksDBStore {
    async fn insert(&self, record: MonthlyFee) -> Result<()> {
        let cf = self.cf(CF_MONTHLY_FEES)?;
        let seq = self.next_fee.fetch_add(1, Ordering::SeqCst);
        self.db
            .put_cf(cf, seq.to_be_bytes(), serde_json::to_vec(&record)?)?;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<MonthlyFee>> {
        self.values(CF_MONTHLY_FEES)
    }
}
