use crate::domain::disbursement::Disbursement;
use crate::domain::merchant::Merchant;
use crate::domain::monthly::MonthlyFee;
use crate::domain::ports::{DisbursementStore, MerchantStore, MonthlyFeeStore};
use crate::error::{DisburseError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Merchants keyed by reference, shared behind `Arc<RwLock<..>>`.
#[derive(Default, Clone)]
pub struct InMemoryMerchantStore {
    merchants: Arc<RwLock<HashMap<String, Merchant>>>,
}

impl InMemoryMerchantStore {
    /// Creates a new, empty in-memory merchant store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MerchantStore for InMemoryMerchantStore {
    async fn store(&self, merchant: Merchant) -> Result<()> {
        let mut merchants = self.merchants.write().await;
        merchants.insert(merchant.reference.clone(), merchant);
        Ok(())
    }

    async fn get(&self, reference: &str) -> Result<Option<Merchant>> {
        let merchants = self.merchants.read().await;
        Ok(merchants.get(reference).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Merchant>> {
        let merchants = self.merchants.read().await;
        let mut all: Vec<Merchant> = merchants.values().cloned().collect();
        all.sort_by(|a, b| a.reference.cmp(&b.reference));
        Ok(all)
    }
}

#[derive(Default)]
struct DisbursementTables {
    rows: Vec<Disbursement>,
    groups: HashMap<(NaiveDate, String), Uuid>,
}

/// Disbursement rows in insertion order plus the group registry.
#[derive(Default, Clone)]
pub struct InMemoryDisbursementStore {
    tables: Arc<RwLock<DisbursementTables>>,
}

impl InMemoryDisbursementStore {
    /// Creates a new, empty in-memory disbursement store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DisbursementStore for InMemoryDisbursementStore {
    async fn insert(&self, row: Disbursement) -> Result<Uuid> {
        let mut tables = self.tables.write().await;
        tables
            .groups
            .entry((row.payout_date, row.merchant_reference.clone()))
            .or_insert(row.disbursement_group_id);
        let id = row.record_id;
        tables.rows.push(row);
        Ok(id)
    }

    async fn group_id(
        &self,
        payout_date: NaiveDate,
        merchant_reference: &str,
    ) -> Result<Option<Uuid>> {
        let tables = self.tables.read().await;
        Ok(tables
            .groups
            .get(&(payout_date, merchant_reference.to_string()))
            .copied())
    }

    async fn register_group(
        &self,
        payout_date: NaiveDate,
        merchant_reference: &str,
        candidate: Uuid,
    ) -> Result<Uuid> {
        let mut tables = self.tables.write().await;
        Ok(*tables
            .groups
            .entry((payout_date, merchant_reference.to_string()))
            .or_insert(candidate))
    }

    async fn last_in_group(&self, group_id: Uuid) -> Result<Option<Disbursement>> {
        let tables = self.tables.read().await;
        Ok(tables
            .rows
            .iter()
            .rev()
            .find(|row| row.disbursement_group_id == group_id)
            .cloned())
    }

    async fn update(&self, row: Disbursement) -> Result<()> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .rows
            .iter_mut()
            .find(|stored| stored.record_id == row.record_id)
            .ok_or_else(|| {
                DisburseError::StorageError(format!("disbursement {} not found", row.record_id))
            })?;
        *slot = row;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Disbursement>> {
        let tables = self.tables.read().await;
        Ok(tables.rows.clone())
    }
}

/// Monthly fee records in insertion order.
#[derive(Default, Clone)]
pub struct InMemoryMonthlyFeeStore {
    records: Arc<RwLock<Vec<MonthlyFee>>>,
}

impl InMemoryMonthlyFeeStore {
    /// Creates a new, empty in-memory monthly fee store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MonthlyFeeStore for InMemoryMonthlyFeeStore {
    async fn insert(&self, record: MonthlyFee) -> Result<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<MonthlyFee>> {
        Ok(self.records.read().await.clone())
    }
}
