use super::disbursement::Disbursement;
use super::merchant::Merchant;
use super::monthly::MonthlyFee;
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

#[async_trait]
pub trait MerchantStore: Send + Sync {
    async fn store(&self, merchant: Merchant) -> Result<()>;
    async fn get(&self, reference: &str) -> Result<Option<Merchant>>;
    async fn get_all(&self) -> Result<Vec<Merchant>>;
}

#[async_trait]
pub trait DisbursementStore: Send + Sync {
    /// Persists a ledger row, registering its `(merchant, payout date)` group
    /// the first time it is seen. Returns the row's record id.
    async fn insert(&self, row: Disbursement) -> Result<Uuid>;

    async fn group_id(
        &self,
        payout_date: NaiveDate,
        merchant_reference: &str,
    ) -> Result<Option<Uuid>>;

    /// Registers `candidate` for the pair unless a group already exists.
    async fn register_group(
        &self,
        payout_date: NaiveDate,
        merchant_reference: &str,
        candidate: Uuid,
    ) -> Result<Uuid>;

    async fn get_or_create_group_id(
        &self,
        payout_date: NaiveDate,
        merchant_reference: &str,
    ) -> Result<Uuid> {
        match self.group_id(payout_date, merchant_reference).await? {
            Some(id) => Ok(id),
            None => {
                self.register_group(payout_date, merchant_reference, Uuid::new_v4())
                    .await
            }
        }
    }

    /// The most recently inserted row of a group.
    async fn last_in_group(&self, group_id: Uuid) -> Result<Option<Disbursement>>;

    /// Overwrites the persisted row with the same record id.
    async fn update(&self, row: Disbursement) -> Result<()>;

    async fn get_all(&self) -> Result<Vec<Disbursement>>;
}

#[async_trait]
pub trait MonthlyFeeStore: Send + Sync {
    async fn insert(&self, record: MonthlyFee) -> Result<()>;
    async fn get_all(&self) -> Result<Vec<MonthlyFee>>;
}

pub type MerchantStoreBox = Box<dyn MerchantStore>;
pub type DisbursementStoreBox = Box<dyn DisbursementStore>;
pub type MonthlyFeeStoreBox = Box<dyn MonthlyFeeStore>;

pub type MerchantStoreFactory = Box<dyn Fn() -> MerchantStoreBox + Send + Sync>;
pub type DisbursementStoreFactory = Box<dyn Fn() -> DisbursementStoreBox + Send + Sync>;

/// The three stores an import writes to.
pub struct Stores {
    pub merchants: MerchantStoreBox,
    pub disbursements: DisbursementStoreBox,
    pub monthly_fees: MonthlyFeeStoreBox,
}
