use super::disbursement::Disbursement;
use super::merchant::Merchant;
use super::money::Cents;
use crate::error::Result;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Outcome of a minimum monthly fee evaluation for one merchant month.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct MonthlyFee {
    pub id: Uuid,
    pub merchant_reference: String,
    pub merchant_id: Uuid,
    pub monthly_fee_date: NaiveDate,
    /// Whether the minimum fee had to be charged because order fees fell short.
    #[serde(
        serialize_with = "serialize_flag",
        deserialize_with = "deserialize_flag"
    )]
    pub did_pay_fee: bool,
    pub monthly_fee: Cents,
    pub total_order_amt: Cents,
    pub order_fee_total: Cents,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MonthlyFee {
    /// The part of the minimum fee not already covered by order fees.
    pub fn charged_amount(&self) -> Cents {
        if !self.did_pay_fee {
            return Cents::ZERO;
        }
        (self.monthly_fee - self.order_fee_total).max(Cents::ZERO)
    }
}

fn serialize_flag<S>(flag: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*flag))
}

fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match u8::deserialize(deserializer)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(serde::de::Error::custom(format!(
            "did_pay_fee must be 0 or 1, got {other}"
        ))),
    }
}

/// Decides, when a payout period is sealed, whether a monthly fee record is due.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthlyFeeEvaluator;

impl MonthlyFeeEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Returns a record when `next_payout_date` lies in a later calendar month
    /// than the sealed row's payout date.
    pub fn evaluate(
        &self,
        sealed: &Disbursement,
        next_payout_date: NaiveDate,
        merchant: &Merchant,
        now: DateTime<Utc>,
    ) -> Result<Option<MonthlyFee>> {
        if same_month(sealed.payout_date, next_payout_date) {
            return Ok(None);
        }

        let monthly_fee = merchant.minimum_monthly_fee()?;
        let covered = monthly_fee == Cents::ZERO
            || (sealed.order_fee_running_total - monthly_fee).value() > 0;

        Ok(Some(MonthlyFee {
            id: Uuid::new_v4(),
            merchant_reference: merchant.reference.clone(),
            merchant_id: merchant.id,
            monthly_fee_date: next_payout_date,
            did_pay_fee: !covered,
            monthly_fee,
            total_order_amt: sealed.payout_running_total,
            order_fee_total: sealed.order_fee_running_total,
            created_at: now,
            updated_at: now,
        }))
    }
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
