use super::money::Cents;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ledger row per order.
///
/// Rows sharing a `disbursement_group_id` are paid out together. Running totals
/// accumulate within the group; the last row of a group carries the sealed
/// `payout_total` and `is_paid_out = true`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Disbursement {
    pub record_id: Uuid,
    pub disbursement_group_id: Uuid,
    pub merchant_reference: String,
    pub order_id: String,
    pub order_fee: Cents,
    pub order_fee_running_total: Cents,
    pub payout_running_total: Cents,
    pub payout_date: NaiveDate,
    pub payout_total: Option<Cents>,
    pub is_paid_out: bool,
}

impl Disbursement {
    /// Closes the group this row ends.
    pub fn seal(&mut self) {
        self.payout_total = Some(self.payout_running_total);
        self.is_paid_out = true;
    }

    /// Reopens the group this row ended so that later rows can extend it.
    pub fn reopen(&mut self) {
        self.payout_total = None;
        self.is_paid_out = false;
    }

    pub fn is_sealed(&self) -> bool {
        self.is_paid_out
    }
}
