use super::disbursement::Disbursement;
use super::monthly::MonthlyFee;
use serde::Serialize;
use std::collections::HashSet;

/// Orders of a merchant that could not be aggregated.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct RejectedMerchant {
    pub reference: String,
    pub orders: usize,
    pub reason: String,
}

/// Everything one aggregation run produces.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Ledger {
    pub disbursements: Vec<Disbursement>,
    pub monthly_fees: Vec<MonthlyFee>,
    pub rejected: Vec<RejectedMerchant>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends another ledger, keeping row order.
    pub fn extend(&mut self, other: Ledger) {
        self.disbursements.extend(other.disbursements);
        self.monthly_fees.extend(other.monthly_fees);
        self.rejected.extend(other.rejected);
    }

    pub fn group_count(&self) -> usize {
        self.disbursements
            .iter()
            .map(|row| row.disbursement_group_id)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Rows that close a group.
    pub fn sealed(&self) -> impl Iterator<Item = &Disbursement> {
        self.disbursements.iter().filter(|row| row.is_paid_out)
    }
}
