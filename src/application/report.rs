//! Payout figures per date range, read back from the stores.

use crate::domain::disbursement::Disbursement;
use crate::domain::monthly::MonthlyFee;
use crate::domain::money::Cents;
use crate::domain::ports::{DisbursementStore, MonthlyFeeStore};
use crate::error::{DisburseError, Result};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

#[derive(Debug, Default, Serialize, PartialEq, Eq, Clone, Copy)]
pub struct DisbursementSummary {
    /// Sealed groups paid out in the range.
    pub number_of_disbursements: usize,
    pub amount_disbursed: Cents,
    pub amount_of_order_fees: Cents,
    pub number_of_monthly_fees_charged: usize,
    pub amount_of_monthly_fees_charged: Cents,
}

/// One summary line per payout year.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct YearlySummary {
    pub year: i32,
    pub number_of_disbursements: usize,
    pub amount_disbursed: Cents,
    pub amount_of_order_fees: Cents,
    pub number_of_monthly_fees_charged: usize,
    pub amount_of_monthly_fees_charged: Cents,
}

impl YearlySummary {
    pub fn new(year: i32, summary: DisbursementSummary) -> Self {
        Self {
            year,
            number_of_disbursements: summary.number_of_disbursements,
            amount_disbursed: summary.amount_disbursed,
            amount_of_order_fees: summary.amount_of_order_fees,
            number_of_monthly_fees_charged: summary.number_of_monthly_fees_charged,
            amount_of_monthly_fees_charged: summary.amount_of_monthly_fees_charged,
        }
    }
}

/// Totals `rows` and `monthly` whose payout or fee date falls in `range`.
pub fn summarize(
    rows: &[Disbursement],
    monthly: &[MonthlyFee],
    range: &RangeInclusive<NaiveDate>,
) -> DisbursementSummary {
    let in_range: Vec<&Disbursement> = rows
        .iter()
        .filter(|row| range.contains(&row.payout_date))
        .collect();
    let charged: Vec<&MonthlyFee> = monthly
        .iter()
        .filter(|record| record.did_pay_fee && range.contains(&record.monthly_fee_date))
        .collect();

    DisbursementSummary {
        number_of_disbursements: in_range.iter().filter(|row| row.is_sealed()).count(),
        amount_disbursed: in_range.iter().filter_map(|row| row.payout_total).sum(),
        amount_of_order_fees: in_range.iter().map(|row| row.order_fee).sum(),
        number_of_monthly_fees_charged: charged.len(),
        amount_of_monthly_fees_charged: charged.iter().map(|r| r.charged_amount()).sum(),
    }
}

pub struct Reporter<'a> {
    disbursements: &'a dyn DisbursementStore,
    monthly_fees: &'a dyn MonthlyFeeStore,
}

impl<'a> Reporter<'a> {
    pub fn new(
        disbursements: &'a dyn DisbursementStore,
        monthly_fees: &'a dyn MonthlyFeeStore,
    ) -> Self {
        Self {
            disbursements,
            monthly_fees,
        }
    }

    pub async fn summary(&self, start: NaiveDate, end: NaiveDate) -> Result<DisbursementSummary> {
        let rows = self.disbursements.get_all().await?;
        let monthly = self.monthly_fees.get_all().await?;
        Ok(summarize(&rows, &monthly, &(start..=end)))
    }

    pub async fn yearly(&self, year: i32) -> Result<DisbursementSummary> {
        let (start, end) = year_bounds(year)?;
        self.summary(start, end).await
    }

    /// Payout years present in the ledger, ascending.
    pub async fn years(&self) -> Result<Vec<i32>> {
        let rows = self.disbursements.get_all().await?;
        let years: BTreeSet<i32> = rows.iter().map(|row| row.payout_date.year()).collect();
        Ok(years.into_iter().collect())
    }

    /// A summary line for every payout year.
    pub async fn all_years(&self) -> Result<Vec<YearlySummary>> {
        let rows = self.disbursements.get_all().await?;
        let monthly = self.monthly_fees.get_all().await?;
        let years: BTreeSet<i32> = rows.iter().map(|row| row.payout_date.year()).collect();

        years
            .into_iter()
            .map(|year| {
                let (start, end) = year_bounds(year)?;
                Ok(YearlySummary::new(
                    year,
                    summarize(&rows, &monthly, &(start..=end)),
                ))
            })
            .collect()
    }
}

fn year_bounds(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);
    start
        .zip(end)
        .ok_or_else(|| DisburseError::ConfigError(format!("year {year} is out of range")))
}
