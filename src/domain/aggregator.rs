//! The batch pass that turns sorted orders into the disbursement ledger.
//!
//! Orders must arrive sorted by merchant reference, creation date and receipt
//! time (see [`sort_orders`](super::order::sort_orders)); the pass never
//! reorders them.
//! Each order either extends the open disbursement group or seals it and opens
//! the next one. Sealing is also when the monthly minimum fee is evaluated.

use super::disbursement::Disbursement;
use super::fee::FeeCalculator;
use super::ledger::{Ledger, RejectedMerchant};
use super::merchant::{DisbursementFrequency, Merchant, MerchantRegistry};
use super::money::Cents;
use super::monthly::MonthlyFeeEvaluator;
use super::order::Order;
use super::schedule::PayoutScheduler;
use crate::config::DisbursementConfig;
use crate::error::{Aborted, DisburseError, Result};
use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// The disbursement group currently accumulating orders.
#[derive(Debug)]
struct OpenGroup {
    id: Uuid,
    fee_total: Cents,
    payout_total: Cents,
    frequency: DisbursementFrequency,
    payout_date: NaiveDate,
}

impl OpenGroup {
    fn row(&self, order: &Order, fee: Cents) -> Result<Disbursement> {
        if self.payout_total.is_negative() {
            return Err(DisburseError::NegativePayout {
                order_id: order.id.clone(),
                total: self.payout_total,
            });
        }
        Ok(Disbursement {
            record_id: Uuid::new_v4(),
            disbursement_group_id: self.id,
            merchant_reference: order.merchant_reference.clone(),
            order_id: order.id.clone(),
            order_fee: fee,
            order_fee_running_total: self.fee_total,
            payout_running_total: self.payout_total,
            payout_date: self.payout_date,
            payout_total: None,
            is_paid_out: false,
        })
    }
}

/// State of one aggregation run.
struct Pass {
    ledger: Ledger,
    open: Option<OpenGroup>,
    now: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DisbursementAggregator {
    fees: FeeCalculator,
    scheduler: PayoutScheduler,
    monthly: MonthlyFeeEvaluator,
    seal_final_group: bool,
    close_trailing_month: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl DisbursementAggregator {
    pub fn new(config: &DisbursementConfig) -> Self {
        Self {
            fees: FeeCalculator::from_config(config),
            scheduler: PayoutScheduler::from_config(config),
            monthly: MonthlyFeeEvaluator::new(),
            seal_final_group: config.seal_final_group,
            close_trailing_month: config.close_trailing_month,
            cancel: None,
        }
    }

    /// Aborts the run with [`DisburseError::Cancelled`] once `flag` is set.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Builds the disbursement and monthly fee ledgers for a sorted batch.
    ///
    /// Orders of unknown merchants or merchants with an unsupported frequency
    /// are left out and listed in [`Ledger::rejected`]. Any other failure stops
    /// the run; the rows built so far are returned inside [`Aborted`].
    pub fn aggregate(
        &self,
        orders: &[Order],
        merchants: &MerchantRegistry,
    ) -> std::result::Result<Ledger, Aborted> {
        let mut pass = Pass {
            ledger: Ledger::new(),
            open: None,
            now: Utc::now(),
        };
        let batch = screen(orders, merchants, &mut pass.ledger.rejected);

        for index in 0..batch.len() {
            if let Err(cause) = self.step(&mut pass, &batch, index) {
                return Err(Aborted {
                    partial: pass.ledger,
                    cause,
                });
            }
        }
        if let Some(&(_, merchant)) = batch.last() {
            self.finish(&mut pass, merchant);
        }

        info!(
            orders = batch.len(),
            groups = pass.ledger.group_count(),
            monthly_fees = pass.ledger.monthly_fees.len(),
            rejected_merchants = pass.ledger.rejected.len(),
            "aggregation complete"
        );
        Ok(pass.ledger)
    }

    fn step(&self, pass: &mut Pass, batch: &[(&Order, &Merchant)], index: usize) -> Result<()> {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return Err(DisburseError::Cancelled);
        }

        let (order, merchant) = batch[index];
        let fee = self.fees.fee(order.amount).inspect_err(|e| {
            error!(
                order = %order.id,
                merchant = %merchant.reference,
                error = %e,
                "fee calculation failed"
            );
        })?;

        let Some(&(previous, previous_merchant)) = index.checked_sub(1).map(|i| &batch[i]) else {
            return self.open_group(pass, order, merchant, fee);
        };

        if self.scheduler.is_new_period(previous, order, merchant)? {
            let next_payout_date = self.scheduler.payout_date_for(order, merchant)?;
            self.seal_last(pass);
            if previous_merchant.reference == merchant.reference {
                self.evaluate_month(pass, next_payout_date, merchant);
            } else if self.close_trailing_month {
                self.evaluate_trailing_month(pass, previous_merchant);
            }
            return self.open_group(pass, order, merchant, fee);
        }

        let Some(open) = pass.open.as_mut() else {
            return Err(DisburseError::AmbiguousPeriod {
                previous: previous.id.clone(),
                current: order.id.clone(),
            });
        };
        open.fee_total += fee;
        open.payout_total += order.amount - fee;
        if open.frequency == DisbursementFrequency::Weekly {
            // Weekly groups stay anchored to the order that opened them.
            open.payout_date = self.scheduler.payout_date_for(previous, merchant)?;
        }
        let row = open.row(order, fee)?;
        pass.ledger.disbursements.push(row);
        Ok(())
    }

    fn open_group(
        &self,
        pass: &mut Pass,
        order: &Order,
        merchant: &Merchant,
        fee: Cents,
    ) -> Result<()> {
        let group = OpenGroup {
            id: Uuid::new_v4(),
            fee_total: fee,
            payout_total: order.amount - fee,
            frequency: merchant.frequency()?,
            payout_date: self.scheduler.payout_date_for(order, merchant)?,
        };
        debug!(
            group = %group.id,
            merchant = %merchant.reference,
            payout_date = %group.payout_date,
            "opening disbursement group"
        );
        let row = group.row(order, fee)?;
        pass.ledger.disbursements.push(row);
        pass.open = Some(group);
        Ok(())
    }

    fn seal_last(&self, pass: &mut Pass) {
        if let Some(last) = pass.ledger.disbursements.last_mut() {
            last.seal();
        }
        pass.open = None;
    }

    fn evaluate_month(&self, pass: &mut Pass, next_payout_date: NaiveDate, merchant: &Merchant) {
        let Some(sealed) = pass.ledger.disbursements.last() else {
            return;
        };
        match self
            .monthly
            .evaluate(sealed, next_payout_date, merchant, pass.now)
        {
            Ok(Some(record)) => pass.ledger.monthly_fees.push(record),
            Ok(None) => {}
            Err(e) => {
                warn!(merchant = %merchant.reference, error = %e, "skipping monthly fee record");
            }
        }
    }

    fn evaluate_trailing_month(&self, pass: &mut Pass, merchant: &Merchant) {
        let Some(month_end) = pass
            .ledger
            .disbursements
            .last()
            .and_then(|row| first_of_next_month(row.payout_date))
        else {
            return;
        };
        self.evaluate_month(pass, month_end, merchant);
    }

    fn finish(&self, pass: &mut Pass, merchant: &Merchant) {
        if self.seal_final_group {
            self.seal_last(pass);
        }
        if self.close_trailing_month {
            self.evaluate_trailing_month(pass, merchant);
        }
    }
}

impl Default for DisbursementAggregator {
    fn default() -> Self {
        Self::new(&DisbursementConfig::default())
    }
}

/// Pairs each order with its merchant, dropping orders whose merchant cannot
/// be aggregated.
fn screen<'a>(
    orders: &'a [Order],
    merchants: &'a MerchantRegistry,
    rejected: &mut Vec<RejectedMerchant>,
) -> Vec<(&'a Order, &'a Merchant)> {
    let mut verdicts: HashMap<&str, std::result::Result<&Merchant, usize>> = HashMap::new();
    let mut accepted = Vec::with_capacity(orders.len());

    for order in orders {
        let reference = order.merchant_reference.as_str();
        let verdict = *verdicts.entry(reference).or_insert_with(|| {
            let checked = merchants
                .get(reference)
                .ok_or_else(|| DisburseError::UnknownMerchant(reference.to_string()))
                .and_then(|merchant| merchant.frequency().map(|_| merchant));
            checked.map_err(|e| {
                warn!(merchant = %reference, error = %e, "rejecting orders of merchant");
                rejected.push(RejectedMerchant {
                    reference: reference.to_string(),
                    orders: 0,
                    reason: e.to_string(),
                });
                rejected.len() - 1
            })
        });

        match verdict {
            Ok(merchant) => accepted.push((order, merchant)),
            Err(slot) => rejected[slot].orders += 1,
        }
    }
    accepted
}

fn first_of_next_month(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?.checked_add_months(Months::new(1))
}
