use super::report::Reporter;
use crate::config::DisbursementConfig;
use crate::domain::aggregator::DisbursementAggregator;
use crate::domain::disbursement::Disbursement;
use crate::domain::ledger::Ledger;
use crate::domain::merchant::{Merchant, MerchantRegistry};
use crate::domain::money::Cents;
use crate::domain::order::{Order, sort_orders};
use crate::domain::ports::Stores;
use crate::error::{Aborted, DisburseError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::task::JoinSet;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Runs an import: registers merchants, aggregates the batch and persists the
/// resulting ledger.
///
/// A batch is all-or-nothing. If aggregation fails, nothing is written.
pub struct DisbursementService {
    config: DisbursementConfig,
    stores: Stores,
    parallel: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl DisbursementService {
    pub fn new(config: DisbursementConfig, stores: Stores) -> Self {
        Self {
            config,
            stores,
            parallel: false,
            cancel: None,
        }
    }

    /// Aggregates each merchant's orders on its own blocking task.
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn reporter(&self) -> Reporter<'_> {
        Reporter::new(
            self.stores.disbursements.as_ref(),
            self.stores.monthly_fees.as_ref(),
        )
    }

    pub async fn import(&self, mut orders: Vec<Order>, merchants: Vec<Merchant>) -> Result<Ledger> {
        let registry: MerchantRegistry = merchants
            .iter()
            .map(|merchant| (merchant.reference.clone(), merchant.clone()))
            .collect();

        sort_orders(&mut orders);
        let total = orders.len();

        let aggregated = if self.parallel {
            self.aggregate_by_merchant(orders, Arc::new(registry)).await
        } else {
            self.aggregator(&self.config).aggregate(&orders, &registry)
        };
        let mut ledger = aggregated.map_err(|aborted| {
            error!(
                orders = total,
                rows_before_failure = aborted.partial.disbursements.len(),
                error = %aborted.cause,
                "rejecting batch"
            );
            DisburseError::from(aborted)
        })?;

        for merchant in merchants {
            self.stores.merchants.store(merchant).await?;
        }

        if self.config.reuse_persisted_groups {
            for row in self.remap_groups(&mut ledger).await? {
                self.stores.disbursements.update(row).await?;
            }
        }

        for row in &ledger.disbursements {
            self.stores.disbursements.insert(row.clone()).await?;
        }
        for record in &ledger.monthly_fees {
            self.stores.monthly_fees.insert(record.clone()).await?;
        }

        info!(
            orders = total,
            disbursements = ledger.disbursements.len(),
            monthly_fees = ledger.monthly_fees.len(),
            "batch persisted"
        );
        Ok(ledger)
    }

    /// Aggregates every merchant's run of orders concurrently and merges the
    /// results in input order.
    ///
    /// `orders` must already be sorted. The merged ledger matches a sequential
    /// pass over the same batch, except for generated ids.
    pub async fn aggregate_by_merchant(
        &self,
        orders: Vec<Order>,
        merchants: Arc<MerchantRegistry>,
    ) -> std::result::Result<Ledger, Aborted> {
        let runs = split_by_merchant(orders);
        let last = runs.len().saturating_sub(1);
        let mut workers = JoinSet::new();

        for (index, run) in runs.into_iter().enumerate() {
            // Only the batch's last group is subject to `seal_final_group`; a
            // merchant change always seals.
            let config = DisbursementConfig {
                seal_final_group: self.config.seal_final_group || index < last,
                ..self.config.clone()
            };
            let aggregator = self.aggregator(&config);
            let merchants = Arc::clone(&merchants);
            workers.spawn_blocking(move || (index, aggregator.aggregate(&run, &merchants)));
        }

        let mut results = Vec::with_capacity(workers.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => {
                    return Err(Aborted {
                        partial: Ledger::new(),
                        cause: DisburseError::WorkerFailed(e.to_string()),
                    });
                }
            }
        }
        results.sort_by_key(|(index, _)| *index);

        let mut merged = Ledger::new();
        for (_, result) in results {
            match result {
                Ok(ledger) => merged.extend(ledger),
                Err(aborted) => {
                    merged.extend(aborted.partial);
                    return Err(Aborted {
                        partial: merged,
                        cause: aborted.cause,
                    });
                }
            }
        }
        Ok(merged)
    }

    fn aggregator(&self, config: &DisbursementConfig) -> DisbursementAggregator {
        let aggregator = DisbursementAggregator::new(config);
        match &self.cancel {
            Some(flag) => aggregator.with_cancellation(Arc::clone(flag)),
            None => aggregator,
        }
    }

    /// Moves each fresh group onto the group already persisted for the same
    /// payout date and merchant, if any.
    ///
    /// Running totals continue from the persisted group's last row, and its
    /// seal moves to the batch's last row of that group. Returns the persisted
    /// rows that were reopened.
    async fn remap_groups(&self, ledger: &mut Ledger) -> Result<Vec<Disbursement>> {
        let mut carried: HashMap<Uuid, (Uuid, Cents, Cents)> = HashMap::new();
        let mut reopened = Vec::new();
        for row in &mut ledger.disbursements {
            let (id, fees, payouts) = match carried.get(&row.disbursement_group_id) {
                Some(entry) => *entry,
                None => {
                    let store = &self.stores.disbursements;
                    let id = store
                        .get_or_create_group_id(row.payout_date, &row.merchant_reference)
                        .await?;
                    let entry = match store.last_in_group(id).await? {
                        Some(mut tail) => {
                            let entry =
                                (id, tail.order_fee_running_total, tail.payout_running_total);
                            if tail.is_sealed() {
                                tail.reopen();
                                reopened.push(tail);
                            }
                            entry
                        }
                        None => (id, Cents::ZERO, Cents::ZERO),
                    };
                    carried.insert(row.disbursement_group_id, entry);
                    entry
                }
            };
            row.disbursement_group_id = id;
            row.order_fee_running_total += fees;
            row.payout_running_total += payouts;
            if row.is_sealed() {
                row.seal();
            }
        }
        if !reopened.is_empty() {
            debug!(groups = reopened.len(), "extending persisted disbursement groups");
        }
        Ok(reopened)
    }
}

/// Splits a sorted batch into one run per merchant, keeping order.
fn split_by_merchant(orders: Vec<Order>) -> Vec<Vec<Order>> {
    let mut runs: Vec<Vec<Order>> = Vec::new();
    for order in orders {
        match runs.last_mut() {
            Some(run) if run[0].merchant_reference == order.merchant_reference => run.push(order),
            _ => runs.push(vec![order]),
        }
    }
    runs
}
