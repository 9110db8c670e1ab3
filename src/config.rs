//! Immutable settings for a disbursement run.
//!
//! Every value has a default matching the current merchant contract, so an
//! empty JSON object (or no file at all) yields a usable configuration.

use crate::domain::money::Cents;
use crate::error::{DisburseError, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fee tiers. Rates are expressed per mille so that every tier uses the same
/// truncating integer formula `amount * rate / 1000`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// Orders strictly below this amount pay `small_order_rate`.
    pub small_order_limit: Cents,
    /// Orders at or above this amount pay `large_order_rate`.
    pub large_order_threshold: Cents,
    pub small_order_rate: i64,
    pub medium_order_rate: i64,
    pub large_order_rate: i64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            small_order_limit: Cents(5_000),
            large_order_threshold: Cents(30_000),
            small_order_rate: 100,
            medium_order_rate: 50,
            large_order_rate: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisbursementConfig {
    pub fees: FeeSchedule,
    /// Largest order amount a fee may be computed for.
    pub max_order: Cents,
    /// Orders received at or after this time are paid out the next day.
    pub daily_cutoff: NaiveTime,
    /// Seal the group still open when the batch ends.
    pub seal_final_group: bool,
    /// Treat the end of each merchant's sequence as a month close.
    pub close_trailing_month: bool,
    /// Reuse group ids already persisted for the same payout date and merchant.
    pub reuse_persisted_groups: bool,
}

impl Default for DisbursementConfig {
    fn default() -> Self {
        Self {
            fees: FeeSchedule::default(),
            max_order: Cents(1_000_000),
            daily_cutoff: NaiveTime::from_hms_opt(23, 0, 0).unwrap_or(NaiveTime::MIN),
            seal_final_group: true,
            close_trailing_month: false,
            reuse_persisted_groups: false,
        }
    }
}

impl DisbursementConfig {
    /// Reads a JSON configuration file and validates it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fees = &self.fees;
        if fees.small_order_limit.is_negative()
            || fees.small_order_limit > fees.large_order_threshold
        {
            return Err(DisburseError::ConfigError(format!(
                "fee tiers out of order: small limit {} / large threshold {}",
                fees.small_order_limit, fees.large_order_threshold
            )));
        }
        if [
            fees.small_order_rate,
            fees.medium_order_rate,
            fees.large_order_rate,
        ]
        .iter()
        .any(|rate| !(0..=1000).contains(rate))
        {
            return Err(DisburseError::ConfigError(
                "fee rates must be between 0 and 1000 per mille".to_string(),
            ));
        }
        if self.max_order.value() <= 0 {
            return Err(DisburseError::ConfigError(
                "max_order must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
