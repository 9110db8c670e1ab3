use super::money::Cents;
use crate::config::{DisbursementConfig, FeeSchedule};
use crate::error::{DisburseError, Result};

/// Computes the per-order commission on the tiered schedule.
#[derive(Debug, Clone)]
pub struct FeeCalculator {
    schedule: FeeSchedule,
    max_order: Cents,
}

impl FeeCalculator {
    pub fn new(schedule: FeeSchedule, max_order: Cents) -> Self {
        Self {
            schedule,
            max_order,
        }
    }

    pub fn from_config(config: &DisbursementConfig) -> Self {
        Self::new(config.fees.clone(), config.max_order)
    }

    /// Returns the fee for an order amount.
    ///
    /// Non-positive amounts carry no fee.
    pub fn fee(&self, amount: Cents) -> Result<Cents> {
        if amount > self.max_order {
            return Err(DisburseError::OrderLimitExceeded {
                amount,
                max: self.max_order,
            });
        }
        if amount.value() <= 0 {
            return Ok(Cents::ZERO);
        }

        let rate = if amount < self.schedule.small_order_limit {
            self.schedule.small_order_rate
        } else if amount < self.schedule.large_order_threshold {
            self.schedule.medium_order_rate
        } else {
            self.schedule.large_order_rate
        };

        // i128 keeps a generous max_order from overflowing the product.
        let fee = i128::from(amount.value()) * i128::from(rate) / 1000;
        i64::try_from(fee)
            .map(Cents)
            .map_err(|_| DisburseError::OrderLimitExceeded {
                amount,
                max: self.max_order,
            })
    }
}

impl Default for FeeCalculator {
    fn default() -> Self {
        Self::from_config(&DisbursementConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fee(amount: i64) -> Result<Cents> {
        FeeCalculator::default().fee(Cents(amount))
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(fee(4999).unwrap(), Cents(499));
        assert_eq!(fee(5000).unwrap(), Cents(250));
        assert_eq!(fee(29999).unwrap(), Cents(1499));
        assert_eq!(fee(30000).unwrap(), Cents(750));
        assert_eq!(fee(30001).unwrap(), Cents(750));
    }

    #[test]
    fn test_truncating_division() {
        assert_eq!(fee(1).unwrap(), Cents(0));
        assert_eq!(fee(19).unwrap(), Cents(1));
        assert_eq!(fee(10229).unwrap(), Cents(511));
        assert_eq!(fee(43321).unwrap(), Cents(1083));
    }

    #[test]
    fn test_max_order() {
        assert_eq!(fee(1_000_000).unwrap(), Cents(25_000));
        assert!(matches!(
            fee(1_000_001),
            Err(DisburseError::OrderLimitExceeded { amount, .. }) if amount == Cents(1_000_001)
        ));
    }

    #[test]
    fn test_non_positive_amounts() {
        assert_eq!(fee(0).unwrap(), Cents::ZERO);
        assert_eq!(fee(-500).unwrap(), Cents::ZERO);
    }

    #[test]
    fn test_custom_schedule() {
        let schedule = FeeSchedule {
            small_order_limit: Cents(100),
            large_order_threshold: Cents(1000),
            small_order_rate: 0,
            medium_order_rate: 10,
            large_order_rate: 1,
        };
        let calculator = FeeCalculator::new(schedule, Cents(10_000));
        assert_eq!(calculator.fee(Cents(99)).unwrap(), Cents(0));
        assert_eq!(calculator.fee(Cents(500)).unwrap(), Cents(5));
        assert_eq!(calculator.fee(Cents(5000)).unwrap(), Cents(5));
    }
}
