use super::merchant::{DisbursementFrequency, Merchant};
use super::order::Order;
use crate::config::DisbursementConfig;
use crate::error::{DisburseError, Result};
use chrono::{Datelike, Days, NaiveDate, NaiveTime};

/// Period and payout-date rules for daily and weekly merchants.
#[derive(Debug, Clone)]
pub struct PayoutScheduler {
    daily_cutoff: NaiveTime,
}

impl PayoutScheduler {
    pub fn new(daily_cutoff: NaiveTime) -> Self {
        Self { daily_cutoff }
    }

    pub fn from_config(config: &DisbursementConfig) -> Self {
        Self::new(config.daily_cutoff)
    }

    /// Whether `current` opens a new payout period after `previous`.
    ///
    /// `merchant` must be the merchant owning `current`.
    pub fn is_new_period(
        &self,
        previous: &Order,
        current: &Order,
        merchant: &Merchant,
    ) -> Result<bool> {
        if merchant.reference != current.merchant_reference {
            return Err(DisburseError::AmbiguousPeriod {
                previous: previous.id.clone(),
                current: current.id.clone(),
            });
        }
        if previous.merchant_reference != current.merchant_reference {
            return Ok(true);
        }

        // Daily orders received after the cutoff move to the next day's payout,
        // so both frequencies split on the derived payout date.
        Ok(self.payout_date_for(previous, merchant)? != self.payout_date_for(current, merchant)?)
    }

    /// The date `order` is paid out on.
    pub fn payout_date_for(&self, order: &Order, merchant: &Merchant) -> Result<NaiveDate> {
        match merchant.frequency()? {
            DisbursementFrequency::Daily => match order.received_at {
                Some(time) if time >= self.daily_cutoff => add_days(order.created_at, 1),
                _ => Ok(order.created_at),
            },
            DisbursementFrequency::Weekly => {
                let target = merchant.payout_weekday().num_days_from_sunday();
                let weekday = order.created_at.weekday().num_days_from_sunday();
                add_days(order.created_at, (target + 7 - weekday) % 7)
            }
        }
    }
}

impl Default for PayoutScheduler {
    fn default() -> Self {
        Self::from_config(&DisbursementConfig::default())
    }
}

fn add_days(date: NaiveDate, days: u32) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(days)))
        .ok_or(DisburseError::DateOverflow(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Cents;
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn merchant(reference: &str, frequency: &str, live_on: &str) -> Merchant {
        Merchant {
            id: Uuid::new_v4(),
            reference: reference.to_string(),
            email: format!("info@{reference}.com"),
            live_on: date(live_on),
            disbursement_frequency: frequency.to_string(),
            minimum_monthly_fee: "0.0".to_string(),
        }
    }

    fn order(id: &str, reference: &str, created_at: &str) -> Order {
        Order::new(id, reference, Cents(1000), date(created_at))
    }

    #[test]
    fn test_daily_same_date_is_same_period() {
        let scheduler = PayoutScheduler::default();
        let m = merchant("padberg_group", "DAILY", "2023-02-01");
        let a = order("a", "padberg_group", "2023-02-02");
        let b = order("b", "padberg_group", "2023-02-02");
        let c = order("c", "padberg_group", "2023-02-03");

        assert!(!scheduler.is_new_period(&a, &b, &m).unwrap());
        assert!(scheduler.is_new_period(&b, &c, &m).unwrap());
    }

    #[test]
    fn test_merchant_change_is_new_period() {
        let scheduler = PayoutScheduler::default();
        let m = merchant("rosenbaum_parisian", "WEEKLY", "2022-11-09");
        let a = order("a", "padberg_group", "2022-11-09");
        let b = order("b", "rosenbaum_parisian", "2022-11-09");

        assert!(scheduler.is_new_period(&a, &b, &m).unwrap());
    }

    #[test]
    fn test_weekly_period_follows_payout_date() {
        let scheduler = PayoutScheduler::default();
        // 2022-11-09 is a Wednesday.
        let m = merchant("rosenbaum_parisian", "WEEKLY", "2022-11-09");
        let thu = order("a", "rosenbaum_parisian", "2022-11-10");
        let tue = order("b", "rosenbaum_parisian", "2022-11-15");
        let wed = order("c", "rosenbaum_parisian", "2022-11-16");
        let next_thu = order("d", "rosenbaum_parisian", "2022-11-17");

        assert!(!scheduler.is_new_period(&thu, &tue, &m).unwrap());
        assert!(!scheduler.is_new_period(&tue, &wed, &m).unwrap());
        assert!(scheduler.is_new_period(&wed, &next_thu, &m).unwrap());
    }

    #[test]
    fn test_weekly_payout_dates() {
        let scheduler = PayoutScheduler::default();
        let m = merchant("rosenbaum_parisian", "WEEKLY", "2022-11-09");

        let cases = [
            ("2022-11-09", "2022-11-09"),
            ("2022-11-10", "2022-11-16"),
            ("2022-11-13", "2022-11-16"),
            ("2022-11-15", "2022-11-16"),
            ("2022-11-17", "2022-11-23"),
            ("2022-11-28", "2022-11-30"),
            ("2022-12-01", "2022-12-07"),
        ];
        for (created, expected) in cases {
            let o = order("x", "rosenbaum_parisian", created);
            assert_eq!(
                scheduler.payout_date_for(&o, &m).unwrap(),
                date(expected),
                "order created {created}"
            );
        }
    }

    #[test]
    fn test_weekly_payout_on_sunday_reference() {
        let scheduler = PayoutScheduler::default();
        // 2023-01-01 is a Sunday.
        let m = merchant("sunday_shop", "WEEKLY", "2023-01-01");
        let sat = order("x", "sunday_shop", "2023-01-07");
        let mon = order("y", "sunday_shop", "2023-01-09");

        assert_eq!(scheduler.payout_date_for(&sat, &m).unwrap(), date("2023-01-08"));
        assert_eq!(scheduler.payout_date_for(&mon, &m).unwrap(), date("2023-01-15"));
    }

    #[test]
    fn test_daily_cutoff() {
        let scheduler = PayoutScheduler::new(NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        let m = merchant("padberg_group", "DAILY", "2023-02-01");

        let batch = order("a", "padberg_group", "2023-02-28");
        let early = order("b", "padberg_group", "2023-02-28")
            .received_at(NaiveTime::from_hms_opt(7, 59, 59).unwrap());
        let late = order("c", "padberg_group", "2023-02-28")
            .received_at(NaiveTime::from_hms_opt(8, 0, 0).unwrap());

        assert_eq!(scheduler.payout_date_for(&batch, &m).unwrap(), date("2023-02-28"));
        assert_eq!(scheduler.payout_date_for(&early, &m).unwrap(), date("2023-02-28"));
        assert_eq!(scheduler.payout_date_for(&late, &m).unwrap(), date("2023-03-01"));
    }

    #[test]
    fn test_daily_cutoff_splits_period() {
        let scheduler = PayoutScheduler::new(NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        let m = merchant("padberg_group", "DAILY", "2023-02-01");
        let early = order("a", "padberg_group", "2023-02-28")
            .received_at(NaiveTime::from_hms_opt(7, 0, 0).unwrap());
        let late = order("b", "padberg_group", "2023-02-28")
            .received_at(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        let next_day = order("c", "padberg_group", "2023-03-01");

        assert!(scheduler.is_new_period(&early, &late, &m).unwrap());
        assert!(scheduler.is_new_period(&late, &early, &m).unwrap());
        // Paid out on the same day as the late order.
        assert!(!scheduler.is_new_period(&late, &next_day, &m).unwrap());
    }

    #[test]
    fn test_unsupported_frequency() {
        let scheduler = PayoutScheduler::default();
        let m = merchant("odd_shop", "BIWEEKLY", "2023-02-01");
        let a = order("a", "odd_shop", "2023-02-01");
        let b = order("b", "odd_shop", "2023-02-02");

        assert!(matches!(
            scheduler.payout_date_for(&a, &m),
            Err(DisburseError::UnsupportedFrequency(_))
        ));
        assert!(matches!(
            scheduler.is_new_period(&a, &b, &m),
            Err(DisburseError::UnsupportedFrequency(_))
        ));
    }

    #[test]
    fn test_foreign_merchant_is_ambiguous() {
        let scheduler = PayoutScheduler::default();
        let m = merchant("padberg_group", "DAILY", "2023-02-01");
        let a = order("a", "deckow_gibson", "2023-02-01");
        let b = order("b", "deckow_gibson", "2023-02-01");

        assert!(matches!(
            scheduler.is_new_period(&a, &b, &m),
            Err(DisburseError::AmbiguousPeriod { .. })
        ));
    }
}
