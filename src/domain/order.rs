use super::money::{Cents, deserialize_major_units};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

/// A single order as imported from the orders file.
///
/// Batch exports only carry the creation date. `received_at` is filled when the
/// intra-day receipt time is known and drives the daily cutoff.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct Order {
    pub id: String,
    pub merchant_reference: String,
    #[serde(deserialize_with = "deserialize_major_units")]
    pub amount: Cents,
    pub created_at: NaiveDate,
    #[serde(default)]
    pub received_at: Option<NaiveTime>,
}

impl Order {
    pub fn new(
        id: impl Into<String>,
        merchant_reference: impl Into<String>,
        amount: Cents,
        created_at: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            merchant_reference: merchant_reference.into(),
            amount,
            created_at,
            received_at: None,
        }
    }

    pub fn received_at(mut self, time: NaiveTime) -> Self {
        self.received_at = Some(time);
        self
    }
}

/// Sorts a batch by merchant reference, creation date and receipt time.
///
/// Orders without a receipt time come first within their day. The sort is
/// stable, so otherwise equal orders keep their file order.
pub fn sort_orders(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        a.merchant_reference
            .cmp(&b.merchant_reference)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.received_at.cmp(&b.received_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_order_deserialization() {
        let csv = "id;merchant_reference;amount;created_at\ne653f3e14bc4;padberg_group;102.29;2023-02-01";
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .trim(csv::Trim::All)
            .from_reader(csv.as_bytes());
        let mut iter = reader.deserialize();

        let order: Order = iter
            .next()
            .unwrap()
            .expect("Failed to deserialize order");

        assert_eq!(order.id, "e653f3e14bc4");
        assert_eq!(order.amount, Cents::new(10229));
        assert_eq!(order.created_at, date("2023-02-01"));
        assert_eq!(order.received_at, None);
    }

    #[test]
    fn test_sort_orders_by_merchant_then_date() {
        let mut orders = vec![
            Order::new("3", "rosenbaum_parisian", Cents::new(1), date("2022-11-09")),
            Order::new("2", "padberg_group", Cents::new(1), date("2023-02-02")),
            Order::new("1", "padberg_group", Cents::new(1), date("2023-02-01")),
            Order::new("4", "padberg_group", Cents::new(1), date("2023-02-02")),
        ];

        sort_orders(&mut orders);

        let ids: Vec<&str> = orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "4", "3"]);
    }

    #[test]
    fn test_sort_orders_by_receipt_time_within_day() {
        let at = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let mut orders = vec![
            Order::new("late", "padberg_group", Cents::new(1), date("2023-02-28"))
                .received_at(at(9)),
            Order::new("early", "padberg_group", Cents::new(1), date("2023-02-28"))
                .received_at(at(7)),
            Order::new("batch", "padberg_group", Cents::new(1), date("2023-02-28")),
        ];

        sort_orders(&mut orders);

        let ids: Vec<&str> = orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["batch", "early", "late"]);
    }
}
