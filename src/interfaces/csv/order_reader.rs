use crate::domain::order::Order;
use crate::error::{DisburseError, Result};
use std::io::Read;

/// Reads orders from a `;`-separated source.
///
/// Expected header: `id;merchant_reference;amount;created_at`, optionally
/// followed by `received_at`. Amounts are decimal major units.
pub struct OrderReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OrderReader<R> {
    /// Creates a reader over `source`, trimming fields and tolerating a missing
    /// `received_at` column.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes one order per record.
    pub fn orders(self) -> impl Iterator<Item = Result<Order>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(DisburseError::from))
    }
}
