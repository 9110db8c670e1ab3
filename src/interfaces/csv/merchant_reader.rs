use crate::domain::merchant::Merchant;
use crate::error::{DisburseError, Result};
use std::io::Read;

/// Reads merchants from a `;`-separated source with header
/// `id;reference;email;live_on;disbursement_frequency;minimum_monthly_fee`.
pub struct MerchantReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> MerchantReader<R> {
    /// Creates a reader over `source`, trimming fields.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes one merchant per record.
    pub fn merchants(self) -> impl Iterator<Item = Result<Merchant>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(DisburseError::from))
    }
}
