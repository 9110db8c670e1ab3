use crate::domain::ledger::Ledger;
use crate::domain::money::Cents;
use chrono::NaiveDate;
use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DisburseError>;

#[derive(Error, Diagnostic, Debug)]
pub enum DisburseError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDBError(#[from] rocksdb::Error),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("order amount {amount} exceeds the maximum of {max}")]
    #[diagnostic(
        code(disburser::order_limit),
        help("raise `max_order` in the configuration or split the order")
    )]
    OrderLimitExceeded { amount: Cents, max: Cents },
    #[error("unsupported disbursement frequency '{0}'")]
    #[diagnostic(code(disburser::frequency), help("expected DAILY or WEEKLY"))]
    UnsupportedFrequency(String),
    #[error("cannot determine payout period between orders {previous} and {current}")]
    AmbiguousPeriod { previous: String, current: String },
    #[error("payout total {total} for order {order_id} is negative")]
    #[diagnostic(code(disburser::negative_payout))]
    NegativePayout { order_id: String, total: Cents },
    #[error("minimum monthly fee '{value}' of merchant {reference} is not numeric")]
    FeeParseError { reference: String, value: String },
    #[error("merchant '{0}' is not registered")]
    UnknownMerchant(String),
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("payout date overflow after {0}")]
    DateOverflow(NaiveDate),
    #[error("aggregation cancelled")]
    Cancelled,
    #[error("aggregation worker failed: {0}")]
    WorkerFailed(String),
}

/// A fatal aggregation failure together with the rows built before it happened.
#[derive(Error, Debug)]
#[error("aggregation aborted after {} rows: {cause}", .partial.disbursements.len())]
pub struct Aborted {
    pub partial: Ledger,
    #[source]
    pub cause: DisburseError,
}

impl From<Aborted> for DisburseError {
    fn from(aborted: Aborted) -> Self {
        aborted.cause
    }
}
