use super::money::Cents;
use crate::error::{DisburseError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Merchants keyed by their reference.
pub type MerchantRegistry = HashMap<String, Merchant>;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum DisbursementFrequency {
    Daily,
    Weekly,
}

impl FromStr for DisbursementFrequency {
    type Err = DisburseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            other => Err(DisburseError::UnsupportedFrequency(other.to_string())),
        }
    }
}

impl fmt::Display for DisbursementFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => f.write_str("DAILY"),
            Self::Weekly => f.write_str("WEEKLY"),
        }
    }
}

/// A merchant as onboarded.
///
/// Frequency and minimum fee are kept exactly as configured; they are parsed on
/// use so that a misconfigured merchant surfaces as an error for that merchant
/// rather than failing the whole import.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Merchant {
    pub id: Uuid,
    pub reference: String,
    pub email: String,
    pub live_on: NaiveDate,
    pub disbursement_frequency: String,
    pub minimum_monthly_fee: String,
}

impl Merchant {
    pub fn frequency(&self) -> Result<DisbursementFrequency> {
        self.disbursement_frequency.parse()
    }

    /// The weekday weekly payouts are made on.
    pub fn payout_weekday(&self) -> Weekday {
        self.live_on.weekday()
    }

    pub fn minimum_monthly_fee(&self) -> Result<Cents> {
        self.minimum_monthly_fee
            .parse()
            .map_err(|_| DisburseError::FeeParseError {
                reference: self.reference.clone(),
                value: self.minimum_monthly_fee.clone(),
            })
    }
}
