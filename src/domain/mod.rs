//! Disbursement rules: money, fees, payout periods and the aggregation pass.

pub mod aggregator;
pub mod disbursement;
pub mod fee;
pub mod ledger;
pub mod merchant;
pub mod money;
pub mod monthly;
pub mod order;
pub mod ports;
pub mod schedule;
