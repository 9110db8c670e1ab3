pub mod ledger_writer;
pub mod merchant_reader;
pub mod order_reader;
