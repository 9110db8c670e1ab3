use clap::Parser;
use disburser::application::service::DisbursementService;
use disburser::config::DisbursementConfig;
use disburser::domain::merchant::Merchant;
use disburser::domain::order::Order;
use disburser::domain::ports::Stores;
use disburser::infrastructure::in_memory::{
    InMemoryDisbursementStore, InMemoryMerchantStore, InMemoryMonthlyFeeStore,
};
use disburser::interfaces::csv::ledger_writer::LedgerWriter;
use disburser::interfaces::csv::merchant_reader::MerchantReader;
use disburser::interfaces::csv::order_reader::OrderReader;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Orders CSV file (`;`-separated)
    orders: PathBuf,

    /// Merchants CSV file (`;`-separated)
    merchants: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// JSON file overriding fee tiers, cutoff and sealing options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the monthly fee ledger to this file
    #[arg(long)]
    monthly_out: Option<PathBuf>,

    /// Print yearly summaries instead of the disbursement ledger
    #[arg(long)]
    summary: bool,

    /// Aggregate merchants concurrently
    #[arg(long)]
    parallel: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean CSV.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DisbursementConfig::load(path).into_diagnostic()?,
        None => DisbursementConfig::default(),
    };
    let stores = open_stores(cli.db_path.as_deref())?;

    let merchants = read_merchants(&cli.merchants)?;
    let orders = read_orders(&cli.orders)?;
    info!(
        orders = orders.len(),
        merchants = merchants.len(),
        "input loaded"
    );

    let service = DisbursementService::new(config, stores).parallel(cli.parallel);
    let ledger = service.import(orders, merchants).await?;

    if let Some(path) = &cli.monthly_out {
        let file = File::create(path).into_diagnostic()?;
        LedgerWriter::new(file).write_monthly_fees(&ledger.monthly_fees)?;
    }

    let stdout = io::stdout();
    let mut writer = LedgerWriter::new(stdout.lock());
    if cli.summary {
        let summaries = service.reporter().all_years().await?;
        writer.write_summaries(&summaries)?;
    } else {
        writer.write_disbursements(&ledger.disbursements)?;
    }

    Ok(())
}

fn read_merchants(path: &Path) -> Result<Vec<Merchant>> {
    let file = File::open(path).into_diagnostic()?;
    let mut merchants = Vec::new();
    for result in MerchantReader::new(file).merchants() {
        match result {
            Ok(merchant) => merchants.push(merchant),
            Err(e) => warn!(error = %e, "skipping merchant row"),
        }
    }
    Ok(merchants)
}

fn read_orders(path: &Path) -> Result<Vec<Order>> {
    let file = File::open(path).into_diagnostic()?;
    let mut orders = Vec::new();
    for result in OrderReader::new(file).orders() {
        match result {
            Ok(order) => orders.push(order),
            Err(e) => warn!(error = %e, "skipping order row"),
        }
    }
    Ok(orders)
}

fn in_memory_stores() -> Stores {
    Stores {
        merchants: Box::new(InMemoryMerchantStore::new()),
        disbursements: Box::new(InMemoryDisbursementStore::new()),
        monthly_fees: Box::new(InMemoryMonthlyFeeStore::new()),
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<&Path>) -> Result<Stores> {
    use disburser::infrastructure::rocksdb::RocksDBStore;

    let Some(path) = db_path else {
        return Ok(in_memory_stores());
    };
    let store = RocksDBStore::open(path).into_diagnostic()?;
    Ok(Stores {
        merchants: Box::new(store.clone()),
        disbursements: Box::new(store.clone()),
        monthly_fees: Box::new(store),
    })
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<&Path>) -> Result<Stores> {
    if let Some(path) = db_path {
        warn!(
            path = %path.display(),
            "built without storage-rocksdb, falling back to in-memory storage"
        );
    }
    Ok(in_memory_stores())
}
