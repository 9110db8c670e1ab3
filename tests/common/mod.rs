#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use rand::Rng;
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const MERCHANT_HEADER: [&str; 6] = [
    "id",
    "reference",
    "email",
    "live_on",
    "disbursement_frequency",
    "minimum_monthly_fee",
];
pub const ORDER_HEADER: [&str; 4] = ["id", "merchant_reference", "amount", "created_at"];

fn writer(path: &Path) -> Result<csv::Writer<File>, Error> {
    let file = File::create(path)?;
    Ok(csv::WriterBuilder::new().delimiter(b';').from_writer(file))
}

pub fn merchant_reference(index: usize) -> String {
    format!("merchant_{index:03}")
}

/// Writes `count` merchants, alternating daily and weekly payouts.
pub fn generate_merchants(path: &Path, count: usize) -> Result<(), Error> {
    let mut wtr = writer(path)?;
    wtr.write_record(MERCHANT_HEADER)?;

    let start = NaiveDate::from_ymd_opt(2022, 9, 1).unwrap();
    for i in 0..count {
        let reference = merchant_reference(i);
        let live_on = start.checked_add_days(Days::new(i as u64 % 7)).unwrap();
        let frequency = if i % 2 == 0 { "DAILY" } else { "WEEKLY" };
        let id = uuid::Uuid::new_v4().to_string();
        let email = format!("info@{reference}.com");
        let live_on = live_on.to_string();
        let fee = format!("{}.0", (i % 4) * 10);
        wtr.write_record([
            id.as_str(),
            reference.as_str(),
            email.as_str(),
            live_on.as_str(),
            frequency,
            fee.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes `rows` orders spread randomly over `merchants` merchants and one
/// year of creation dates. Amounts stay within the default order limit.
pub fn generate_orders(path: &Path, rows: usize, merchants: usize) -> Result<(), Error> {
    let mut wtr = writer(path)?;
    wtr.write_record(ORDER_HEADER)?;

    let mut rng = rand::thread_rng();
    let start = NaiveDate::from_ymd_opt(2022, 10, 1).unwrap();
    for i in 1..=rows {
        let merchant = rng.gen_range(0..merchants);
        let cents: u32 = rng.gen_range(1..=1_000_000);
        let created_at = start
            .checked_add_days(Days::new(rng.gen_range(0..365)))
            .unwrap();
        wtr.write_record([
            &format!("{i:012x}"),
            &merchant_reference(merchant),
            &format!("{}.{:02}", cents / 100, cents % 100),
            &created_at.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes raw order records under the standard header.
pub fn write_orders(path: &Path, records: &[[&str; 4]]) -> Result<(), Error> {
    let mut wtr = writer(path)?;
    wtr.write_record(ORDER_HEADER)?;
    for record in records {
        wtr.write_record(record)?;
    }
    wtr.flush()?;
    Ok(())
}
