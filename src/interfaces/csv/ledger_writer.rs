use crate::application::report::YearlySummary;
use crate::domain::disbursement::Disbursement;
use crate::domain::monthly::MonthlyFee;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Writes ledger rows and summaries as comma-separated CSV with a header row.
///
/// Monetary columns are written in cents.
pub struct LedgerWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> LedgerWriter<W> {
    /// Creates a writer over `sink`, e.g. stdout or a file.
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes one record per disbursement row and flushes.
    pub fn write_disbursements(&mut self, rows: &[Disbursement]) -> Result<()> {
        self.write_all(rows)
    }

    /// Writes one record per monthly fee evaluation and flushes.
    pub fn write_monthly_fees(&mut self, rows: &[MonthlyFee]) -> Result<()> {
        self.write_all(rows)
    }

    /// Writes one record per year and flushes.
    pub fn write_summaries(&mut self, rows: &[YearlySummary]) -> Result<()> {
        self.write_all(rows)
    }

    fn write_all<T: Serialize>(&mut self, rows: &[T]) -> Result<()> {
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Cents;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn test_write_disbursements() {
        let row = Disbursement {
            record_id: Uuid::nil(),
            disbursement_group_id: Uuid::nil(),
            merchant_reference: "padberg_group".to_string(),
            order_id: "e653f3e14bc4".to_string(),
            order_fee: Cents(511),
            order_fee_running_total: Cents(511),
            payout_running_total: Cents(9718),
            payout_date: NaiveDate::from_ymd_opt(2023, 2, 1).unwrap(),
            payout_total: None,
            is_paid_out: false,
        };

        let mut buf = Vec::new();
        LedgerWriter::new(&mut buf)
            .write_disbursements(&[row])
            .unwrap();
        let out = String::from_utf8(buf).unwrap();
        let mut lines = out.lines();

        assert_eq!(
            lines.next().unwrap(),
            "record_id,disbursement_group_id,merchant_reference,order_id,order_fee,\
             order_fee_running_total,payout_running_total,payout_date,payout_total,is_paid_out"
        );
        assert!(
            lines
                .next()
                .unwrap()
                .ends_with("padberg_group,e653f3e14bc4,511,511,9718,2023-02-01,,false")
        );
    }

    #[test]
    fn test_write_summaries() {
        let summary = YearlySummary {
            year: 2023,
            number_of_disbursements: 2,
            amount_disbursed: Cents(10370),
            amount_of_order_fees: Cents(583),
            number_of_monthly_fees_charged: 0,
            amount_of_monthly_fees_charged: Cents::ZERO,
        };

        let mut buf = Vec::new();
        LedgerWriter::new(&mut buf)
            .write_summaries(&[summary])
            .unwrap();
        let out = String::from_utf8(buf).unwrap();

        assert!(out.starts_with("year,number_of_disbursements,amount_disbursed"));
        assert!(out.contains("2023,2,10370,583,0,0"));
    }
}
