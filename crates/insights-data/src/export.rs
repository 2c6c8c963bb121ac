//! CSV export of a (filtered) [`PayoutTable`].
//!
//! The header is the fixed column list of the table, there is no index
//! column, and absent values are written as empty cells.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{NaiveDateTime, Timelike};
use tracing::debug;

use insights_core::error::Result;
use insights_core::models::{PayoutRecord, PayoutTable};

/// File name offered when the user does not pick one.
pub const DEFAULT_EXPORT_NAME: &str = "file.csv";

/// Write `table` as CSV into `writer`.
pub fn write_csv<W: Write>(table: &PayoutTable, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.columns())?;
    for record in table {
        wtr.write_record(record_cells(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `table` as CSV to the file at `path`, replacing it if present.
pub fn export_csv(table: &PayoutTable, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(table, file)?;
    debug!("Exported {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Render `table` as CSV bytes, for callers that hand the data elsewhere.
pub fn to_csv_bytes(table: &PayoutTable) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    Ok(buf)
}

// ── Cell formatting ───────────────────────────────────────────────────────────

fn record_cells(record: &PayoutRecord) -> [String; 12] {
    [
        format_timestamp(&record.created_at),
        float_cell(record.total_amount),
        float_cell(record.payout_amount),
        bool_cell(record.paid),
        bool_cell(record.paidout),
        float_cell(record.additional_amount),
        bool_cell(record.refunded),
        float_cell(record.refunded_amount),
        record.id.clone().unwrap_or_default(),
        float_cell(record.plan_price),
        record.customer.clone(),
        record.endpoint.clone(),
    ]
}

/// `YYYY-MM-DD HH:MM:SS`, with microseconds only when sub-second data exists.
fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

// `{:?}` keeps the trailing `.0` on whole numbers.
fn float_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:?}", v)).unwrap_or_default()
}

fn bool_cell(value: Option<bool>) -> String {
    match value {
        Some(true) => "True".to_string(),
        Some(false) => "False".to_string(),
        None => String::new(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_record(created: &str) -> PayoutRecord {
        PayoutRecord {
            created_at: NaiveDateTime::parse_from_str(created, "%Y-%m-%d %H:%M:%S%.f").unwrap(),
            total_amount: Some(120.0),
            payout_amount: Some(100.5),
            paid: Some(true),
            paidout: Some(false),
            additional_amount: None,
            refunded: Some(false),
            refunded_amount: Some(0.0),
            id: Some("tx-1".to_string()),
            plan_price: Some(9.99),
            customer: "acme".to_string(),
            endpoint: "foo".to_string(),
        }
    }

    fn lines(bytes: &[u8]) -> Vec<String> {
        String::from_utf8(bytes.to_vec())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_header_in_fixed_order() {
        let out = to_csv_bytes(&PayoutTable::default()).unwrap();
        assert_eq!(
            lines(&out),
            vec![
                "createdAt,totalAmount,payoutAmount,paid,paidout,additionalAmount,refunded,\
                 refundedAmount,id,billingPlanVersion.price,name,api.name"
            ]
        );
    }

    #[test]
    fn test_row_cells() {
        let table = PayoutTable::new(vec![make_record("2021-03-15 10:00:00")]);
        let out = lines(&to_csv_bytes(&table).unwrap());
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[1],
            "2021-03-15 10:00:00,120.0,100.5,True,False,,False,0.0,tx-1,9.99,acme,foo"
        );
    }

    #[test]
    fn test_fractional_seconds_written_as_micros() {
        let table = PayoutTable::new(vec![make_record("2021-03-15 10:00:00.25")]);
        let out = lines(&to_csv_bytes(&table).unwrap());
        assert!(out[1].starts_with("2021-03-15 10:00:00.250000,"));
    }

    #[test]
    fn test_absent_values_are_empty_cells() {
        let mut record = make_record("2021-03-15 10:00:00");
        record.total_amount = None;
        record.paid = None;
        record.id = None;
        let table = PayoutTable::new(vec![record]);
        let out = lines(&to_csv_bytes(&table).unwrap());
        assert_eq!(
            out[1],
            "2021-03-15 10:00:00,,100.5,,False,,False,0.0,,9.99,acme,foo"
        );
    }

    #[test]
    fn test_names_with_commas_are_quoted() {
        let mut record = make_record("2021-03-15 10:00:00");
        record.customer = "Acme, Inc.".to_string();
        let table = PayoutTable::new(vec![record]);
        let out = lines(&to_csv_bytes(&table).unwrap());
        assert!(out[1].contains("\"Acme, Inc.\""));
    }

    #[test]
    fn test_export_csv_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_EXPORT_NAME);
        let table = PayoutTable::new(vec![
            make_record("2021-03-15 10:00:00"),
            make_record("2021-03-16 10:00:00"),
        ]);

        export_csv(&table, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.starts_with("createdAt,"));
    }

    #[test]
    fn test_export_csv_into_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let result = export_csv(&PayoutTable::default(), &path);
        assert!(result.is_err());
    }
}
