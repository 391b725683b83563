use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use super::{find_column, parse_csv_date, parse_csv_decimal};
use crate::models::ValuationSnapshot;

/// Parse the account value history CSV (`date,usdt_balance,unrealized_pnl`)
pub fn parse_valuation_csv<P: AsRef<Path>>(file_path: P) -> Result<Vec<ValuationSnapshot>> {
    let path = file_path.as_ref();
    info!("Parsing account value history: {:?}", path);

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open account value file {:?}", path))?;
    read_valuations(file)
}

pub fn read_valuations<R: Read>(source: R) -> Result<Vec<ValuationSnapshot>> {
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();
    debug!("Valuation headers: {:?}", headers);

    let date_idx = find_column(&headers, &["date"]).ok_or_else(|| anyhow!("Date column not found"))?;
    let balance_idx = find_column(&headers, &["usdt_balance", "balance"])
        .ok_or_else(|| anyhow!("Balance column not found"))?;
    // Missing P&L column means a cash-only account
    let pnl_idx = find_column(&headers, &["unrealized_pnl", "pnl"]);

    let mut snapshots = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let row_num = idx + 2;
        let record = result.with_context(|| format!("Failed to read CSV row {}", row_num))?;

        let date_str = record
            .get(date_idx)
            .ok_or_else(|| anyhow!("Missing date at row {}", row_num))?;
        let date = parse_csv_date(date_str).with_context(|| format!("Bad date at row {}", row_num))?;

        let balance_str = record
            .get(balance_idx)
            .ok_or_else(|| anyhow!("Missing balance at row {}", row_num))?;
        let balance = parse_csv_decimal(balance_str)
            .with_context(|| format!("Bad balance at row {}", row_num))?;

        let unrealized_pnl = match pnl_idx.and_then(|i| record.get(i)) {
            Some(text) if !text.is_empty() => parse_csv_decimal(text)
                .with_context(|| format!("Bad unrealized P&L at row {}", row_num))?,
            _ => rust_decimal::Decimal::ZERO,
        };

        snapshots.push(ValuationSnapshot::new(date, balance, unrealized_pnl));
    }

    info!("Loaded {} valuation snapshots", snapshots.len());
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_total_value_sums_balance_and_pnl() {
        let csv = "date,usdt_balance,unrealized_pnl\n\
                   2024-01-01,1000,0\n\
                   2024-06-01,1450.5,49.5\n";
        let snaps = read_valuations(csv.as_bytes()).unwrap();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[1].total_value(), dec!(1500));
    }

    #[test]
    fn test_missing_pnl_column_defaults_to_zero() {
        let csv = "date,balance\n2024-01-01,1000\n";
        let snaps = read_valuations(csv.as_bytes()).unwrap();
        assert_eq!(snaps[0].total_value(), dec!(1000));
    }

    #[test]
    fn test_bad_balance_names_row() {
        let csv = "date,balance\n2024-01-01,1000\n2024-01-02,n/a\n";
        let err = read_valuations(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 3"));
    }
}
