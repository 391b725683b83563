use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use super::{find_column, parse_csv_date, parse_csv_decimal};
use crate::error::AllocationError;
use crate::models::TransactionRecord;

/// Parse the transaction ledger CSV (`id,name,code,date,amount`)
pub fn parse_ledger_csv<P: AsRef<Path>>(file_path: P) -> Result<Vec<TransactionRecord>> {
    let path = file_path.as_ref();
    info!("Parsing transaction ledger: {:?}", path);

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open transaction file {:?}", path))?;
    read_ledger(file)
}

/// Parse a ledger from any reader; rows keep their file order
pub fn read_ledger<R: Read>(source: R) -> Result<Vec<TransactionRecord>> {
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();
    debug!("Ledger headers: {:?}", headers);

    let mapping = LedgerColumns::find(&headers)?;
    debug!("Column mapping: {:?}", mapping);

    let mut transactions = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let row_num = idx + 2;
        let record = result.with_context(|| format!("Failed to read CSV row {}", row_num))?;
        let tx = parse_ledger_row(&record, &mapping, row_num)?;
        tx.validate()
            .with_context(|| format!("Rejected transaction at row {}", row_num))?;
        transactions.push(tx);
    }

    info!(
        "Successfully parsed {} transactions from ledger",
        transactions.len()
    );
    Ok(transactions)
}

#[derive(Debug)]
struct LedgerColumns {
    id: usize,
    investor: usize,
    round_code: usize,
    date: usize,
    amount: usize,
}

impl LedgerColumns {
    fn find(headers: &csv::StringRecord) -> Result<Self> {
        Ok(Self {
            id: find_column(headers, &["id", "transaction_id", "tx_id"])
                .ok_or_else(|| anyhow!("Transaction id column not found"))?,
            investor: find_column(headers, &["name", "investor"])
                .ok_or_else(|| anyhow!("Investor name column not found"))?,
            round_code: find_column(headers, &["code", "round", "round_code"])
                .ok_or_else(|| anyhow!("Round code column not found"))?,
            date: find_column(headers, &["date"])
                .ok_or_else(|| anyhow!("Date column not found"))?,
            amount: find_column(headers, &["amount", "signed_amount"])
                .ok_or_else(|| anyhow!("Amount column not found"))?,
        })
    }
}

fn parse_ledger_row(
    record: &csv::StringRecord,
    mapping: &LedgerColumns,
    row_num: usize,
) -> Result<TransactionRecord> {
    let field = |idx: usize, name: &str| {
        record
            .get(idx)
            .ok_or_else(|| anyhow!("Missing {} at row {}", name, row_num))
    };

    let id = field(mapping.id, "id")?.to_string();
    let investor = field(mapping.investor, "investor")?.to_string();
    let round_code = field(mapping.round_code, "round code")?.to_string();
    let date = parse_csv_date(field(mapping.date, "date")?)
        .with_context(|| format!("Bad date at row {}", row_num))?;
    let amount_text = field(mapping.amount, "amount")?;
    let signed_amount = parse_csv_decimal(amount_text).map_err(|_| {
        AllocationError::invalid(
            &id,
            format!("amount {:?} at row {} is not a number", amount_text, row_num),
        )
    })?;

    Ok(TransactionRecord {
        id,
        investor,
        round_code,
        date,
        signed_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_read_ledger_in_file_order() {
        let csv = "id,name,code,date,amount\n\
                   1,Bob,seed,2024-01-01,-500\n\
                   2,Alice,seed,2024-01-01,-500.00\n\
                   3,Bob,seed,2024-07-01,100\n";
        let txs = read_ledger(csv.as_bytes()).unwrap();
        assert_eq!(txs.len(), 3);
        assert_eq!(txs[0].investor, "Bob");
        assert_eq!(txs[1].signed_amount, dec!(-500));
        assert_eq!(txs[2].date, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert!(!txs[2].is_deposit());
    }

    #[test]
    fn test_header_aliases_and_column_order() {
        let csv = "Date,Investor,Round,Amount,Transaction_ID\n\
                   2024-01-01,Joe,A,\"-1,000\",tx-1\n";
        let txs = read_ledger(csv.as_bytes()).unwrap();
        assert_eq!(txs[0].id, "tx-1");
        assert_eq!(txs[0].round_code, "A");
        assert_eq!(txs[0].signed_amount, dec!(-1000));
    }

    #[test]
    fn test_zero_amount_row_is_rejected() {
        let csv = "id,name,code,date,amount\n7,Bob,seed,2024-01-01,0\n";
        let err = read_ledger(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 2"));
        assert!(matches!(
            err.downcast_ref::<AllocationError>(),
            Some(AllocationError::InvalidTransaction { .. })
        ));
    }

    #[test]
    fn test_malformed_amount_is_not_skipped() {
        let csv = "id,name,code,date,amount\n1,Bob,seed,2024-01-01,abc\n";
        let err = read_ledger(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AllocationError>(),
            Some(AllocationError::InvalidTransaction { .. })
        ));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let csv = "id,name,date,amount\n1,Bob,2024-01-01,-5\n";
        let err = read_ledger(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Round code column not found"));
    }
}
