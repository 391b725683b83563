// Import module - ledger and account value CSV parsers

pub mod ledger_csv;
pub mod valuation_csv;

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;

pub use ledger_csv::{parse_ledger_csv, read_ledger};
pub use valuation_csv::{parse_valuation_csv, read_valuations};

/// Index of the first header matching any of `names` (case-insensitive)
pub(crate) fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let text = header.trim().to_lowercase();
        names.iter().any(|name| text == *name)
    })
}

pub(crate) fn parse_csv_date(date_str: &str) -> Result<NaiveDate> {
    let text = date_str.trim();

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y/%m/%d") {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%m/%d/%Y") {
        return Ok(date);
    }
    // Exports sometimes carry a timestamp; only the calendar date matters
    if let Ok(ts) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Ok(ts.date());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Ok(ts.date());
    }

    Err(anyhow!("Could not parse date: {}", date_str))
}

pub(crate) fn parse_csv_decimal(text: &str) -> Result<Decimal> {
    let cleaned = text.trim().replace('$', "").replace(',', "").replace(' ', "");

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .context("Failed to parse decimal")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_csv_decimal() {
        assert_eq!(parse_csv_decimal("1,234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_csv_decimal("$ -500").unwrap(), dec!(-500));
        assert_eq!(parse_csv_decimal("1e3").unwrap(), dec!(1000));
        assert!(parse_csv_decimal("").is_err());
    }

    #[test]
    fn test_parse_csv_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_csv_date("2024-03-15").unwrap(), expected);
        assert_eq!(parse_csv_date("2024/03/15").unwrap(), expected);
        assert_eq!(parse_csv_date("03/15/2024").unwrap(), expected);
        assert_eq!(parse_csv_date("2024-03-15 09:30:00").unwrap(), expected);
        assert!(parse_csv_date("15.03.2024").is_err());
    }
}
