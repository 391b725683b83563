//! Error handling for the allocation run
//!
//! Domain failures are distinct `AllocationError` variants so callers can
//! match on them. The I/O layers (importers, config, CLI) use `anyhow` for
//! context chaining; a domain error wrapped by `anyhow` stays downcastable.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::AllocationKey;

/// Structural violations of the allocation algorithm's preconditions or invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocationError {
    #[error("valuation history is empty")]
    EmptyValuationHistory,

    #[error("invalid transaction {id}: {reason}")]
    InvalidTransaction { id: String, reason: String },

    #[error("{key} reached ROI calculation with zero total investment")]
    ZeroInvestment { key: AllocationKey },

    #[error(
        "deposits of {deposit} on {date} give a date weight of {share} against a pool value of {start_value}"
    )]
    AllocationAnomaly {
        date: NaiveDate,
        deposit: Decimal,
        start_value: Decimal,
        share: Decimal,
    },

    #[error("allocation invariant violated: {detail}")]
    AllocationInvariantViolation { detail: String },
}

impl AllocationError {
    pub(crate) fn invalid(id: impl Into<String>, reason: impl Into<String>) -> Self {
        AllocationError::InvalidTransaction {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for allocation operations
pub type Result<T> = std::result::Result<T, AllocationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_formatting_is_readable() {
        let err = AllocationError::invalid("tx-7", "amount is zero");
        assert_eq!(err.to_string(), "invalid transaction tx-7: amount is zero");
        assert_eq!(
            AllocationError::EmptyValuationHistory.to_string(),
            "valuation history is empty"
        );
    }

    #[test]
    fn test_zero_investment_names_key() {
        let err = AllocationError::ZeroInvestment {
            key: AllocationKey::new("Bob", "seed"),
        };
        assert!(err.to_string().starts_with("Bob/seed"));
    }

    #[test]
    fn test_anyhow_keeps_domain_error_downcastable() {
        use anyhow::Context;
        let result: anyhow::Result<()> = Err(AllocationError::AllocationAnomaly {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            deposit: dec!(2000),
            start_value: dec!(1500),
            share: dec!(1.3333),
        })
        .context("allocation run failed");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("allocation run failed"));
        assert!(matches!(
            err.downcast_ref::<AllocationError>(),
            Some(AllocationError::AllocationAnomaly { .. })
        ));
    }
}
