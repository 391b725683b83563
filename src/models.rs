use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AllocationError, Result};

/// Direction of a ledger cash flow
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    Deposit,    // Money entering the pool (negative signed amount)
    Withdrawal, // Money leaving the pool (positive signed amount)
}

impl FlowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::Deposit => "deposit",
            FlowType::Withdrawal => "withdrawal",
        }
    }
}

impl FromStr for FlowType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deposit" => Ok(FlowType::Deposit),
            "withdrawal" => Ok(FlowType::Withdrawal),
            _ => Err(()),
        }
    }
}

/// One row of the cash-flow ledger
///
/// The sign of `signed_amount` carries the direction: negative is a deposit,
/// positive a withdrawal. Zero is never valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub investor: String,
    pub round_code: String,
    pub date: NaiveDate,
    pub signed_amount: Decimal,
}

impl TransactionRecord {
    pub fn new(
        id: impl Into<String>,
        investor: impl Into<String>,
        round_code: impl Into<String>,
        date: NaiveDate,
        signed_amount: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            investor: investor.into(),
            round_code: round_code.into(),
            date,
            signed_amount,
        }
    }

    /// Deposit for negative amounts, withdrawal for positive ones
    pub fn flow_type(&self) -> FlowType {
        if self.signed_amount < Decimal::ZERO {
            FlowType::Deposit
        } else {
            FlowType::Withdrawal
        }
    }

    pub fn is_deposit(&self) -> bool {
        self.flow_type() == FlowType::Deposit
    }

    /// Absolute amount of the cash flow
    pub fn magnitude(&self) -> Decimal {
        self.signed_amount.abs()
    }

    pub fn key(&self) -> AllocationKey {
        AllocationKey::new(self.investor.clone(), self.round_code.clone())
    }

    /// Reject records the allocation engine cannot interpret
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(AllocationError::invalid(
                "<blank>",
                format!("missing transaction id ({} on {})", self.investor, self.date),
            ));
        }
        if self.investor.trim().is_empty() {
            return Err(AllocationError::invalid(&self.id, "missing investor"));
        }
        if self.round_code.trim().is_empty() {
            return Err(AllocationError::invalid(&self.id, "missing round code"));
        }
        if self.signed_amount.is_zero() {
            return Err(AllocationError::invalid(&self.id, "amount is zero"));
        }
        Ok(())
    }
}

/// Point-in-time account valuation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationSnapshot {
    pub date: NaiveDate,
    pub balance: Decimal,
    pub unrealized_pnl: Decimal,
}

impl ValuationSnapshot {
    pub fn new(date: NaiveDate, balance: Decimal, unrealized_pnl: Decimal) -> Self {
        Self {
            date,
            balance,
            unrealized_pnl,
        }
    }

    /// Balance plus unrealized gain/loss
    pub fn total_value(&self) -> Decimal {
        self.balance + self.unrealized_pnl
    }
}

/// (investor, round) pair identifying one ownership position
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AllocationKey {
    pub investor: String,
    pub round_code: String,
}

impl AllocationKey {
    pub fn new(investor: impl Into<String>, round_code: impl Into<String>) -> Self {
        Self {
            investor: investor.into(),
            round_code: round_code.into(),
        }
    }
}

impl fmt::Display for AllocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.investor, self.round_code)
    }
}

/// Running bookkeeping for one allocation key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationState {
    pub total_investment: Decimal,
    pub total_withdrawal: Decimal,
    pub weighted_share: Decimal,
    pub first_deposit_date: Option<NaiveDate>,
}
