//! Capital allocation engine
//!
//! Turns the deposit/withdrawal ledger and the account's valuation history
//! into a weighted ownership share per (investor, round) that sums to one.
//!
//! Two passes are needed. Deposits are first grouped by date so each date's
//! total can be weighed against the pool value before it. The ledger is then
//! replayed in its original order to split each date's weight among its
//! depositors and to redistribute the shares released by withdrawals.

pub mod date_weights;
pub mod engine;
pub mod log;

pub use date_weights::{DateWeight, DateWeights};
pub use engine::AllocationEngine;
pub use log::{LogEntry, TransactionLogAggregator};

use rust_decimal::Decimal;
use tracing::info;

use crate::error::Result;
use crate::models::{AllocationKey, AllocationState, TransactionRecord};
use crate::valuation::ValuationIndex;

/// Final state of an allocation run
#[derive(Debug, Clone)]
pub struct Allocation {
    pub date_weights: DateWeights,
    /// Keys in the order the ledger first referenced them
    pub positions: Vec<(AllocationKey, AllocationState)>,
    pub log: TransactionLogAggregator,
}

impl Allocation {
    pub fn total_weight(&self) -> Decimal {
        self.positions.iter().map(|(_, s)| s.weighted_share).sum()
    }

    pub fn state(&self, key: &AllocationKey) -> Option<&AllocationState> {
        self.positions
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, state)| state)
    }
}

/// Run both passes over the ledger.
///
/// Every record is validated before any weight is assigned, so an invalid
/// record aborts the run without partial results.
pub fn allocate(transactions: &[TransactionRecord], valuations: &ValuationIndex) -> Result<Allocation> {
    for tx in transactions {
        tx.validate()?;
    }

    info!(
        "Allocating {} transactions against {} valuation snapshots",
        transactions.len(),
        valuations.len()
    );

    let date_weights = DateWeights::build(transactions, valuations)?;

    let mut engine = AllocationEngine::new(date_weights);
    for tx in transactions {
        engine.apply(tx)?;
    }

    Ok(engine.finish())
}
