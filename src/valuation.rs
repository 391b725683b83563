//! Valuation index over the account's value history
//!
//! Answers "what was the pool worth at (or right after) this date" with a
//! binary search over snapshots sorted by date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::{AllocationError, Result};
use crate::models::ValuationSnapshot;

#[derive(Debug, Clone)]
pub struct ValuationIndex {
    snapshots: Vec<ValuationSnapshot>,
}

impl ValuationIndex {
    /// Build the index, failing on an empty history.
    ///
    /// Out-of-order input is stable-sorted, so among duplicate dates the
    /// first occurrence still governs lookups.
    pub fn new(mut snapshots: Vec<ValuationSnapshot>) -> Result<Self> {
        if snapshots.is_empty() {
            return Err(AllocationError::EmptyValuationHistory);
        }

        if snapshots.windows(2).any(|w| w[0].date > w[1].date) {
            warn!("Valuation history is not sorted by date; sorting it");
            snapshots.sort_by_key(|s| s.date);
        }

        debug!(
            "Valuation index: {} snapshots from {} to {}",
            snapshots.len(),
            snapshots[0].date,
            snapshots[snapshots.len() - 1].date
        );

        Ok(Self { snapshots })
    }

    /// Total value of the earliest snapshot dated on or after `date`.
    ///
    /// Past the end of the history the last snapshot's value is returned;
    /// before the start, the first snapshot's.
    pub fn lookup(&self, date: NaiveDate) -> Decimal {
        let idx = self.snapshots.partition_point(|s| s.date < date);
        let idx = idx.min(self.snapshots.len() - 1);
        self.snapshots[idx].total_value()
    }

    /// Value distributed among the positions at the end of the run
    pub fn final_value(&self) -> Decimal {
        self.last().total_value()
    }

    pub fn first(&self) -> &ValuationSnapshot {
        &self.snapshots[0]
    }

    pub fn last(&self) -> &ValuationSnapshot {
        &self.snapshots[self.snapshots.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshots(&self) -> &[ValuationSnapshot] {
        &self.snapshots
    }
}
