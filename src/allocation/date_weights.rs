use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::{AllocationError, Result};
use crate::models::TransactionRecord;
use crate::valuation::ValuationIndex;

/// Share of the pool attributable to all deposits made on one date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWeight {
    pub date: NaiveDate,
    pub total_deposit: Decimal,
    /// Pool value before the date's deposits were added
    pub start_value: Decimal,
    pub weight: Decimal,
}

/// Date-level weights (the first pass over the ledger)
///
/// Deposits are grouped by calendar date. The earliest date owns the whole
/// pool. Each later date D takes `T_D / start_value` of it, and every earlier
/// date is scaled by `1 - T_D / start_value`, so the weights always sum to one.
#[derive(Debug, Clone, Default)]
pub struct DateWeights {
    weights: BTreeMap<NaiveDate, DateWeight>,
}

impl DateWeights {
    pub fn build(transactions: &[TransactionRecord], valuations: &ValuationIndex) -> Result<Self> {
        let mut deposits_by_date: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for tx in transactions.iter().filter(|tx| tx.is_deposit()) {
            *deposits_by_date.entry(tx.date).or_insert(Decimal::ZERO) += tx.magnitude();
        }

        let mut weights: BTreeMap<NaiveDate, DateWeight> = BTreeMap::new();

        for (date, total_deposit) in deposits_by_date {
            let start_value = valuations.lookup(date);

            if weights.is_empty() {
                info!(
                    "Date {}: first deposit = {:.2}, weighted = 1.0",
                    date, total_deposit
                );
                weights.insert(
                    date,
                    DateWeight {
                        date,
                        total_deposit,
                        start_value,
                        weight: Decimal::ONE,
                    },
                );
                continue;
            }

            if start_value <= Decimal::ZERO {
                return Err(AllocationError::AllocationAnomaly {
                    date,
                    deposit: total_deposit,
                    start_value,
                    share: Decimal::ZERO,
                });
            }

            let new_share = total_deposit / start_value;
            if new_share >= Decimal::ONE {
                return Err(AllocationError::AllocationAnomaly {
                    date,
                    deposit: total_deposit,
                    start_value,
                    share: new_share,
                });
            }

            let keep = Decimal::ONE - new_share;
            for earlier in weights.values_mut() {
                earlier.weight *= keep;
            }

            info!(
                "Date {}: deposit = {:.2}, value before = {:.2}, value after = {:.2}, weighted = {:.6}",
                date,
                total_deposit,
                start_value,
                start_value + total_deposit,
                new_share
            );

            weights.insert(
                date,
                DateWeight {
                    date,
                    total_deposit,
                    start_value,
                    weight: new_share,
                },
            );
        }

        let result = Self { weights };
        debug!("Total date weight: {:.9}", result.total());
        Ok(result)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DateWeight> {
        self.weights.get(&date)
    }

    /// Entries in ascending date order
    pub fn iter(&self) -> impl Iterator<Item = &DateWeight> {
        self.weights.values()
    }

    pub fn total(&self) -> Decimal {
        self.weights.values().map(|w| w.weight).sum()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
