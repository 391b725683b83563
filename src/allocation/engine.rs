use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info};

use super::date_weights::DateWeights;
use super::log::TransactionLogAggregator;
use super::Allocation;
use crate::error::{AllocationError, Result};
use crate::models::{AllocationKey, AllocationState, FlowType, TransactionRecord};

/// Per-key attribution and withdrawal handling (the second pass)
///
/// Transactions must be applied in ledger order: a withdrawal is
/// redistributed against the shares every other key holds at that moment.
/// Keys are kept in first-seen order so redistribution always visits them
/// the same way and rounding is reproducible.
#[derive(Debug)]
pub struct AllocationEngine {
    date_weights: DateWeights,
    positions: Vec<(AllocationKey, AllocationState)>,
    index: HashMap<AllocationKey, usize>,
    log: TransactionLogAggregator,
}

impl AllocationEngine {
    pub fn new(date_weights: DateWeights) -> Self {
        Self {
            date_weights,
            positions: Vec::new(),
            index: HashMap::new(),
            log: TransactionLogAggregator::new(),
        }
    }

    /// Apply one ledger transaction
    pub fn apply(&mut self, tx: &TransactionRecord) -> Result<()> {
        tx.validate()?;

        let key = tx.key();
        let idx = self.slot(&key);
        self.log.record(&key, tx);

        match tx.flow_type() {
            FlowType::Deposit => self.apply_deposit(idx, tx),
            FlowType::Withdrawal => self.apply_withdrawal(idx, tx),
        }
    }

    fn slot(&mut self, key: &AllocationKey) -> usize {
        if let Some(&idx) = self.index.get(key) {
            return idx;
        }
        let idx = self.positions.len();
        self.positions.push((key.clone(), AllocationState::default()));
        self.index.insert(key.clone(), idx);
        idx
    }

    fn apply_deposit(&mut self, idx: usize, tx: &TransactionRecord) -> Result<()> {
        let amount = tx.magnitude();
        let date_weight = self.date_weights.get(tx.date).ok_or_else(|| {
            AllocationError::invalid(
                &tx.id,
                format!("no date weight for deposit date {}", tx.date),
            )
        })?;

        // A date weight always covers at least this deposit, so the total is positive
        let investor_share = amount / date_weight.total_deposit;
        let contribution = investor_share * date_weight.weight;

        let (key, state) = &mut self.positions[idx];
        state.total_investment += amount;
        state.weighted_share += contribution;
        if state.first_deposit_date.map_or(true, |first| tx.date < first) {
            state.first_deposit_date = Some(tx.date);
        }

        debug!(
            "Investor {} ({}) on {}: investment = {:.2}, share = {:.6}, weighted = {:.6}",
            key.investor, key.round_code, tx.date, amount, investor_share, contribution
        );
        Ok(())
    }

    fn apply_withdrawal(&mut self, idx: usize, tx: &TransactionRecord) -> Result<()> {
        let amount = tx.magnitude();

        let (key, state) = &mut self.positions[idx];
        let current = state.weighted_share;
        let capital_base = state.total_investment - state.total_withdrawal + amount;
        let withdrawal_pct = if capital_base > Decimal::ZERO {
            (amount / capital_base).min(Decimal::ONE)
        } else {
            Decimal::ONE
        };
        let reduction = current * withdrawal_pct;

        state.weighted_share = (current - reduction).max(Decimal::ZERO);
        state.total_withdrawal += amount;
        let key = key.clone();

        if reduction > Decimal::ZERO {
            self.redistribute(idx, reduction, &key, tx)?;
        }

        info!(
            "Investor {} ({}) on {}: withdrawal = {:.2}, withdrawal_percentage = {:.6}, weighted_reduction = {:.6}, new_weighted = {:.6}, total_weighted_after = {:.6}",
            key.investor,
            key.round_code,
            tx.date,
            amount,
            withdrawal_pct,
            reduction,
            self.positions[idx].1.weighted_share,
            self.total_weight()
        );
        Ok(())
    }

    /// Hand `reduction` to every other key in proportion to its current share
    fn redistribute(
        &mut self,
        from: usize,
        reduction: Decimal,
        key: &AllocationKey,
        tx: &TransactionRecord,
    ) -> Result<()> {
        let remaining: Decimal = self
            .positions
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != from)
            .map(|(_, (_, s))| s.weighted_share)
            .sum();

        if remaining <= Decimal::ZERO {
            return Err(AllocationError::AllocationInvariantViolation {
                detail: format!(
                    "withdrawal {} by {} on {} released a weighted share of {} but no other position holds a share to absorb it",
                    tx.id, key, tx.date, reduction
                ),
            });
        }

        for (i, (_, state)) in self.positions.iter_mut().enumerate() {
            if i != from && state.weighted_share > Decimal::ZERO {
                state.weighted_share += reduction * state.weighted_share / remaining;
            }
        }
        Ok(())
    }

    /// Sum of the weighted shares of every key seen so far
    pub fn total_weight(&self) -> Decimal {
        self.positions.iter().map(|(_, s)| s.weighted_share).sum()
    }

    /// Positions in first-seen order
    pub fn positions(&self) -> &[(AllocationKey, AllocationState)] {
        &self.positions
    }

    pub fn state(&self, key: &AllocationKey) -> Option<&AllocationState> {
        self.index.get(key).map(|&idx| &self.positions[idx].1)
    }

    pub fn finish(self) -> Allocation {
        info!("Total weighted investment: {:.6}", self.total_weight());
        Allocation {
            date_weights: self.date_weights,
            positions: self.positions,
            log: self.log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValuationSnapshot;
    use crate::valuation::ValuationIndex;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn flat_valuations(value: Decimal) -> ValuationIndex {
        ValuationIndex::new(vec![ValuationSnapshot::new(
            date(2024, 1, 1),
            value,
            Decimal::ZERO,
        )])
        .unwrap()
    }

    fn engine_for(txs: &[TransactionRecord], valuations: &ValuationIndex) -> AllocationEngine {
        AllocationEngine::new(DateWeights::build(txs, valuations).unwrap())
    }

    #[test]
    fn test_deposit_split_by_amount_within_date() {
        let txs = vec![
            TransactionRecord::new("1", "Bob", "seed", date(2024, 1, 1), dec!(-750)),
            TransactionRecord::new("2", "Alice", "seed", date(2024, 1, 1), dec!(-250)),
        ];
        let mut engine = engine_for(&txs, &flat_valuations(dec!(1000)));
        for tx in &txs {
            engine.apply(tx).unwrap();
        }
        let bob = engine.state(&AllocationKey::new("Bob", "seed")).unwrap();
        assert_eq!(bob.weighted_share, dec!(0.75));
        assert_eq!(bob.total_investment, dec!(750));
        assert_eq!(bob.first_deposit_date, Some(date(2024, 1, 1)));
        assert_eq!(engine.total_weight(), Decimal::ONE);
    }

    #[test]
    fn test_withdrawal_is_a_fraction_of_capital_base() {
        // Base = invested - previously withdrawn + this withdrawal = 1000
        let txs = vec![
            TransactionRecord::new("1", "Bob", "seed", date(2024, 1, 1), dec!(-500)),
            TransactionRecord::new("2", "Alice", "seed", date(2024, 1, 1), dec!(-500)),
            TransactionRecord::new("3", "Bob", "seed", date(2024, 3, 1), dec!(500)),
        ];
        let mut engine = engine_for(&txs, &flat_valuations(dec!(1000)));
        for tx in &txs {
            engine.apply(tx).unwrap();
        }
        let bob = engine.state(&AllocationKey::new("Bob", "seed")).unwrap();
        let alice = engine.state(&AllocationKey::new("Alice", "seed")).unwrap();
        assert_eq!(bob.weighted_share, dec!(0.25));
        assert_eq!(bob.total_withdrawal, dec!(500));
        assert_eq!(alice.weighted_share, dec!(0.75));
    }

    #[test]
    fn test_exhausted_capital_base_caps_at_full_share() {
        let txs = vec![
            TransactionRecord::new("1", "Bob", "seed", date(2024, 1, 1), dec!(-500)),
            TransactionRecord::new("2", "Alice", "seed", date(2024, 1, 1), dec!(-500)),
            TransactionRecord::new("3", "Bob", "seed", date(2024, 3, 1), dec!(5000)),
            TransactionRecord::new("4", "Bob", "seed", date(2024, 4, 1), dec!(10)),
        ];
        let mut engine = engine_for(&txs, &flat_valuations(dec!(1000)));
        for tx in &txs {
            engine.apply(tx).unwrap();
            assert!(engine
                .positions()
                .iter()
                .all(|(_, s)| s.weighted_share >= Decimal::ZERO));
            assert!((engine.total_weight() - Decimal::ONE).abs() < dec!(0.000000001));
        }
        let bob = engine.state(&AllocationKey::new("Bob", "seed")).unwrap();
        assert_eq!(bob.weighted_share, Decimal::ZERO);
        assert_eq!(bob.total_withdrawal, dec!(5010));
    }

    #[test]
    fn test_sole_holder_withdrawal_is_invariant_violation() {
        let txs = vec![
            TransactionRecord::new("1", "Bob", "seed", date(2024, 1, 1), dec!(-500)),
            TransactionRecord::new("2", "Bob", "seed", date(2024, 2, 1), dec!(100)),
        ];
        let mut engine = engine_for(&txs, &flat_valuations(dec!(500)));
        engine.apply(&txs[0]).unwrap();
        let err = engine.apply(&txs[1]).unwrap_err();
        assert!(matches!(
            err,
            AllocationError::AllocationInvariantViolation { .. }
        ));
    }

    #[test]
    fn test_withdrawal_without_share_is_not_a_violation() {
        let txs = vec![
            TransactionRecord::new("1", "Bob", "seed", date(2024, 1, 1), dec!(-500)),
            TransactionRecord::new("2", "Joe", "seed", date(2024, 2, 1), dec!(100)),
        ];
        let mut engine = engine_for(&txs, &flat_valuations(dec!(500)));
        for tx in &txs {
            engine.apply(tx).unwrap();
        }
        let joe = engine.state(&AllocationKey::new("Joe", "seed")).unwrap();
        assert_eq!(joe.weighted_share, Decimal::ZERO);
        assert_eq!(joe.total_investment, Decimal::ZERO);
        assert_eq!(engine.total_weight(), Decimal::ONE);
    }

    #[test]
    fn test_keys_kept_in_first_seen_order() {
        let txs = vec![
            TransactionRecord::new("1", "Zed", "b", date(2024, 1, 1), dec!(-100)),
            TransactionRecord::new("2", "Amy", "a", date(2024, 1, 1), dec!(-100)),
            TransactionRecord::new("3", "Zed", "a", date(2024, 1, 1), dec!(-100)),
        ];
        let mut engine = engine_for(&txs, &flat_valuations(dec!(300)));
        for tx in &txs {
            engine.apply(tx).unwrap();
        }
        let keys: Vec<String> = engine.positions().iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["Zed/b", "Amy/a", "Zed/a"]);
    }

    #[test]
    fn test_zero_amount_rejected_during_apply() {
        let mut engine = AllocationEngine::new(DateWeights::default());
        let tx = TransactionRecord::new("z", "Bob", "seed", date(2024, 1, 1), Decimal::ZERO);
        assert!(matches!(
            engine.apply(&tx),
            Err(AllocationError::InvalidTransaction { .. })
        ));
        assert!(engine.positions().is_empty());
    }

    #[test]
    fn test_deposit_on_unweighted_date_is_rejected() {
        let mut engine = AllocationEngine::new(DateWeights::default());
        let tx = TransactionRecord::new("d", "Bob", "seed", date(2024, 1, 1), dec!(-10));
        assert!(matches!(
            engine.apply(&tx),
            Err(AllocationError::InvalidTransaction { .. })
        ));
    }
}
