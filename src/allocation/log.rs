use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::models::{AllocationKey, FlowType, TransactionRecord};

/// One audited cash flow of an allocation key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub flow_type: FlowType,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub transaction_id: String,
}

impl From<&TransactionRecord> for LogEntry {
    fn from(tx: &TransactionRecord) -> Self {
        Self {
            flow_type: tx.flow_type(),
            amount: tx.magnitude(),
            date: tx.date,
            transaction_id: tx.id.clone(),
        }
    }
}

/// Append-only per-key record of deposits and withdrawals, in ledger order
#[derive(Debug, Clone, Default)]
pub struct TransactionLogAggregator {
    entries: HashMap<AllocationKey, Vec<LogEntry>>,
}

impl TransactionLogAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: &AllocationKey, tx: &TransactionRecord) {
        self.entries
            .entry(key.clone())
            .or_default()
            .push(LogEntry::from(tx));
    }

    /// Entries in the order they were recorded
    pub fn entries(&self, key: &AllocationKey) -> &[LogEntry] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entries sorted by date; same-day entries keep their ledger order
    pub fn sorted(&self, key: &AllocationKey) -> Vec<LogEntry> {
        let mut sorted = self.entries(key).to_vec();
        sorted.sort_by_key(|e| e.date);
        sorted
    }

    pub fn total(&self, key: &AllocationKey, flow_type: FlowType) -> Decimal {
        self.entries(key)
            .iter()
            .filter(|e| e.flow_type == flow_type)
            .map(|e| e.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_sorted_is_stable_for_same_day_entries() {
        let key = AllocationKey::new("Bob", "seed");
        let mut log = TransactionLogAggregator::new();
        log.record(&key, &TransactionRecord::new("c", "Bob", "seed", date(2024, 7, 1), dec!(50)));
        log.record(&key, &TransactionRecord::new("a", "Bob", "seed", date(2024, 1, 1), dec!(-500)));
        log.record(&key, &TransactionRecord::new("b", "Bob", "seed", date(2024, 1, 1), dec!(-200)));

        let ids: Vec<String> = log
            .sorted(&key)
            .into_iter()
            .map(|e| e.transaction_id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        // Recording order is untouched
        assert_eq!(log.entries(&key)[0].transaction_id, "c");
    }

    #[test]
    fn test_entries_carry_type_and_magnitude() {
        let key = AllocationKey::new("Joe", "A");
        let mut log = TransactionLogAggregator::new();
        log.record(&key, &TransactionRecord::new("1", "Joe", "A", date(2024, 1, 1), dec!(-300)));
        log.record(&key, &TransactionRecord::new("2", "Joe", "A", date(2024, 2, 1), dec!(120)));

        let entries = log.entries(&key);
        assert_eq!(entries[0].flow_type, FlowType::Deposit);
        assert_eq!(entries[0].amount, dec!(300));
        assert_eq!(entries[1].flow_type, FlowType::Withdrawal);
        assert_eq!(log.total(&key, FlowType::Deposit), dec!(300));
        assert_eq!(log.total(&key, FlowType::Withdrawal), dec!(120));
    }

    #[test]
    fn test_unknown_key_has_empty_log() {
        let log = TransactionLogAggregator::new();
        assert!(log.sorted(&AllocationKey::new("Nobody", "x")).is_empty());
    }
}
