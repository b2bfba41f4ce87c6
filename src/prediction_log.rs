//! Append-only, process-lifetime prediction log

use crate::types::{LogEntry, PredictionRequest, Signal};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct LogTable {
    counter: u64,
    entries: Vec<LogEntry>,
}

/// The in-memory audit log of served predictions.
///
/// Counter and entries share one mutex, so every appended entry gets the
/// next sequence number with no gaps or duplicates. Entries are never
/// evicted.
pub struct PredictionLog {
    feature_names: Arc<[String]>,
    table: Mutex<LogTable>,
}

impl PredictionLog {
    pub fn new(feature_names: Arc<[String]>) -> Self {
        Self {
            feature_names,
            table: Mutex::new(LogTable::default()),
        }
    }

    /// Append an entry for a successful prediction and return a copy of it
    pub fn record(&self, request: PredictionRequest, prediction: Signal) -> LogEntry {
        let mut table = self.table();
        table.counter += 1;

        let entry = LogEntry {
            seq: table.counter,
            timestamp: request.timestamp,
            asset_id: request.asset_id,
            asset_name: request.asset_name,
            feature_names: Arc::clone(&self.feature_names),
            features: request.features,
            prediction,
        };
        table.entries.push(entry.clone());
        entry
    }

    /// Number of predictions recorded so far
    pub fn len(&self) -> usize {
        self.table().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most recently appended entry
    pub fn last(&self) -> Option<LogEntry> {
        self.table().entries.last().cloned()
    }

    /// Up to `n` most recent entries, oldest first
    pub fn tail(&self, n: usize) -> Vec<LogEntry> {
        let table = self.table();
        let start = table.entries.len().saturating_sub(n);
        table.entries[start..].to_vec()
    }

    /// Copy of the whole log in insertion order
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.table().entries.clone()
    }

    fn table(&self) -> MutexGuard<'_, LogTable> {
        // A panic while holding the lock cannot leave the table half-written
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn log() -> PredictionLog {
        PredictionLog::new(vec!["Open".to_string(), "Close".to_string()].into())
    }

    fn request(open: f64) -> PredictionRequest {
        PredictionRequest {
            features: vec![open, open + 1.0],
            missing: Vec::new(),
            timestamp: json!("T1"),
            asset_id: json!("BTC"),
            asset_name: Value::Null,
        }
    }

    #[test]
    fn test_sequence_starts_at_one_and_increments() {
        let log = log();
        assert!(log.is_empty());

        let seqs: Vec<u64> = (0..5)
            .map(|i| log.record(request(i as f64), Signal::Buy).seq)
            .collect();

        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
        assert_eq!(log.len(), 5);
    }

    #[test]
    fn test_record_returns_appended_entry() {
        let log = log();
        log.record(request(1.0), Signal::SellHold);
        let entry = log.record(request(2.0), Signal::Buy);

        assert_eq!(log.last(), Some(entry.clone()));
        assert_eq!(entry.feature("Close"), Some(3.0));
        assert_eq!(entry.prediction, Signal::Buy);
    }

    #[test]
    fn test_tail_keeps_insertion_order() {
        let log = log();
        for i in 0..8 {
            log.record(request(i as f64), Signal::SellHold);
        }

        let tail: Vec<u64> = log.tail(5).iter().map(|e| e.seq).collect();
        assert_eq!(tail, vec![4, 5, 6, 7, 8]);
        assert_eq!(log.tail(100).len(), 8);
        assert_eq!(log.snapshot().len(), 8);
    }

    #[test]
    fn test_concurrent_records_have_unique_sequence_numbers() {
        let log = Arc::new(log());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for i in 0..250 {
                        log.record(request(i as f64), Signal::Buy);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let seqs: Vec<u64> = log.snapshot().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, (1..=1000).collect::<Vec<u64>>());
    }
}
