use std::sync::{Arc, Mutex};

use cronguard::report::{Record, Reporter};
use cronguard::types::BoxFuture;

/// A fake reporter that:
/// - keeps every record in memory, in delivery order
/// - never fails
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }
}

impl Reporter for MemoryReporter {
    fn record<'a>(&'a self, record: &'a Record) -> BoxFuture<'a, ()> {
        let records = Arc::clone(&self.records);
        Box::pin(async move {
            let mut guard = records.lock().unwrap();
            guard.push(record.clone());
        })
    }
}
