use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

/// In-process event counter.
#[derive(Debug, Default)]
pub struct Analytics {
    counter: Mutex<HashMap<String, u64>>,
}

impl Analytics {
    pub fn new() -> Self { Self::default() }

    pub fn track(&self, event: &str) {
        *self.counter.lock().entry(event.to_string()).or_insert(0) += 1;
    }

    /// Snapshot of all counts, ordered by event name.
    pub fn report(&self) -> BTreeMap<String, u64> {
        self.counter.lock().iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}
