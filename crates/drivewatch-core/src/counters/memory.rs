/// In-memory counter store for tests and dry runs.
use super::{Counter, CounterStore};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryCounterStore {
    values: Mutex<HashMap<Counter, u64>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for MemoryCounterStore {
    fn read(&self, counter: Counter) -> u64 {
        self.values.lock().get(&counter).copied().unwrap_or(0)
    }

    fn write(&self, counter: Counter, value: u64) {
        self.values.lock().insert(counter, value);
    }
}
