/// Durable connection counters.
///
/// Two counters exist: the session counter (passes since the current
/// monitoring run started) and the total counter (passes across all runs).
/// Stores never fail towards the caller: reads degrade to 0 and writes are
/// best-effort, with every failure logged.
pub mod file;
pub mod memory;

pub use file::FileCounterStore;
pub use memory::MemoryCounterStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    Session,
    Total,
}

impl Counter {
    pub fn name(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Total => "total",
        }
    }
}

/// Key → integer persistence.
pub trait CounterStore: Send + Sync {
    /// Stored value, or 0 if absent or unreadable.
    fn read(&self, counter: Counter) -> u64;
    /// Replace the stored value. Failures are logged, never returned.
    fn write(&self, counter: Counter, value: u64);
}

/// Counter values after a successful pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub session: u64,
    pub total: u64,
}

/// Counter operations the session and sequencer need.
pub struct Counters<'a> {
    store: &'a dyn CounterStore,
}

impl<'a> Counters<'a> {
    pub fn new(store: &'a dyn CounterStore) -> Self {
        Self { store }
    }

    /// Start a new monitoring run. The total counter is left alone.
    pub fn reset_session(&self) {
        self.store.write(Counter::Session, 0);
    }

    /// Increment and persist both counters.
    pub fn record_pass(&self) -> Tally {
        let session = self.store.read(Counter::Session).saturating_add(1);
        self.store.write(Counter::Session, session);

        let total = self.store.read(Counter::Total).saturating_add(1);
        self.store.write(Counter::Total, total);

        Tally { session, total }
    }

    pub fn current(&self) -> Tally {
        Tally {
            session: self.store.read(Counter::Session),
            total: self.store.read(Counter::Total),
        }
    }
}
