/// Operator-facing messages.
///
/// The engine never prints. Everything the operator should see goes through
/// a [`Reporter`], which a frontend renders (colored console lines, a test
/// recorder, ...). Internal diagnostics use `tracing` directly.
use std::fmt;

/// Target under which mirrored operator messages are recorded.
pub const JOURNAL_TARGET: &str = "drivewatch::journal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Info,
    Action,
    Success,
    Error,
    Warning,
    /// A prompt asking the operator for input.
    Input,
}

impl Level {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Action => "ACTION",
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Input => "INPUT",
        }
    }

    /// Whether messages at this level belong in the persistent journal.
    pub fn is_journaled(self) -> bool {
        matches!(self, Self::Action | Self::Success | Self::Error | Self::Warning)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub trait Reporter: Send + Sync {
    fn report(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.report(Level::Info, message);
    }
    fn action(&self, message: &str) {
        self.report(Level::Action, message);
    }
    fn success(&self, message: &str) {
        self.report(Level::Success, message);
    }
    fn error(&self, message: &str) {
        self.report(Level::Error, message);
    }
    fn warning(&self, message: &str) {
        self.report(Level::Warning, message);
    }
    fn prompt(&self, message: &str) {
        self.report(Level::Input, message);
    }
}

/// Record a message in the journal through `tracing`.
pub fn journal(level: Level, message: &str) {
    match level {
        Level::Error => tracing::error!(target: JOURNAL_TARGET, "[{level}] {message}"),
        Level::Warning => tracing::warn!(target: JOURNAL_TARGET, "[{level}] {message}"),
        _ => tracing::info!(target: JOURNAL_TARGET, "[{level}] {message}"),
    }
}

/// Reporter that only writes to `tracing`. Used headless and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, level: Level, message: &str) {
        journal(level, message);
    }
}
