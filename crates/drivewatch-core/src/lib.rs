/// DriveWatch Core — presence polling, volume actions, and counters.
///
/// This crate contains all watcher logic with zero terminal dependencies.
/// Operator input and message output are reached through traits so the
/// same engine can run behind a console, a test script, or a service.
///
/// # Modules
///
/// - [`cancel`] — One-shot cancellation token shared by every blocking wait.
/// - [`config`] — Watcher settings loaded from an optional JSON file.
/// - [`counters`] — Durable session/total connection counters.
/// - [`error`] — Error types for actions, persistence, and configuration.
/// - [`operator`] — Operator input source.
/// - [`platform`] — Watch-target resolution from operator input.
/// - [`presence`] — Poll-based volume presence detection.
/// - [`report`] — Leveled operator-facing messages.
/// - [`sequencer`] — The per-insertion action pass.
/// - [`session`] — Mode selection and the detect → act → detect loop.
pub mod cancel;
pub mod config;
pub mod counters;
pub mod error;
pub mod operator;
pub mod platform;
pub mod presence;
pub mod report;
pub mod sequencer;
pub mod session;

pub use cancel::CancelToken;
pub use config::WatcherConfig;
pub use error::{ActionError, ConfigError, CounterError};
