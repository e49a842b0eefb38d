/// Platform-specific functionality — turning operator input into a
/// volume root path.

pub mod target;

pub use target::{WatchTarget, DEFAULT_TARGET_CHOICE};
