/// Watch-target resolution.
///
/// The operator names a volume either by drive letter (Windows) or by mount
/// path. Answering [`DEFAULT_TARGET_CHOICE`] selects the configured default.
/// A resolved target is fixed for the whole monitoring run.
use std::fmt;
use std::path::{Path, PathBuf};

/// Operator answer that selects the configured default target.
pub const DEFAULT_TARGET_CHOICE: &str = "1";

/// A volume root selected for one monitoring run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    /// Volume root, e.g. `H:\` or `/media/usb`.
    root: PathBuf,
}

impl WatchTarget {
    /// Resolve operator input against the configured default.
    ///
    /// Returns `None` for blank input.
    pub fn resolve(input: &str, default: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        let chosen = if input == DEFAULT_TARGET_CHOICE {
            default.trim()
        } else {
            input
        };
        if chosen.is_empty() {
            return None;
        }
        Some(Self {
            root: volume_root(chosen),
        })
    }

    pub fn from_path(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root.display())
    }
}

/// Append the platform path-root suffix to a bare drive letter.
#[cfg(windows)]
fn volume_root(id: &str) -> PathBuf {
    let letter = id.trim_end_matches(['\\', '/']).trim_end_matches(':');
    if letter.len() == 1 && letter.chars().all(|c| c.is_ascii_alphabetic()) {
        PathBuf::from(format!("{}:\\", letter.to_ascii_uppercase()))
    } else {
        PathBuf::from(id)
    }
}

/// Mount points are used as given; there are no drive letters.
#[cfg(not(windows))]
fn volume_root(id: &str) -> PathBuf {
    PathBuf::from(id)
}
