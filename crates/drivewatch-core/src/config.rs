/// Watcher settings.
///
/// Every field has a default, so an absent config file is not an error and
/// a partial file only overrides the keys it names.
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when no override is given.
pub const DEFAULT_CONFIG_FILE: &str = "drivewatch.json";

/// Environment variable that overrides [`DEFAULT_CONFIG_FILE`].
pub const CONFIG_ENV_VAR: &str = "DRIVEWATCH_CONFIG";

/// Shortest accepted delay between presence probes.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Delay between two presence probes.
    pub poll_interval_ms: u64,
    /// How long the post-removal mode-switch prompt waits for an answer.
    pub mode_switch_timeout_ms: u64,
    /// Directory holding the counter files.
    pub counters_dir: PathBuf,
    /// Append-only log file.
    pub log_file: PathBuf,
    /// Target used when the operator answers "1" at the target prompt.
    pub default_target: String,
    pub marker_folder: String,
    pub greeting_file: String,
    pub greeting_text: String,
    /// Top-level entry the wipe never touches.
    pub reserved_entry: String,
    /// Session counts that trigger a milestone message.
    pub milestones: Vec<u64>,
    /// Line that, typed on its own, requests exit.
    pub cancel_key: String,
    /// Offer the timed mode-switch prompt after each removal.
    pub mode_switch: bool,
    /// Re-prompt for the target until it is accessible.
    pub require_target_present: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            mode_switch_timeout_ms: 5_000,
            counters_dir: PathBuf::from("."),
            log_file: PathBuf::from("app.log"),
            default_target: default_target().to_owned(),
            marker_folder: "new_folder".to_owned(),
            greeting_file: "welcome.txt".to_owned(),
            greeting_text: "Hello from DriveWatch!".to_owned(),
            reserved_entry: "System Volume Information".to_owned(),
            milestones: vec![50, 100, 200],
            cancel_key: "q".to_owned(),
            mode_switch: true,
            require_target_present: false,
        }
    }
}

#[cfg(windows)]
fn default_target() -> &'static str {
    "H"
}

#[cfg(not(windows))]
fn default_target() -> &'static str {
    "/media/usb"
}

impl WatcherConfig {
    /// Load settings from `path`, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate(path)?;
        Ok(config)
    }

    /// Reject values the watcher cannot run with.
    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let invalid = |field, reason: String| ConfigError::Invalid {
            path: path.to_path_buf(),
            field,
            reason,
        };
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(invalid(
                "poll_interval_ms",
                format!(
                    "must be at least {MIN_POLL_INTERVAL_MS}, got {}",
                    self.poll_interval_ms
                ),
            ));
        }
        // An empty name would make the marker folder the volume root.
        if self.marker_folder.trim().is_empty() {
            return Err(invalid("marker_folder", "must not be empty".to_owned()));
        }
        Ok(())
    }

    /// Resolve the config path from the environment and load it.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load(&path)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn mode_switch_timeout(&self) -> Duration {
        Duration::from_millis(self.mode_switch_timeout_ms)
    }
}
