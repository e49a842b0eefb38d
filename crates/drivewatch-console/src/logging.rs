/// Log-file setup.
///
/// Diagnostics and the operator journal go to an append-only, timestamped
/// log file through a non-blocking `tracing-appender` writer. If the file
/// cannot be opened the process still runs and logs warnings to stderr.
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// Keeps the background log writer alive. Drop it last to flush.
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

/// Split a log file path into the directory and file name the appender wants.
pub fn split_log_path(path: &Path) -> (PathBuf, String) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app.log".to_owned());
    (dir, name)
}

/// Install the global subscriber. Call once, early in `main`.
pub fn init(log_file: &Path) -> LogGuard {
    let (dir, name) = split_log_path(log_file);
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(&dir);

    match appender {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_writer(writer)
                .with_ansi(false)
                .with_max_level(Level::INFO)
                .init();
            LogGuard {
                _worker: Some(guard),
            }
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_max_level(Level::WARN)
                .init();
            tracing::warn!("Cannot open log file {}: {e}", log_file.display());
            LogGuard { _worker: None }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_file_name_logs_to_working_dir() {
        let (dir, name) = split_log_path(Path::new("app.log"));
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "app.log");
    }

    #[test]
    fn nested_path_is_split() {
        let (dir, name) = split_log_path(Path::new("logs/watch/drive.log"));
        assert_eq!(dir, PathBuf::from("logs/watch"));
        assert_eq!(name, "drive.log");
    }
}
