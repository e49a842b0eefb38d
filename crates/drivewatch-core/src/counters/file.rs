/// Plain-text counter files.
///
/// Each counter lives in its own file holding the decimal value and nothing
/// else, e.g. `session_counter.txt` containing `17`. Writes go to a temp file
/// in the same directory which is then persisted over the target, so a crash
/// never leaves a truncated value behind.
use super::{Counter, CounterStore};
use crate::error::CounterError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

pub struct FileCounterStore {
    dir: PathBuf,
}

impl FileCounterStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `counter`.
    pub fn path_of(&self, counter: Counter) -> PathBuf {
        self.dir.join(format!("{}_counter.txt", counter.name()))
    }

    fn try_read(&self, path: &Path) -> Result<u64, CounterError> {
        let content = std::fs::read_to_string(path).map_err(|source| CounterError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        content
            .trim()
            .parse::<u64>()
            .map_err(|_| CounterError::Parse {
                path: path.to_path_buf(),
                content,
            })
    }

    fn try_write(&self, path: &Path, value: u64) -> Result<(), CounterError> {
        let write_err = |source| CounterError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(value.to_string().as_bytes())
            .map_err(write_err)?;
        tmp.flush().map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

impl CounterStore for FileCounterStore {
    fn read(&self, counter: Counter) -> u64 {
        let path = self.path_of(counter);
        match self.try_read(&path) {
            Ok(value) => value,
            // First run: nothing written yet.
            Err(CounterError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                debug!("Counter {} not found, starting at 0", path.display());
                0
            }
            Err(e) => {
                warn!("{e}; using 0");
                0
            }
        }
    }

    fn write(&self, counter: Counter, value: u64) {
        let path = self.path_of(counter);
        if let Err(e) = self.try_write(&path, value) {
            warn!("{e}");
        }
    }
}
