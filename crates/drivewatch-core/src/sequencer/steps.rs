/// Filesystem steps of a volume pass.
///
/// Each step is a free function over paths so it can be exercised directly
/// against a temp directory. All filesystem calls go through [`VolumeFs`];
/// [`StdFs`] is the real filesystem.
use crate::error::ActionError;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filesystem calls made by a pass. Every method defaults to `std::fs`.
pub trait VolumeFs: Send + Sync {
    fn create_dir(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        file.write_all(contents)?;
        file.flush()
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir_all(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<std::fs::ReadDir> {
        std::fs::read_dir(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StdFs;

impl VolumeFs for StdFs {}

/// Create `folder` if it does not exist.
///
/// Returns `true` if the folder was created by this call.
pub fn ensure_folder(fs: &dyn VolumeFs, folder: &Path) -> Result<bool, ActionError> {
    match fs.create_dir(folder) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && folder.is_dir() => Ok(false),
        Err(source) => Err(ActionError::FolderCreateFailed {
            path: folder.to_path_buf(),
            source,
        }),
    }
}

/// Write `text` to `folder/name`, replacing any existing file.
pub fn write_greeting(
    fs: &dyn VolumeFs,
    folder: &Path,
    name: &str,
    text: &str,
) -> Result<PathBuf, ActionError> {
    let path = folder.join(name);
    fs.write_file(&path, text.as_bytes())
        .map_err(|source| ActionError::FileWriteFailed {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

/// Recursively delete `folder`. An already-missing folder is not an error.
pub fn remove_folder(fs: &dyn VolumeFs, folder: &Path) -> Result<(), ActionError> {
    match fs.remove_dir_all(folder) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ActionError::FolderDeleteFailed {
            path: folder.to_path_buf(),
            source,
        }),
    }
}

/// Result of a wipe that managed to list the volume.
#[derive(Debug, Default)]
pub struct WipeSummary {
    pub removed: Vec<PathBuf>,
    /// Per-entry failures; the wipe skipped these and carried on.
    pub failed: Vec<ActionError>,
}

/// Delete every top-level entry under `root` except `reserved`.
///
/// Only a failure to list `root` aborts; entries that cannot be removed are
/// collected in [`WipeSummary::failed`].
pub fn wipe(fs: &dyn VolumeFs, root: &Path, reserved: &str) -> Result<WipeSummary, ActionError> {
    let entries = fs.read_dir(root).map_err(|source| ActionError::WipeListFailed {
        path: root.to_path_buf(),
        source,
    })?;

    let mut summary = WipeSummary::default();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(source) => {
                summary.failed.push(ActionError::WipeEntryFailed {
                    path: root.to_path_buf(),
                    source,
                });
                continue;
            }
        };
        if entry.file_name() == reserved {
            debug!("Wipe: keeping reserved entry {reserved}");
            continue;
        }

        let path = entry.path();
        match remove_entry(fs, &entry) {
            Ok(()) => summary.removed.push(path),
            Err(source) => summary
                .failed
                .push(ActionError::WipeEntryFailed { path, source }),
        }
    }
    Ok(summary)
}

fn remove_entry(fs: &dyn VolumeFs, entry: &std::fs::DirEntry) -> io::Result<()> {
    // Symlinks are removed themselves, never followed.
    if entry.file_type()?.is_dir() {
        fs.remove_dir_all(&entry.path())
    } else {
        fs.remove_file(&entry.path())
    }
}
