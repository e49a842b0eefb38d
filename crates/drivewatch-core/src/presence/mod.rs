/// Poll-based volume presence detection.
///
/// No OS device notifications are used. A volume counts as present when its
/// root can be listed; any error (not found, permission denied, I/O error)
/// counts as absent. Waits re-probe every `poll_interval` and observe the
/// cancel token between probes, waking immediately when it fires.
///
/// # Usage
///
/// ```ignore
/// let detector = PresenceDetector::new(DirListingProbe, Duration::from_secs(2));
/// if detector.wait_until_present(&path, &cancel) {
///     // run a pass
///     detector.wait_until_removed(&path, &cancel);
/// }
/// ```
use crate::cancel::CancelToken;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Answers "is this volume reachable right now?".
///
/// Implementations must be stateless between calls.
pub trait VolumeProbe: Send + Sync {
    fn is_accessible(&self, path: &Path) -> bool;
}

/// Probe that lists the directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirListingProbe;

impl VolumeProbe for DirListingProbe {
    fn is_accessible(&self, path: &Path) -> bool {
        is_accessible(path)
    }
}

/// True iff the directory contents of `path` can currently be listed.
pub fn is_accessible(path: &Path) -> bool {
    std::fs::read_dir(path).is_ok()
}

/// Intervals shorter than this are raised to it so a wait never spins.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct PresenceDetector<P = DirListingProbe> {
    probe: P,
    poll_interval: Duration,
}

impl<P: VolumeProbe> PresenceDetector<P> {
    pub fn new(probe: P, poll_interval: Duration) -> Self {
        Self {
            probe,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn is_accessible(&self, path: &Path) -> bool {
        self.probe.is_accessible(path)
    }

    /// Block until `path` is accessible. Returns `false` if cancelled first.
    pub fn wait_until_present(&self, path: &Path, cancel: &CancelToken) -> bool {
        debug!("Waiting for {} to appear", path.display());
        self.wait_for(path, true, cancel)
    }

    /// Block until `path` is no longer accessible. Returns `false` if
    /// cancelled first.
    pub fn wait_until_removed(&self, path: &Path, cancel: &CancelToken) -> bool {
        debug!("Waiting for {} to disappear", path.display());
        self.wait_for(path, false, cancel)
    }

    fn wait_for(&self, path: &Path, present: bool, cancel: &CancelToken) -> bool {
        loop {
            if cancel.is_cancelled() {
                return false;
            }
            if self.probe.is_accessible(path) == present {
                return true;
            }
            if cancel.sleep(self.poll_interval) {
                return false;
            }
        }
    }
}
