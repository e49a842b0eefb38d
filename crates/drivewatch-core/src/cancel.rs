/// One-shot cancellation token.
///
/// Every blocking wait in the engine takes a token explicitly. Cancelling
/// sets an atomic flag (cheap to poll at loop boundaries) and closes a
/// crossbeam channel, which wakes any thread parked in [`CancelToken::sleep`]
/// or in a `select!` over [`CancelToken::receiver`] immediately.
///
/// Cancellation is terminal: there is no reset.
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    /// Dropped on cancel; receivers then see `Disconnected`.
    closer: Arc<Mutex<Option<Sender<()>>>>,
    signal: Receiver<()>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = bounded::<()>(0);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            closer: Arc::new(Mutex::new(Some(tx))),
            signal: rx,
        }
    }

    /// Request exit. Safe to call any number of times from any thread.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        if self.closer.lock().take().is_some() {
            tracing::debug!("Exit signal raised");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` or until cancelled, whichever comes first.
    ///
    /// Returns `true` if the token was cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        match self.signal.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => self.is_cancelled(),
            // Nothing is ever sent, so any other outcome means the channel closed.
            _ => true,
        }
    }

    /// Channel that disconnects on cancel, for use in `select!`.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.signal
    }
}
