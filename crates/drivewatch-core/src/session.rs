/// Session controller — mode selection and the detect → act → detect loop.
///
/// ```text
///              "1"                 "2"
///   SelectingMode ──► Monitoring   ──► ManualMode
///        │   ▲            │                 │
///     "0"│   └── "0" ─────┴─ mode switch ───┘
///        ▼                │                 │
///     Exiting ◄── exit signal / input closed
/// ```
///
/// Each mode run resets the session counter, resolves a watch target, then
/// loops: wait until present, run a pass, wait until removed. After every
/// removal an optional timed prompt lets the operator change mode; silence
/// keeps the current one.
///
/// The loop is strictly sequential, so only one pass ever runs at a time.
/// The exit signal is checked at every state boundary and wakes the
/// presence waits immediately. A pass that is already running is never
/// interrupted mid-operation.
use crate::cancel::CancelToken;
use crate::config::WatcherConfig;
use crate::counters::CounterStore;
use crate::operator::Operator;
use crate::platform::{WatchTarget, DEFAULT_TARGET_CHOICE};
use crate::presence::{DirListingProbe, PresenceDetector, VolumeProbe};
use crate::report::Reporter;
use crate::sequencer::{
    Milestones, PassMode, ReporterMilestoneNotifier, VolumeLayout, VolumeSequencer,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    SelectingMode,
    Monitoring,
    ManualMode,
    /// Terminal.
    Exiting,
}

impl SessionState {
    /// Map a menu or mode-switch answer to the state it selects.
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(Self::Monitoring),
            "2" => Some(Self::ManualMode),
            "0" => Some(Self::Exiting),
            _ => None,
        }
    }
}

/// Loop settings taken from [`WatcherConfig`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub default_target: String,
    pub mode_switch: bool,
    pub mode_switch_timeout: Duration,
    pub require_target_present: bool,
}

impl SessionSettings {
    pub fn from_config(config: &WatcherConfig) -> Self {
        Self {
            default_target: config.default_target.clone(),
            mode_switch: config.mode_switch,
            mode_switch_timeout: config.mode_switch_timeout(),
            require_target_present: config.require_target_present,
        }
    }
}

pub struct SessionController<P = DirListingProbe> {
    settings: SessionSettings,
    detector: PresenceDetector<P>,
    sequencer: VolumeSequencer,
    reporter: Arc<dyn Reporter>,
    cancel: CancelToken,
    state: SessionState,
    passes_run: u64,
}

impl<P: VolumeProbe> SessionController<P> {
    pub fn new(
        config: &WatcherConfig,
        probe: P,
        counters: Arc<dyn CounterStore>,
        reporter: Arc<dyn Reporter>,
        cancel: CancelToken,
    ) -> Self {
        let notifier = Arc::new(ReporterMilestoneNotifier::new(Arc::clone(&reporter)));
        let sequencer = VolumeSequencer::new(
            VolumeLayout::from_config(config),
            counters,
            Arc::clone(&reporter),
            Milestones::new(config.milestones.iter().copied()),
            notifier,
        );
        Self {
            settings: SessionSettings::from_config(config),
            detector: PresenceDetector::new(probe, config.poll_interval()),
            sequencer,
            reporter,
            cancel,
            state: SessionState::SelectingMode,
            passes_run: 0,
        }
    }

    /// Start in a fixed mode instead of the menu.
    pub fn with_initial_state(mut self, state: SessionState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Passes started since the controller was created.
    pub fn passes_run(&self) -> u64 {
        self.passes_run
    }

    /// Drive the state machine until it reaches [`SessionState::Exiting`].
    pub fn run(&mut self, operator: &mut dyn Operator) -> SessionState {
        loop {
            if self.cancel.is_cancelled() {
                self.state = SessionState::Exiting;
            }
            debug!("Session state: {:?}", self.state);

            self.state = match self.state {
                SessionState::SelectingMode => self.select_mode(operator),
                SessionState::Monitoring => self.run_mode(PassMode::Automatic, operator),
                SessionState::ManualMode => self.run_mode(PassMode::Interactive, operator),
                SessionState::Exiting => {
                    self.reporter.warning("Exiting");
                    info!("Session finished after {} passes", self.passes_run);
                    return SessionState::Exiting;
                }
            };
        }
    }

    fn select_mode(&self, operator: &mut dyn Operator) -> SessionState {
        self.reporter.prompt(
            "Select a mode:\n1 - automatic monitoring\n2 - manual folder mode\n0 - exit",
        );
        let Some(answer) = operator.read_token(&self.cancel) else {
            return SessionState::Exiting;
        };
        SessionState::from_choice(&answer).unwrap_or_else(|| {
            self.reporter.error("Invalid choice, try again");
            SessionState::SelectingMode
        })
    }

    /// One monitoring run in `mode`. Returns the state to move to.
    fn run_mode(&mut self, mode: PassMode, operator: &mut dyn Operator) -> SessionState {
        match mode {
            PassMode::Automatic => self.reporter.info("Mode 1: volume monitoring"),
            PassMode::Interactive => self.reporter.info("Mode 2: manual folder mode"),
        }
        self.sequencer.counters().reset_session();

        let Some(target) = self.select_target(operator) else {
            return SessionState::Exiting;
        };
        info!("Watching {target} in {mode:?} mode");

        loop {
            if !self.detector.wait_until_present(target.root(), &self.cancel) {
                return SessionState::Exiting;
            }

            self.passes_run += 1;
            self.sequencer
                .run_pass(target.root(), mode, operator, &self.cancel);

            if !self.detector.wait_until_removed(target.root(), &self.cancel) {
                return SessionState::Exiting;
            }
            self.reporter
                .info("Volume disconnected. Waiting for the next one...");

            if self.settings.mode_switch {
                if let Some(next) = self.offer_mode_switch(operator) {
                    return next;
                }
            }
        }
    }

    /// Ask for the volume to watch until a usable answer arrives.
    ///
    /// Returns `None` if input ends or exit is requested.
    fn select_target(&self, operator: &mut dyn Operator) -> Option<WatchTarget> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            self.reporter.prompt(&format!(
                "Enter the volume to watch, or {DEFAULT_TARGET_CHOICE} for the default \"{}\"",
                self.settings.default_target
            ));
            let answer = operator.read_token(&self.cancel)?;

            let Some(target) = WatchTarget::resolve(&answer, &self.settings.default_target)
            else {
                self.reporter.error("No volume given, try again");
                continue;
            };
            if self.settings.require_target_present
                && !self.detector.is_accessible(target.root())
            {
                self.reporter
                    .error(&format!("{target} is not accessible, try again"));
                continue;
            }

            self.reporter.prompt("Insert the volume");
            return Some(target);
        }
    }

    /// Timed prompt after a removal. `None` keeps the current mode.
    fn offer_mode_switch(&self, operator: &mut dyn Operator) -> Option<SessionState> {
        let timeout = self.settings.mode_switch_timeout;
        self.reporter.prompt(&format!(
            "Enter 1 or 2 within {}s to switch mode, 0 for the menu",
            timeout.as_secs()
        ));
        let answer = operator.read_line_timeout(timeout, &self.cancel)?;
        match answer.trim() {
            "0" => Some(SessionState::SelectingMode),
            other => SessionState::from_choice(other),
        }
    }
}
