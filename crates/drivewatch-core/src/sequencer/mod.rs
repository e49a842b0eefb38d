/// Volume action sequencer — the work done once per insertion.
///
/// A single sequencer serves both modes. [`PassMode`] decides whether the
/// operator must confirm folder steps and the wipe; the steps themselves and
/// their ordering are shared:
///
/// 1. ensure the marker folder exists
/// 2. write the greeting file into it
/// 3. delete the marker folder
/// 4. wipe the volume (all top-level entries but the reserved one)
/// 5. increment and persist the session and total counters
///
/// Folder create/delete failures and an unlistable volume abort the pass
/// before counters are touched. A failed greeting or a single undeletable
/// wipe entry is reported and the pass carries on.
pub mod milestone;
pub mod steps;

pub use milestone::{MilestoneNotifier, Milestones, ReporterMilestoneNotifier};
pub use steps::{StdFs, VolumeFs};

use crate::cancel::CancelToken;
use crate::counters::{CounterStore, Counters, Tally};
use crate::error::ActionError;
use crate::operator::Operator;
use crate::report::Reporter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// How much the operator is involved in a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    /// Run every step unattended.
    Automatic,
    /// Confirm folder creation and deletion, choose whether to wipe.
    Interactive,
}

/// Answer that approves the wipe in interactive mode.
pub const WIPE_CONFIRM: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateFolder,
    WriteGreeting,
    DeleteFolder,
    Wipe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    Skipped,
    Failed,
}

/// Names and contents placed on the volume.
#[derive(Debug, Clone)]
pub struct VolumeLayout {
    pub marker_folder: String,
    pub greeting_file: String,
    pub greeting_text: String,
    pub reserved_entry: String,
}

impl VolumeLayout {
    pub fn from_config(config: &crate::WatcherConfig) -> Self {
        Self {
            marker_folder: config.marker_folder.clone(),
            greeting_file: config.greeting_file.clone(),
            greeting_text: config.greeting_text.clone(),
            reserved_entry: config.reserved_entry.clone(),
        }
    }
}

/// What one pass did.
#[derive(Debug)]
pub struct PassReport {
    pub target: PathBuf,
    pub mode: PassMode,
    pub steps: Vec<(Step, StepOutcome)>,
    /// Non-fatal errors, in the order they happened.
    pub errors: Vec<ActionError>,
    /// Counters after the pass, or the error that aborted it.
    pub outcome: Result<Tally, ActionError>,
}

impl PassReport {
    fn new(target: &Path, mode: PassMode) -> Self {
        Self {
            target: target.to_path_buf(),
            mode,
            steps: Vec::with_capacity(4),
            errors: Vec::new(),
            outcome: Ok(Tally::default()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn tally(&self) -> Option<Tally> {
        self.outcome.as_ref().ok().copied()
    }

    pub fn status(&self, step: Step) -> Option<StepOutcome> {
        self.steps.iter().find(|(s, _)| *s == step).map(|(_, st)| *st)
    }

    fn record(&mut self, step: Step, status: StepOutcome) {
        self.steps.push((step, status));
    }
}

pub struct VolumeSequencer {
    layout: VolumeLayout,
    counters: Arc<dyn CounterStore>,
    reporter: Arc<dyn Reporter>,
    milestones: Milestones,
    notifier: Arc<dyn MilestoneNotifier>,
    fs: Arc<dyn VolumeFs>,
}

impl VolumeSequencer {
    pub fn new(
        layout: VolumeLayout,
        counters: Arc<dyn CounterStore>,
        reporter: Arc<dyn Reporter>,
        milestones: Milestones,
        notifier: Arc<dyn MilestoneNotifier>,
    ) -> Self {
        Self {
            layout,
            counters,
            reporter,
            milestones,
            notifier,
            fs: Arc::new(StdFs),
        }
    }

    /// Route the pass's filesystem calls through `fs`.
    pub fn with_fs(mut self, fs: Arc<dyn VolumeFs>) -> Self {
        self.fs = fs;
        self
    }

    pub fn counters(&self) -> Counters<'_> {
        Counters::new(self.counters.as_ref())
    }

    /// Run one automatic pass.
    pub fn run_automatic(
        &self,
        target: &Path,
        operator: &mut dyn Operator,
        cancel: &CancelToken,
    ) -> PassReport {
        self.run_pass(target, PassMode::Automatic, operator, cancel)
    }

    /// Run one operator-confirmed pass.
    pub fn run_interactive(
        &self,
        target: &Path,
        operator: &mut dyn Operator,
        cancel: &CancelToken,
    ) -> PassReport {
        self.run_pass(target, PassMode::Interactive, operator, cancel)
    }

    /// Run every step against the volume at `target`.
    ///
    /// Never panics and never propagates an error: the outcome is in the
    /// returned report and has already been reported to the operator.
    /// `cancel` only interrupts confirmation prompts; a filesystem step
    /// that has started always runs to completion.
    pub fn run_pass(
        &self,
        target: &Path,
        mode: PassMode,
        operator: &mut dyn Operator,
        cancel: &CancelToken,
    ) -> PassReport {
        self.reporter
            .action(&format!("Volume detected: {}", target.display()));

        let mut report = PassReport::new(target, mode);
        let result = self.execute(target, mode, operator, cancel, &mut report);
        report.outcome = match result {
            Ok(()) => Ok(self.finish_pass()),
            Err(e) => {
                self.reporter.error(&e.to_string());
                Err(e)
            }
        };
        report
    }

    fn execute(
        &self,
        target: &Path,
        mode: PassMode,
        operator: &mut dyn Operator,
        cancel: &CancelToken,
        report: &mut PassReport,
    ) -> Result<(), ActionError> {
        let folder = target.join(&self.layout.marker_folder);

        // 1. Marker folder.
        let created = match mode {
            PassMode::Automatic => self.create_folder(&folder, report)?,
            PassMode::Interactive if folder.is_dir() => {
                report.record(Step::CreateFolder, StepOutcome::Skipped);
                false
            }
            PassMode::Interactive => {
                self.reporter.prompt("Enter any key to create the folder");
                confirm(operator, cancel)?;
                self.create_folder(&folder, report)?
            }
        };

        // 2. Greeting. Interactive passes only greet a folder they created.
        if mode == PassMode::Automatic || created {
            self.greet(&folder, report);
        } else {
            report.record(Step::WriteGreeting, StepOutcome::Skipped);
        }

        // 3. Remove the marker folder.
        if mode == PassMode::Interactive {
            self.reporter.prompt("Enter any key to delete the folder");
            confirm(operator, cancel)?;
        }
        if let Err(e) = steps::remove_folder(self.fs.as_ref(), &folder) {
            report.record(Step::DeleteFolder, StepOutcome::Failed);
            return Err(e);
        }
        report.record(Step::DeleteFolder, StepOutcome::Done);
        self.reporter.action("Folder deleted");

        // 4. Wipe.
        let wipe = match mode {
            PassMode::Automatic => true,
            PassMode::Interactive => {
                self.reporter.prompt(&format!(
                    "Enter {WIPE_CONFIRM} to wipe the volume, anything else to skip"
                ));
                confirm(operator, cancel)?.trim() == WIPE_CONFIRM
            }
        };
        if wipe {
            self.wipe(target, report)?;
        } else {
            report.record(Step::Wipe, StepOutcome::Skipped);
            self.reporter.action("Wipe skipped");
        }

        Ok(())
    }

    fn create_folder(&self, folder: &Path, report: &mut PassReport) -> Result<bool, ActionError> {
        match steps::ensure_folder(self.fs.as_ref(), folder) {
            Ok(true) => {
                report.record(Step::CreateFolder, StepOutcome::Done);
                self.reporter.action("Folder created");
                Ok(true)
            }
            Ok(false) => {
                debug!("Marker folder {} already present", folder.display());
                report.record(Step::CreateFolder, StepOutcome::Skipped);
                Ok(false)
            }
            Err(e) => {
                report.record(Step::CreateFolder, StepOutcome::Failed);
                Err(e)
            }
        }
    }

    fn greet(&self, folder: &Path, report: &mut PassReport) {
        let written = steps::write_greeting(
            self.fs.as_ref(),
            folder,
            &self.layout.greeting_file,
            &self.layout.greeting_text,
        );
        match written {
            Ok(_) => {
                report.record(Step::WriteGreeting, StepOutcome::Done);
                self.reporter.action(&format!(
                    "Greeting file '{}' created",
                    self.layout.greeting_file
                ));
            }
            Err(e) => {
                report.record(Step::WriteGreeting, StepOutcome::Failed);
                self.reporter.error(&e.to_string());
                report.errors.push(e);
            }
        }
    }

    fn wipe(&self, target: &Path, report: &mut PassReport) -> Result<(), ActionError> {
        let summary = match steps::wipe(self.fs.as_ref(), target, &self.layout.reserved_entry) {
            Ok(s) => s,
            Err(e) => {
                report.record(Step::Wipe, StepOutcome::Failed);
                return Err(e);
            }
        };
        for path in &summary.removed {
            self.reporter.action(&format!("Deleted: {}", path.display()));
        }
        for e in &summary.failed {
            self.reporter.error(&e.to_string());
        }
        report.record(Step::Wipe, StepOutcome::Done);
        report.errors.extend(summary.failed);
        self.reporter.action("Wipe complete");
        Ok(())
    }

    /// Bump counters and tell the operator. Only reached by passes that
    /// were not aborted.
    fn finish_pass(&self) -> Tally {
        let tally = self.counters().record_pass();
        if self.milestones.is_reached(tally.session) {
            self.notifier.milestone(tally.session);
        }

        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        self.reporter.success("Volume cleaned");
        self.reporter
            .success(&format!("Volume check #{} completed at {now}", tally.total));
        self.reporter
            .info(&format!("Connections this session: {}", tally.session));
        self.reporter
            .info(&format!("Connections in total: {}", tally.total));
        info!(
            "Pass complete: session {}, total {}",
            tally.session, tally.total
        );
        tally
    }
}

/// Wait for the operator's answer to a confirmation prompt.
fn confirm(operator: &mut dyn Operator, cancel: &CancelToken) -> Result<String, ActionError> {
    operator.read_token(cancel).ok_or(ActionError::Interrupted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::{Counter, MemoryCounterStore};
    use crate::operator::ScriptedOperator;
    use crate::report::TracingReporter;
    use std::io;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingNotifier {
        calls: AtomicU64,
        last: AtomicU64,
    }

    impl MilestoneNotifier for CountingNotifier {
        fn milestone(&self, session_count: u64) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last.store(session_count, Ordering::SeqCst);
        }
    }

    fn layout() -> VolumeLayout {
        VolumeLayout::from_config(&crate::WatcherConfig::default())
    }

    fn sequencer(
        store: Arc<MemoryCounterStore>,
        notifier: Arc<CountingNotifier>,
    ) -> VolumeSequencer {
        VolumeSequencer::new(
            layout(),
            store,
            Arc::new(TracingReporter),
            Milestones::new([50, 100, 200]),
            notifier,
        )
    }

    fn no_cancel() -> CancelToken {
        CancelToken::new()
    }

    fn denied() -> io::Error {
        io::Error::new(io::ErrorKind::PermissionDenied, "access denied")
    }

    /// Refuses to delete one named file.
    struct LockedFile(&'static str);

    impl VolumeFs for LockedFile {
        fn remove_file(&self, path: &Path) -> io::Result<()> {
            if path.file_name().is_some_and(|n| n == self.0) {
                return Err(denied());
            }
            std::fs::remove_file(path)
        }
    }

    /// Refuses every recursive delete.
    struct StuckFolder;

    impl VolumeFs for StuckFolder {
        fn remove_dir_all(&self, _path: &Path) -> io::Result<()> {
            Err(denied())
        }
    }

    /// Refuses to list any directory.
    struct Unlistable;

    impl VolumeFs for Unlistable {
        fn read_dir(&self, _path: &Path) -> io::Result<std::fs::ReadDir> {
            Err(denied())
        }
    }

    #[test]
    fn automatic_pass_on_empty_volume() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(MemoryCounterStore::new());
        let seq = sequencer(Arc::clone(&store), Arc::default());

        let report = seq.run_automatic(tmp.path(), &mut ScriptedOperator::default(), &no_cancel());

        assert_eq!(report.tally(), Some(Tally { session: 1, total: 1 }));
        assert!(!tmp.path().join("new_folder").exists());
        assert_eq!(report.status(Step::CreateFolder), Some(StepOutcome::Done));
        assert_eq!(report.status(Step::WriteGreeting), Some(StepOutcome::Done));
        assert_eq!(report.status(Step::DeleteFolder), Some(StepOutcome::Done));
        assert_eq!(report.status(Step::Wipe), Some(StepOutcome::Done));
        assert!(report.errors.is_empty());
    }

    #[test]
    fn automatic_pass_wipes_all_but_reserved() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "a").unwrap();
        std::fs::write(tmp.path().join("b.txt"), "b").unwrap();
        std::fs::create_dir(tmp.path().join("System Volume Information")).unwrap();
        let seq = sequencer(Arc::default(), Arc::default());

        assert!(seq
            .run_automatic(tmp.path(), &mut ScriptedOperator::default(), &no_cancel())
            .is_success());

        let left: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(left, vec!["System Volume Information".to_owned()]);
    }

    #[test]
    fn folder_create_failure_leaves_counters_untouched() {
        let tmp = TempDir::new().unwrap();
        // A file where the marker folder should go.
        std::fs::write(tmp.path().join("new_folder"), "blocker").unwrap();
        std::fs::write(tmp.path().join("keep.txt"), "k").unwrap();
        let store = Arc::new(MemoryCounterStore::new());
        let seq = sequencer(Arc::clone(&store), Arc::default());

        let report = seq.run_automatic(tmp.path(), &mut ScriptedOperator::default(), &no_cancel());

        assert!(matches!(
            report.outcome,
            Err(ActionError::FolderCreateFailed { .. })
        ));
        assert_eq!(report.status(Step::Wipe), None);
        assert!(tmp.path().join("keep.txt").exists());
        assert_eq!(store.read(Counter::Session), 0);
        assert_eq!(store.read(Counter::Total), 0);
    }

    #[test]
    fn interactive_pass_waits_for_confirmations() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "a").unwrap();
        let seq = sequencer(Arc::default(), Arc::default());
        // create, delete, skip wipe
        let mut operator = ScriptedOperator::new(["1", "2", "0"]);

        let report = seq.run_interactive(tmp.path(), &mut operator, &no_cancel());

        assert_eq!(report.tally(), Some(Tally { session: 1, total: 1 }));
        assert_eq!(report.status(Step::WriteGreeting), Some(StepOutcome::Done));
        assert_eq!(report.status(Step::Wipe), Some(StepOutcome::Skipped));
        assert!(tmp.path().join("a.txt").exists());
        assert!(!tmp.path().join("new_folder").exists());
        assert_eq!(operator.remaining(), 0);
    }

    #[test]
    fn interactive_pass_wipes_on_request() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "a").unwrap();
        let seq = sequencer(Arc::default(), Arc::default());

        let mut operator = ScriptedOperator::new(["1", "1", "1"]);

        let report = seq.run_interactive(tmp.path(), &mut operator, &no_cancel());

        assert_eq!(report.status(Step::Wipe), Some(StepOutcome::Done));
        assert!(!tmp.path().join("a.txt").exists());
    }

    #[test]
    fn interactive_pass_skips_greeting_for_existing_folder() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("new_folder")).unwrap();
        let seq = sequencer(Arc::default(), Arc::default());
        // no create prompt: delete, skip wipe
        let mut operator = ScriptedOperator::new(["2", "0"]);

        let report = seq.run_interactive(tmp.path(), &mut operator, &no_cancel());

        assert!(report.is_success());
        assert_eq!(report.status(Step::CreateFolder), Some(StepOutcome::Skipped));
        assert_eq!(report.status(Step::WriteGreeting), Some(StepOutcome::Skipped));
        assert_eq!(operator.remaining(), 0);
    }

    #[test]
    fn interactive_pass_aborts_when_input_ends() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(MemoryCounterStore::new());
        let seq = sequencer(Arc::clone(&store), Arc::default());

        let mut operator = ScriptedOperator::new(["1"]);

        let report = seq.run_interactive(tmp.path(), &mut operator, &no_cancel());

        assert!(matches!(report.outcome, Err(ActionError::Interrupted)));
        assert_eq!(store.read(Counter::Total), 0);
    }

    #[test]
    fn milestone_fires_once_at_threshold() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(MemoryCounterStore::new());
        store.write(Counter::Session, 48);
        let notifier = Arc::new(CountingNotifier::default());
        let seq = sequencer(Arc::clone(&store), Arc::clone(&notifier));

        for _ in 0..4 {
            assert!(seq
                .run_automatic(tmp.path(), &mut ScriptedOperator::default(), &no_cancel())
                .is_success());
        }

        assert_eq!(store.read(Counter::Session), 52);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.last.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn greeting_failure_is_reported_but_pass_completes() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(MemoryCounterStore::new());
        let layout = VolumeLayout {
            greeting_file: "no/such/dir/welcome.txt".to_owned(),
            ..layout()
        };
        let seq = VolumeSequencer::new(
            layout,
            Arc::clone(&store) as Arc<dyn CounterStore>,
            Arc::new(TracingReporter),
            Milestones::new([50, 100, 200]),
            Arc::new(CountingNotifier::default()),
        );

        let report = seq.run_automatic(tmp.path(), &mut ScriptedOperator::default(), &no_cancel());

        assert_eq!(report.tally(), Some(Tally { session: 1, total: 1 }));
        assert_eq!(report.status(Step::WriteGreeting), Some(StepOutcome::Failed));
        assert_eq!(report.status(Step::DeleteFolder), Some(StepOutcome::Done));
        assert_eq!(report.status(Step::Wipe), Some(StepOutcome::Done));
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            report.errors[0],
            ActionError::FileWriteFailed { .. }
        ));
        assert!(!tmp.path().join("new_folder").exists());
    }

    #[test]
    fn locked_entry_is_skipped_and_pass_completes() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("locked.txt"), "l").unwrap();
        std::fs::write(tmp.path().join("a.txt"), "a").unwrap();
        std::fs::write(tmp.path().join("b.txt"), "b").unwrap();
        let store = Arc::new(MemoryCounterStore::new());
        let seq = sequencer(Arc::clone(&store), Arc::default())
            .with_fs(Arc::new(LockedFile("locked.txt")));

        let report = seq.run_automatic(tmp.path(), &mut ScriptedOperator::default(), &no_cancel());

        assert!(report.is_success());
        assert_eq!(report.status(Step::Wipe), Some(StepOutcome::Done));
        assert!(tmp.path().join("locked.txt").exists());
        assert!(!tmp.path().join("a.txt").exists());
        assert!(!tmp.path().join("b.txt").exists());
        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            report.errors[0],
            ActionError::WipeEntryFailed { .. }
        ));
        assert_eq!(store.read(Counter::Session), 1);
        assert_eq!(store.read(Counter::Total), 1);
    }

    #[test]
    fn folder_delete_failure_aborts_before_wipe() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("keep.txt"), "k").unwrap();
        let store = Arc::new(MemoryCounterStore::new());
        let seq = sequencer(Arc::clone(&store), Arc::default()).with_fs(Arc::new(StuckFolder));

        let report = seq.run_automatic(tmp.path(), &mut ScriptedOperator::default(), &no_cancel());

        assert!(matches!(
            report.outcome,
            Err(ActionError::FolderDeleteFailed { .. })
        ));
        assert_eq!(report.status(Step::DeleteFolder), Some(StepOutcome::Failed));
        assert_eq!(report.status(Step::Wipe), None);
        assert!(tmp.path().join("keep.txt").exists());
        assert_eq!(store.read(Counter::Session), 0);
        assert_eq!(store.read(Counter::Total), 0);
    }

    #[test]
    fn unlistable_root_aborts_the_wipe() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("keep.txt"), "k").unwrap();
        let store = Arc::new(MemoryCounterStore::new());
        let seq = sequencer(Arc::clone(&store), Arc::default()).with_fs(Arc::new(Unlistable));

        let report = seq.run_automatic(tmp.path(), &mut ScriptedOperator::default(), &no_cancel());

        assert!(matches!(
            report.outcome,
            Err(ActionError::WipeListFailed { .. })
        ));
        assert_eq!(report.status(Step::DeleteFolder), Some(StepOutcome::Done));
        assert_eq!(report.status(Step::Wipe), Some(StepOutcome::Failed));
        assert!(tmp.path().join("keep.txt").exists());
        assert_eq!(store.read(Counter::Session), 0);
        assert_eq!(store.read(Counter::Total), 0);
    }

    #[test]
    fn cancelled_token_interrupts_interactive_pass() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(MemoryCounterStore::new());
        let seq = sequencer(Arc::clone(&store), Arc::default());
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut operator = ScriptedOperator::new(["1", "1", "1"]);

        let report = seq.run_interactive(tmp.path(), &mut operator, &cancel);

        assert!(matches!(report.outcome, Err(ActionError::Interrupted)));
        assert_eq!(operator.remaining(), 3);
        assert!(!tmp.path().join("new_folder").exists());
        assert_eq!(store.read(Counter::Total), 0);
    }
}
