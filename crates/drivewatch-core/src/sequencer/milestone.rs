/// Session milestones.
///
/// Purely cosmetic: when the session counter lands exactly on a threshold
/// the notifier is told once. Counters only move by one per pass, so each
/// threshold fires at most once per monitoring run.
use crate::report::Reporter;
use std::sync::Arc;

pub trait MilestoneNotifier: Send + Sync {
    fn milestone(&self, session_count: u64);
}

#[derive(Debug, Clone)]
pub struct Milestones {
    thresholds: Vec<u64>,
}

impl Milestones {
    pub fn new(thresholds: impl IntoIterator<Item = u64>) -> Self {
        let mut thresholds: Vec<u64> = thresholds.into_iter().collect();
        thresholds.sort_unstable();
        thresholds.dedup();
        Self { thresholds }
    }

    pub fn is_reached(&self, session_count: u64) -> bool {
        self.thresholds.binary_search(&session_count).is_ok()
    }
}

/// Announces milestones as warning-level operator messages.
pub struct ReporterMilestoneNotifier {
    reporter: Arc<dyn Reporter>,
}

impl ReporterMilestoneNotifier {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self { reporter }
    }
}

impl MilestoneNotifier for ReporterMilestoneNotifier {
    fn milestone(&self, session_count: u64) {
        self.reporter.warning(&format!(
            "Milestone: {session_count} volumes checked this session. Time for a stretch."
        ));
    }
}
