//! Progress Tracking
//!
//! Best-effort progress estimation from toolchain stdout. Known marker
//! phrases advance a coarse percentage per job kind; unmatched lines produce
//! no update. The estimate is monotonically non-decreasing and never exceeds
//! 100. This is telemetry coupled to the toolchain's log wording, not a
//! contract.

use tokio::sync::mpsc;

use crate::models::analysis::{AnalysisKind, ProgressUpdate};

/// Sink for milestone updates, injected by the host
pub trait ProgressReporter: Send + Sync {
    /// Receive one milestone update
    fn report(&self, update: ProgressUpdate);
}

/// Reporter that discards all updates
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _update: ProgressUpdate) {}
}

/// Reporter that forwards updates into an mpsc channel for the host shell
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ChannelReporter {
    /// Create a reporter and the receiving end of its channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, update: ProgressUpdate) {
        // Receiver dropped means the host stopped listening; drop silently.
        let _ = self.tx.send(update);
    }
}

/// Marker phrases the project analyzer prints, with their completion estimates
const PROJECT_MILESTONES: &[(&str, u8)] = &[
    ("Scanning project files", 10),
    ("Parsing modules", 30),
    ("Analyzing modules...", 50),
    ("Building dependency graph", 70),
    ("Generating report", 90),
];

const FILE_MILESTONES: &[(&str, u8)] = &[
    ("Parsing file", 30),
    ("Analyzing functions", 60),
    ("Generating report", 90),
];

const GIT_MILESTONES: &[(&str, u8)] = &[
    ("Reading repository", 15),
    ("Processing commits...", 50),
    ("Aggregating statistics", 80),
    ("Generating report", 90),
];

const SCHEMA_MILESTONES: &[(&str, u8)] = &[
    ("Locating schema definitions", 20),
    ("Analyzing tables", 55),
    ("Generating report", 90),
];

/// Tracks progress for one job from its stdout lines
pub struct ProgressTracker {
    milestones: &'static [(&'static str, u8)],
    percent: u8,
}

impl ProgressTracker {
    /// Create a tracker with the milestone table for the given kind
    pub fn for_kind(kind: AnalysisKind) -> Self {
        let milestones = match kind {
            AnalysisKind::Project => PROJECT_MILESTONES,
            AnalysisKind::File => FILE_MILESTONES,
            AnalysisKind::GitAnalytics => GIT_MILESTONES,
            AnalysisKind::Schema => SCHEMA_MILESTONES,
        };
        Self {
            milestones,
            percent: 0,
        }
    }

    /// Match a stdout line against the milestone table. Returns an update
    /// only when the line advances the estimate.
    pub fn observe_line(&mut self, line: &str) -> Option<ProgressUpdate> {
        for (marker, percent) in self.milestones {
            if line.contains(marker) && *percent > self.percent {
                self.percent = (*percent).min(100);
                return Some(ProgressUpdate::new(marker.to_string(), self.percent));
            }
        }
        None
    }

    /// Current completion estimate
    pub fn percent(&self) -> u8 {
        self.percent
    }
}
