//! Analysis Models
//!
//! Data structures for analysis jobs and their results: what the caller
//! submits, the fully-resolved execution plan, and the report handed back
//! to the host renderer.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The kind of analysis job to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Full-project analysis
    Project,
    /// Single-file analysis
    File,
    /// Version-control analytics over the project history
    GitAnalytics,
    /// Database schema analysis
    Schema,
}

impl AnalysisKind {
    /// Human-readable label used in progress messages and logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Project => "project analysis",
            Self::File => "file analysis",
            Self::GitAnalytics => "git analytics",
            Self::Schema => "schema analysis",
        }
    }
}

/// Scope of a git analytics run, selected via the request's analytics subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GitAnalyticsScope {
    /// Per-author contribution statistics
    AuthorStats,
    /// Per-module contribution breakdown
    ModuleContributions,
    /// Commit activity over time
    CommitTimeline,
    /// Everything the analytics script can compute
    #[default]
    Full,
}

impl GitAnalyticsScope {
    /// Map a requested subtype string onto a scope. Unknown subtypes fall
    /// back to the full analysis rather than failing the request.
    pub fn from_subtype(subtype: Option<&str>) -> Self {
        match subtype {
            Some("author_stats") | Some("git_author_stats") => Self::AuthorStats,
            Some("module_contributions") | Some("git_module_contributions") => {
                Self::ModuleContributions
            }
            Some("commit_timeline") | Some("git_commit_timeline") => Self::CommitTimeline,
            _ => Self::Full,
        }
    }

    /// The CLI flag the analytics script expects for this scope
    pub fn flag(&self) -> &'static str {
        match self {
            Self::AuthorStats => "--author-stats",
            Self::ModuleContributions => "--module-contributions",
            Self::CommitTimeline => "--commit-timeline",
            Self::Full => "--full-analysis",
        }
    }
}

/// Per-request options supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Explicit interpreter to use instead of resolving one
    pub interpreter_override: Option<PathBuf>,
    /// Timeout override in milliseconds
    pub timeout_override_ms: Option<u64>,
    /// Analytics subtype (git analytics only)
    pub analytics_subtype: Option<String>,
}

impl AnalysisOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interpreter override
    pub fn with_interpreter(mut self, path: impl Into<PathBuf>) -> Self {
        self.interpreter_override = Some(path.into());
        self
    }

    /// Set the timeout override in milliseconds
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_override_ms = Some(ms);
        self
    }

    /// Set the analytics subtype
    pub fn with_analytics_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.analytics_subtype = Some(subtype.into());
        self
    }
}

/// An analysis request as submitted by the caller. Immutable once built.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// What to run
    pub kind: AnalysisKind,
    /// File or directory the job operates on
    pub target_path: PathBuf,
    /// Caller-supplied options
    pub options: AnalysisOptions,
}

impl AnalysisRequest {
    /// Create a new request
    pub fn new(kind: AnalysisKind, target_path: impl Into<PathBuf>, options: AnalysisOptions) -> Self {
        Self {
            kind,
            target_path: target_path.into(),
            options,
        }
    }
}

/// The fully-resolved, side-effect-free execution plan for one job.
/// Derived deterministically from an [`AnalysisRequest`]; pure data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    /// Interpreter executable to launch
    pub interpreter: PathBuf,
    /// Toolchain script passed as the first argument
    pub script: PathBuf,
    /// Ordered argument list, script path included
    pub args: Vec<String>,
    /// Working directory for the child process
    pub working_dir: PathBuf,
    /// Timeout budget for the run
    pub timeout: Duration,
}

/// One error entry in an analysis report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisIssue {
    /// Machine-readable issue kind (snake_case tag)
    pub kind: String,
    /// Human-readable message
    pub message: String,
    /// File the issue refers to, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Line number within the file, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
}

impl AnalysisIssue {
    /// Create an issue with just a kind and message
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            file: None,
            line: None,
        }
    }
}

/// One warning entry in an analysis report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisWarning {
    /// Machine-readable warning kind
    pub kind: String,
    /// Human-readable message
    pub message: String,
    /// Module the warning refers to, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// What references the module, when known
    #[serde(default, alias = "referenced_by", skip_serializing_if = "Option::is_none")]
    pub referenced_by: Option<String>,
}

impl AnalysisWarning {
    /// Create a warning with just a kind and message
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            module: None,
            referenced_by: None,
        }
    }
}

/// The single value returned to callers for every submitted request.
/// Immutable after construction; serialized to the host frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Whether the analysis succeeded
    pub success: bool,
    /// Kind-specific report payload, normalized to canonical field names
    #[serde(default)]
    pub data: serde_json::Value,
    /// Errors, ordered as produced. Always present, possibly empty.
    #[serde(default)]
    pub errors: Vec<AnalysisIssue>,
    /// Warnings, ordered as produced. Always present, possibly empty.
    #[serde(default)]
    pub warnings: Vec<AnalysisWarning>,
    /// Wall-clock execution time in milliseconds
    pub execution_time_ms: u64,
}

impl AnalysisReport {
    /// Create a failed report carrying a single issue
    pub fn failure(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: serde_json::Value::Null,
            errors: vec![AnalysisIssue::new(kind, message)],
            warnings: Vec::new(),
            execution_time_ms: 0,
        }
    }

    /// Stamp the execution time, consuming and returning the report
    pub fn with_execution_time(mut self, elapsed: Duration) -> Self {
        self.execution_time_ms = elapsed.as_millis() as u64;
        self
    }
}

/// A progress update emitted at orchestrator-defined milestones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    /// Milestone description shown to the user
    pub message: String,
    /// Coarse completion estimate, 0..=100
    pub percent: u8,
}

impl ProgressUpdate {
    /// Create a progress update
    pub fn new(message: impl Into<String>, percent: u8) -> Self {
        Self {
            message: message.into(),
            percent: percent.min(100),
        }
    }
}
