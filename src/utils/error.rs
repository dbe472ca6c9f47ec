//! Error Handling
//!
//! Unified error types for the analysis orchestration layer.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Category attached to process-level failures, derived from the underlying
/// OS error when spawning, or from the exit outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessErrorCategory {
    /// The executable or toolchain script could not be found
    MissingExecutable,
    /// The OS refused to execute the target
    PermissionDenied,
    /// Spawning failed due to resource limits (fd/memory/process table)
    ResourceExhausted,
    /// Anything else, including nonzero exits with no usable output
    Unknown,
}

impl std::fmt::Display for ProcessErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MissingExecutable => "missing executable",
            Self::PermissionDenied => "permission denied",
            Self::ResourceExhausted => "resource exhaustion",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Errors produced while orchestrating an analysis job
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The request failed kind-specific precondition checks
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No usable interpreter remained after trying every candidate
    #[error("Interpreter not found: {0}")]
    InterpreterNotFound(String),

    /// The external process failed to launch or exited unusably
    #[error("Process error ({category}): {message}")]
    ProcessError {
        category: ProcessErrorCategory,
        message: String,
    },

    /// The job exceeded its timeout budget and was terminated
    #[error("Analysis timed out after {limit_ms} ms")]
    Timeout { limit_ms: u64 },

    /// The caller cancelled the job; not an application error
    #[error("Analysis cancelled")]
    Cancelled,

    /// Output was present but not parseable as the expected report format
    #[error("Malformed output: {0}")]
    MalformedOutput(String),
}

/// Result type alias for orchestration errors
pub type AnalysisResult<T> = Result<T, AnalysisError>;

impl AnalysisError {
    /// Create an invalid-request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an interpreter-not-found error
    pub fn interpreter_not_found(msg: impl Into<String>) -> Self {
        Self::InterpreterNotFound(msg.into())
    }

    /// Create a process error with an explicit category
    pub fn process(category: ProcessErrorCategory, msg: impl Into<String>) -> Self {
        Self::ProcessError {
            category,
            message: msg.into(),
        }
    }

    /// Create a malformed-output error
    pub fn malformed_output(msg: impl Into<String>) -> Self {
        Self::MalformedOutput(msg.into())
    }

    /// Stable snake_case tag used when folding errors into reports
    pub fn kind_tag(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InterpreterNotFound(_) => "interpreter_not_found",
            Self::ProcessError { .. } => "process_error",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
            Self::MalformedOutput(_) => "malformed_output",
        }
    }
}

/// Translate a spawn failure into a categorized, actionable process error
pub fn spawn_error(err: &std::io::Error, executable: &str) -> AnalysisError {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::NotFound => AnalysisError::process(
            ProcessErrorCategory::MissingExecutable,
            format!(
                "Executable '{}' was not found. Verify the interpreter path and that the analysis toolchain is installed.",
                executable
            ),
        ),
        ErrorKind::PermissionDenied => AnalysisError::process(
            ProcessErrorCategory::PermissionDenied,
            format!("Permission denied executing '{}'.", executable),
        ),
        ErrorKind::WouldBlock | ErrorKind::OutOfMemory => AnalysisError::process(
            ProcessErrorCategory::ResourceExhausted,
            format!("Insufficient resources to launch '{}': {}", executable, err),
        ),
        _ => AnalysisError::process(
            ProcessErrorCategory::Unknown,
            format!("Failed to launch '{}': {}", executable, err),
        ),
    }
}
