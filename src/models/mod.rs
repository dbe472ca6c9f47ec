//! Data Models
//!
//! Shared data structures passed between the orchestration layer and the host.

pub mod analysis;

pub use analysis::{
    AnalysisIssue, AnalysisKind, AnalysisOptions, AnalysisReport, AnalysisRequest,
    AnalysisWarning, GitAnalyticsScope, JobDescriptor, ProgressUpdate,
};
