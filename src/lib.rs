//! CodeScope Analysis - Orchestration Library
//!
//! This library provides the process-orchestration layer of the CodeScope
//! desktop application. It includes:
//! - The analysis service facade the host invokes per request
//! - Interpreter resolution for the external analysis toolchain
//! - Process supervision with timeout and cancellation guarantees
//! - Output validation and report normalization

pub mod models;
pub mod services;
pub mod utils;

// Re-export the invocation surface
pub use models::analysis::{
    AnalysisIssue, AnalysisKind, AnalysisOptions, AnalysisReport, AnalysisWarning,
    GitAnalyticsScope, JobDescriptor, ProgressUpdate,
};
pub use services::analysis::{
    AnalysisConfig, AnalysisService, ChannelReporter, InterpreterDiscovery, InterpreterResolver,
    NoopReporter, ProgressReporter,
};
pub use utils::error::{AnalysisError, AnalysisResult, ProcessErrorCategory};
