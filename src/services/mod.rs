//! Services
//!
//! Business logic services for the orchestration layer. Services handle the
//! core functionality and are called by the host application.

pub mod analysis;

pub use analysis::{AnalysisConfig, AnalysisService, InterpreterDiscovery, ProgressReporter};
