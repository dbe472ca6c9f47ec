//! Analysis Orchestration
//!
//! Runs external analysis toolchain jobs: interpreter resolution, job
//! descriptor construction, process supervision, and output validation,
//! fronted by the [`AnalysisService`] facade.

pub mod descriptor;
pub mod interpreter;
pub mod output;
pub mod progress;
pub mod service;
pub mod supervisor;

pub use descriptor::JobDescriptorBuilder;
pub use interpreter::{InterpreterDiscovery, InterpreterResolver};
pub use output::{extract_json_span, normalize_keys, parse_output, ParsedOutput};
pub use progress::{ChannelReporter, NoopReporter, ProgressReporter, ProgressTracker};
pub use service::{AnalysisConfig, AnalysisService};
pub use supervisor::{ProcessSupervisor, RawJobOutput};
