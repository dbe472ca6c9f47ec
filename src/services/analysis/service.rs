//! Analysis Orchestration Service
//!
//! The facade callers interact with. Sequences interpreter resolution,
//! descriptor construction, process supervision, and output validation for
//! one request, and folds every failure into a uniform report. Never
//! returns an error to the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::analysis::{
    AnalysisKind, AnalysisOptions, AnalysisReport, AnalysisRequest, ProgressUpdate,
};
use crate::utils::error::AnalysisResult;

use super::descriptor::JobDescriptorBuilder;
use super::interpreter::{InterpreterDiscovery, InterpreterResolver};
use super::output::parse_output;
use super::progress::{NoopReporter, ProgressReporter, ProgressTracker};
use super::supervisor::ProcessSupervisor;

/// Configuration for the analysis service
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Directory holding the toolchain scripts
    pub toolchain_dir: PathBuf,
}

impl AnalysisConfig {
    /// Create a configuration rooted at the toolchain directory
    pub fn new(toolchain_dir: impl Into<PathBuf>) -> Self {
        Self {
            toolchain_dir: toolchain_dir.into(),
        }
    }
}

/// Orchestrates analysis jobs end to end
pub struct AnalysisService {
    builder: JobDescriptorBuilder,
    resolver: InterpreterResolver,
    supervisor: ProcessSupervisor,
    reporter: Arc<dyn ProgressReporter>,
}

impl AnalysisService {
    /// Create a service with default resolver and a no-op progress reporter
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            builder: JobDescriptorBuilder::new(config.toolchain_dir),
            resolver: InterpreterResolver::new(),
            supervisor: ProcessSupervisor::new(),
            reporter: Arc::new(NoopReporter),
        }
    }

    /// Attach a progress reporter
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Attach a host interpreter-discovery integration
    pub fn with_discovery(mut self, discovery: Arc<dyn InterpreterDiscovery>) -> Self {
        self.resolver = std::mem::take(&mut self.resolver).with_discovery(discovery);
        self
    }

    /// Replace the interpreter resolver wholesale
    pub fn with_resolver(mut self, resolver: InterpreterResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Run one analysis job to completion.
    ///
    /// Always returns a report: every failure, including cancellation and
    /// timeout, is encoded in `errors` rather than raised. Exactly one
    /// report is produced per call.
    pub async fn run_analysis(
        &self,
        kind: AnalysisKind,
        target_path: impl AsRef<Path>,
        options: AnalysisOptions,
    ) -> AnalysisReport {
        let started = Instant::now();
        let request = AnalysisRequest::new(kind, target_path.as_ref(), options);
        info!(
            kind = kind.label(),
            target = %request.target_path.display(),
            "starting analysis job"
        );

        let report = match self.execute(&request).await {
            Ok(report) => report,
            Err(e) => {
                warn!(kind = kind.label(), error = %e, "analysis job failed");
                AnalysisReport::failure(e.kind_tag(), e.to_string())
            }
        };
        report.with_execution_time(started.elapsed())
    }

    /// Request termination of the running job, if any. Idempotent; safe to
    /// call when no job is active.
    pub fn cancel(&self) {
        self.supervisor.cancel_current();
    }

    /// Tear down any live process. Called on host shutdown; idempotent.
    pub fn dispose(&self) {
        self.supervisor.dispose();
    }

    /// Whether a job is currently running
    pub fn is_busy(&self) -> bool {
        self.supervisor.is_busy()
    }

    async fn execute(&self, request: &AnalysisRequest) -> AnalysisResult<AnalysisReport> {
        self.report_progress("Resolving interpreter", 2);
        let interpreter = self
            .resolver
            .resolve(request.options.interpreter_override.as_deref())
            .await?;

        self.report_progress("Preparing analysis job", 5);
        let descriptor = self.builder.build(request, interpreter)?;

        let mut tracker = ProgressTracker::for_kind(request.kind);
        let reporter = Arc::clone(&self.reporter);
        let cancel = CancellationToken::new();

        let raw = self
            .supervisor
            .run(
                &descriptor,
                |line| {
                    if let Some(update) = tracker.observe_line(line) {
                        reporter.report(update);
                    }
                },
                &cancel,
            )
            .await?;

        let parsed = parse_output(&raw.stdout, request.kind)?;
        if !parsed.structural_warnings.is_empty() {
            debug!(
                count = parsed.structural_warnings.len(),
                "report passed with structural findings"
            );
        }

        if parsed.success {
            self.report_progress("Analysis complete", 100);
        }

        Ok(AnalysisReport {
            success: parsed.success,
            data: parsed.data,
            errors: parsed.errors,
            warnings: parsed.warnings,
            execution_time_ms: 0,
        })
    }

    fn report_progress(&self, message: &str, percent: u8) {
        self.reporter.report(ProgressUpdate::new(message, percent));
    }
}
