//! Job Descriptor Construction
//!
//! Converts an analysis request into a fully-resolved execution plan:
//! interpreter, toolchain script, argument list, working directory, and
//! timeout. All kind-specific preconditions are validated here, before any
//! process is spawned.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ignore::WalkBuilder;

use crate::models::analysis::{AnalysisKind, AnalysisRequest, GitAnalyticsScope, JobDescriptor};
use crate::utils::error::{AnalysisError, AnalysisResult};

/// Default timeout per job kind, in milliseconds
pub const PROJECT_TIMEOUT_MS: u64 = 300_000;
pub const FILE_TIMEOUT_MS: u64 = 60_000;
pub const GIT_ANALYTICS_TIMEOUT_MS: u64 = 180_000;
pub const SCHEMA_TIMEOUT_MS: u64 = 120_000;

/// Source extension the toolchain analyzes
const SOURCE_EXTENSION: &str = "py";

/// Dependency-cache directories skipped when scanning for sources
const EXCLUDED_DIRS: &[&str] = &[
    "venv",
    ".venv",
    "env",
    "site-packages",
    "__pycache__",
    "node_modules",
    ".git",
];

/// Toolchain script invoked for each job kind
fn script_name(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::Project => "analyzer.py",
        AnalysisKind::File => "file_analyzer.py",
        AnalysisKind::GitAnalytics => "git_analytics.py",
        AnalysisKind::Schema => "schema_analyzer.py",
    }
}

/// Default timeout for a job kind
pub fn default_timeout(kind: AnalysisKind) -> Duration {
    let ms = match kind {
        AnalysisKind::Project => PROJECT_TIMEOUT_MS,
        AnalysisKind::File => FILE_TIMEOUT_MS,
        AnalysisKind::GitAnalytics => GIT_ANALYTICS_TIMEOUT_MS,
        AnalysisKind::Schema => SCHEMA_TIMEOUT_MS,
    };
    Duration::from_millis(ms)
}

/// Builds job descriptors against a configured toolchain directory
pub struct JobDescriptorBuilder {
    toolchain_dir: PathBuf,
}

impl JobDescriptorBuilder {
    /// Create a builder rooted at the directory holding the toolchain scripts
    pub fn new(toolchain_dir: impl Into<PathBuf>) -> Self {
        Self {
            toolchain_dir: toolchain_dir.into(),
        }
    }

    /// Build a descriptor for the request, validating kind-specific
    /// preconditions first. No process is spawned on any failure path.
    pub fn build(
        &self,
        request: &AnalysisRequest,
        interpreter: PathBuf,
    ) -> AnalysisResult<JobDescriptor> {
        let target = &request.target_path;

        if !target.exists() {
            return Err(AnalysisError::invalid_request(format!(
                "Target path does not exist: {}",
                target.display()
            )));
        }

        self.validate_target(request.kind, target)?;

        let script = self.toolchain_dir.join(script_name(request.kind));
        let target_str = target.display().to_string();
        let script_str = script.display().to_string();

        let args = match request.kind {
            AnalysisKind::Project | AnalysisKind::Schema | AnalysisKind::File => {
                vec![script_str, target_str]
            }
            AnalysisKind::GitAnalytics => {
                let scope =
                    GitAnalyticsScope::from_subtype(request.options.analytics_subtype.as_deref());
                vec![
                    script_str,
                    target_str,
                    scope.flag().to_string(),
                    "--json".to_string(),
                ]
            }
        };

        let working_dir = if target.is_dir() {
            target.clone()
        } else {
            target
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        };

        let timeout = request
            .options
            .timeout_override_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| default_timeout(request.kind));

        Ok(JobDescriptor {
            interpreter,
            script,
            args,
            working_dir,
            timeout,
        })
    }

    /// Kind-specific target validation
    fn validate_target(&self, kind: AnalysisKind, target: &Path) -> AnalysisResult<()> {
        match kind {
            AnalysisKind::Project => {
                if !target.is_dir() {
                    return Err(AnalysisError::invalid_request(format!(
                        "Project target must be a directory: {}",
                        target.display()
                    )));
                }
                if !has_source_files(target) {
                    return Err(AnalysisError::invalid_request(format!(
                        "Directory contains no .{} source files: {}",
                        SOURCE_EXTENSION,
                        target.display()
                    )));
                }
            }
            AnalysisKind::File => {
                if !target.is_file() {
                    return Err(AnalysisError::invalid_request(format!(
                        "File target must be a regular file: {}",
                        target.display()
                    )));
                }
                let extension = target.extension().and_then(|e| e.to_str());
                if extension != Some(SOURCE_EXTENSION) {
                    return Err(AnalysisError::invalid_request(format!(
                        "File target must have the .{} extension: {}",
                        SOURCE_EXTENSION,
                        target.display()
                    )));
                }
            }
            AnalysisKind::GitAnalytics => {
                if !target.join(".git").is_dir() {
                    return Err(AnalysisError::invalid_request(format!(
                        "Target is not a git repository (no .git directory): {}",
                        target.display()
                    )));
                }
            }
            AnalysisKind::Schema => {
                if !target.is_dir() {
                    return Err(AnalysisError::invalid_request(format!(
                        "Schema target must be a directory: {}",
                        target.display()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Recursively check for at least one source file, skipping dependency caches
fn has_source_files(dir: &Path) -> bool {
    let walker = WalkBuilder::new(dir)
        .standard_filters(false)
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !EXCLUDED_DIRS.iter().any(|excluded| name == *excluded)
        })
        .build();

    for entry in walker.flatten() {
        if entry.file_type().is_some_and(|t| t.is_file())
            && entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == SOURCE_EXTENSION)
        {
            return true;
        }
    }
    false
}
