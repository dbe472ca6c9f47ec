//! Interpreter Resolution
//!
//! Locates and validates a Python executable capable of running the analysis
//! toolchain. Resolution order: per-request override, host-provided discovery
//! integration, then a fixed list of common executable names. A candidate is
//! accepted only if it answers a `--version` probe with exit status 0 within
//! the validation timeout.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::utils::error::{AnalysisError, AnalysisResult};

/// Executable names probed when no override or discovery answer is usable
pub const DEFAULT_CANDIDATES: &[&str] = &["python3", "python", "py"];

/// Hard ceiling on a single validation probe
pub const VALIDATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Optional host-provided interpreter discovery integration.
///
/// Hosts that embed an interpreter picker (or track a per-project environment)
/// implement this with one method; absence of the capability is a normal code
/// path, not an error.
#[async_trait]
pub trait InterpreterDiscovery: Send + Sync {
    /// Return the host's preferred interpreter, if it knows one
    async fn discover(&self) -> Option<PathBuf>;
}

/// Resolves a usable interpreter for toolchain invocations
pub struct InterpreterResolver {
    candidates: Vec<String>,
    validation_timeout: Duration,
    discovery: Option<Arc<dyn InterpreterDiscovery>>,
}

impl InterpreterResolver {
    /// Create a resolver with the default candidate list
    pub fn new() -> Self {
        Self {
            candidates: DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            validation_timeout: VALIDATION_TIMEOUT,
            discovery: None,
        }
    }

    /// Replace the candidate list
    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Override the validation timeout
    pub fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = timeout;
        self
    }

    /// Attach a host discovery integration
    pub fn with_discovery(mut self, discovery: Arc<dyn InterpreterDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// Resolve an interpreter, first success wins.
    ///
    /// Tries the supplied override, then the discovery integration, then the
    /// fixed candidate list. Fails with `InterpreterNotFound` only after every
    /// candidate has been tried.
    pub async fn resolve(&self, preferred: Option<&Path>) -> AnalysisResult<PathBuf> {
        let mut tried: Vec<String> = Vec::new();

        if let Some(path) = preferred {
            if self.validate(path).await {
                debug!(interpreter = %path.display(), "using interpreter override");
                return Ok(path.to_path_buf());
            }
            warn!(interpreter = %path.display(), "interpreter override failed validation");
            tried.push(path.display().to_string());
        }

        if let Some(discovery) = &self.discovery {
            if let Some(path) = discovery.discover().await {
                if self.validate(&path).await {
                    debug!(interpreter = %path.display(), "using discovered interpreter");
                    return Ok(path);
                }
                warn!(interpreter = %path.display(), "discovered interpreter failed validation");
                tried.push(path.display().to_string());
            }
        }

        for candidate in &self.candidates {
            let path = Path::new(candidate);
            if self.validate(path).await {
                debug!(interpreter = %candidate, "using interpreter from candidate list");
                return Ok(PathBuf::from(candidate));
            }
            tried.push(candidate.clone());
        }

        Err(AnalysisError::interpreter_not_found(format!(
            "No usable Python interpreter found and no fallback remains (tried: {}). \
             Install Python 3 or configure an interpreter path in settings.",
            tried.join(", ")
        )))
    }

    /// Validate a candidate by spawning it with a version probe.
    /// Timeout and spawn failure both count as validation failure.
    async fn validate(&self, candidate: &Path) -> bool {
        let probe = Command::new(candidate)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match tokio::time::timeout(self.validation_timeout, probe).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(_)) | Err(_) => false,
        }
    }
}

impl Default for InterpreterResolver {
    fn default() -> Self {
        Self::new()
    }
}
