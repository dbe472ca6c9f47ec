//! Process Supervision
//!
//! Owns the lifecycle of at most one running analysis process: launch,
//! stream consumption, progress-line forwarding, timeout enforcement,
//! cancellation, and termination bookkeeping. The single job slot is guarded
//! by a mutex; a second run while the slot is occupied fails fast instead of
//! touching shared state.

use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::models::analysis::JobDescriptor;
use crate::utils::error::{spawn_error, AnalysisError, AnalysisResult, ProcessErrorCategory};

/// Raw harvest of one completed job, before output validation
#[derive(Debug, Clone)]
pub struct RawJobOutput {
    /// Accumulated stdout, newline-joined in emission order
    pub stdout: String,
    /// Accumulated stderr, newline-joined in emission order
    pub stderr: String,
    /// Exit code of the process (0, or 1 for a soft success)
    pub exit_code: i32,
    /// Wall-clock duration of the run
    pub duration: Duration,
}

/// Lifecycle states of the job slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobState {
    Idle,
    Launching,
    Running,
    Completed,
    TimedOut,
    Killed,
    Errored,
}

struct Slot {
    state: JobState,
    /// Kill signal for the job currently occupying the slot
    kill: Option<CancellationToken>,
}

/// One line read from the child, tagged by stream
enum StreamLine {
    Out(String),
    Err(String),
}

/// Supervises the single analysis process slot
pub struct ProcessSupervisor {
    slot: Arc<Mutex<Slot>>,
}

impl ProcessSupervisor {
    /// Create a supervisor with an idle slot
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                state: JobState::Idle,
                kill: None,
            })),
        }
    }

    /// Whether a job currently occupies the slot
    pub fn is_busy(&self) -> bool {
        self.slot.lock().unwrap().state != JobState::Idle
    }

    /// Request termination of the current job, if any. Idempotent and safe
    /// to call when the slot is idle.
    pub fn cancel_current(&self) {
        let slot = self.slot.lock().unwrap();
        if let Some(token) = &slot.kill {
            token.cancel();
        }
    }

    /// Tear down any live process. Used on host shutdown; idempotent.
    pub fn dispose(&self) {
        if self.is_busy() {
            debug!("disposing supervisor with a live analysis process");
        }
        self.cancel_current();
    }

    /// Run one job to a deterministic conclusion.
    ///
    /// Every stdout line is appended to the output buffer and passed to
    /// `on_line` for progress matching; stderr is buffered separately and
    /// never drives progress. Per-stream ordering is preserved; no ordering
    /// is guaranteed between the two streams.
    ///
    /// Exit-code policy: 0 succeeds; 1 with non-empty stdout is a soft
    /// success (the toolchain reports recoverable problems via exit 1 while
    /// still emitting a full report); anything else is a process error
    /// carrying the buffered stderr.
    pub async fn run(
        &self,
        descriptor: &JobDescriptor,
        mut on_line: impl FnMut(&str),
        cancel: &CancellationToken,
    ) -> AnalysisResult<RawJobOutput> {
        let kill = self.claim_slot()?;
        let _guard = SlotGuard {
            slot: Arc::clone(&self.slot),
        };

        let interpreter = descriptor.interpreter.display().to_string();
        let mut cmd = Command::new(&descriptor.interpreter);
        cmd.args(&descriptor.args)
            .current_dir(&descriptor.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|e| {
            warn!(interpreter = %interpreter, error = %e, "failed to spawn analysis process");
            spawn_error(&e, &interpreter)
        })?;

        self.set_state(JobState::Running);
        debug!(
            pid = ?child.id(),
            script = %descriptor.script.display(),
            timeout_ms = descriptor.timeout.as_millis() as u64,
            "analysis process spawned"
        );

        let (tx, mut rx) = mpsc::channel::<StreamLine>(256);
        if let Some(stdout) = child.stdout.take() {
            spawn_line_pump(stdout, tx.clone(), StreamLine::Out);
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_pump(stderr, tx.clone(), StreamLine::Err);
        }
        drop(tx);

        let mut stdout_buf = String::new();
        let mut stderr_buf = String::new();
        let deadline = tokio::time::sleep(descriptor.timeout);
        tokio::pin!(deadline);

        // Consume both streams until the pumps close (pipes at EOF).
        loop {
            tokio::select! {
                line = rx.recv() => match line {
                    Some(StreamLine::Out(line)) => {
                        on_line(&line);
                        stdout_buf.push_str(&line);
                        stdout_buf.push('\n');
                    }
                    Some(StreamLine::Err(line)) => {
                        stderr_buf.push_str(&line);
                        stderr_buf.push('\n');
                    }
                    None => break,
                },
                _ = &mut deadline => {
                    return Err(self.terminate(&mut child, JobState::TimedOut, descriptor).await);
                }
                _ = cancel.cancelled() => {
                    return Err(self.terminate(&mut child, JobState::Killed, descriptor).await);
                }
                _ = kill.cancelled() => {
                    return Err(self.terminate(&mut child, JobState::Killed, descriptor).await);
                }
            }
        }

        // Streams are closed; wait for exit, still honoring timeout and
        // cancellation in case the process lingers after closing its pipes.
        let status = tokio::select! {
            status = child.wait() => status.map_err(|e| {
                self.set_state(JobState::Errored);
                AnalysisError::process(
                    ProcessErrorCategory::Unknown,
                    format!("Failed to wait for analysis process: {}", e),
                )
            })?,
            _ = &mut deadline => {
                return Err(self.terminate(&mut child, JobState::TimedOut, descriptor).await);
            }
            _ = cancel.cancelled() => {
                return Err(self.terminate(&mut child, JobState::Killed, descriptor).await);
            }
            _ = kill.cancelled() => {
                return Err(self.terminate(&mut child, JobState::Killed, descriptor).await);
            }
        };

        let duration = started.elapsed();
        match status.code() {
            Some(0) => {
                self.set_state(JobState::Completed);
                debug!(duration_ms = duration.as_millis() as u64, "analysis process completed");
                Ok(RawJobOutput {
                    stdout: stdout_buf,
                    stderr: stderr_buf,
                    exit_code: 0,
                    duration,
                })
            }
            Some(1) if !stdout_buf.trim().is_empty() => {
                // Toolchain convention: exit 1 with a report on stdout means
                // recoverable problems were found, not a failed run.
                self.set_state(JobState::Completed);
                debug!("analysis process exited 1 with output, treating as soft success");
                Ok(RawJobOutput {
                    stdout: stdout_buf,
                    stderr: stderr_buf,
                    exit_code: 1,
                    duration,
                })
            }
            Some(code) => {
                self.set_state(JobState::Errored);
                warn!(exit_code = code, "analysis process failed");
                Err(AnalysisError::process(
                    ProcessErrorCategory::Unknown,
                    format!(
                        "Analysis process exited with code {}: {}",
                        code,
                        tail(&stderr_buf, 2000)
                    ),
                ))
            }
            None => {
                self.set_state(JobState::Errored);
                Err(AnalysisError::process(
                    ProcessErrorCategory::Unknown,
                    "Analysis process was terminated by a signal".to_string(),
                ))
            }
        }
    }

    /// Claim the idle slot, registering a fresh kill token for this job
    fn claim_slot(&self) -> AnalysisResult<CancellationToken> {
        let mut slot = self.slot.lock().unwrap();
        if slot.state != JobState::Idle {
            return Err(AnalysisError::process(
                ProcessErrorCategory::Unknown,
                "An analysis job is already running".to_string(),
            ));
        }
        slot.state = JobState::Launching;
        let token = CancellationToken::new();
        slot.kill = Some(token.clone());
        Ok(token)
    }

    fn set_state(&self, state: JobState) {
        self.slot.lock().unwrap().state = state;
    }

    /// Kill the child and record the terminal state. The kill both signals
    /// and reaps, so no process outlives this call.
    async fn terminate(
        &self,
        child: &mut Child,
        state: JobState,
        descriptor: &JobDescriptor,
    ) -> AnalysisError {
        let _ = child.kill().await;
        self.set_state(state);
        match state {
            JobState::TimedOut => {
                let limit_ms = descriptor.timeout.as_millis() as u64;
                warn!(limit_ms, script = %descriptor.script.display(), "analysis process timed out");
                AnalysisError::Timeout { limit_ms }
            }
            _ => {
                debug!(script = %descriptor.script.display(), "analysis process cancelled");
                AnalysisError::Cancelled
            }
        }
    }
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the slot to idle when a run concludes, however it concludes
struct SlotGuard {
    slot: Arc<Mutex<Slot>>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap();
        slot.state = JobState::Idle;
        slot.kill = None;
    }
}

/// Forward lines from a child stream into the shared channel
fn spawn_line_pump<R>(reader: R, tx: mpsc::Sender<StreamLine>, wrap: fn(String) -> StreamLine)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(wrap(line)).await.is_err() {
                break;
            }
        }
    });
}

/// Last `max` bytes of a buffer, on a char boundary
fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}
