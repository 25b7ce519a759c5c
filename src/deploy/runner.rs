//! Out-of-process deployment runs.
//!
//! The HTTP layer does not run pipelines in its own process; it re-invokes
//! this executable's `deploy` subcommand so a crash in deployment logic
//! cannot take down the serving process. The child owns the deployment
//! attempt outright; the parent performs no config or artifact writes.
//!
//! Exit code alone is not trusted to classify the outcome: the child reports
//! a structured final stdout line (`RESULT <json>`) that the parent parses,
//! which distinguishes "tool crashed" from "deployment logically failed".

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::deploy::pipeline::DeploymentResult;
use crate::error::DeployError;
use crate::registry::Strategy;

/// Prefix of the structured result line printed by the `deploy` subcommand.
pub const RESULT_LINE_PREFIX: &str = "RESULT ";

/// How to launch one out-of-process deployment.
#[derive(Debug, Clone)]
pub struct DeployCommand {
    pub program: PathBuf,
    pub leading_args: Vec<String>,
    pub trailing_args: Vec<String>,
}

impl DeployCommand {
    /// Re-invoke the current executable's `deploy` subcommand.
    pub fn current_exe() -> Result<Self, DeployError> {
        let program =
            std::env::current_exe().map_err(|e| DeployError::Spawn(e.to_string()))?;
        Ok(Self {
            program,
            leading_args: vec!["deploy".to_string()],
            trailing_args: Vec::new(),
        })
    }

    pub fn with_trailing_args(mut self, args: Vec<String>) -> Self {
        self.trailing_args = args;
        self
    }

    pub fn args_for(&self, strategy: Strategy) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.push(strategy.as_str().to_string());
        args.extend(self.trailing_args.iter().cloned());
        args
    }
}

/// A spawned deployment process with its output streamers attached.
pub struct RunHandle {
    child: Child,
    stdout_task: JoinHandle<Option<DeploymentResult>>,
    stderr_task: JoinHandle<()>,
}

/// Terminal state of one subprocess invocation.
#[derive(Debug)]
pub struct ExitOutcome {
    /// Process exit code; `None` when killed by a signal or timed out.
    pub code: Option<i32>,
    pub timed_out: bool,
    /// The structured result reported by the child, if it got far enough to
    /// print one.
    pub result: Option<DeploymentResult>,
}

impl ExitOutcome {
    pub fn exited_cleanly(&self) -> bool {
        !self.timed_out && self.code == Some(0)
    }
}

/// Spawns deployment subprocesses, streams their output into the log as it
/// arrives, and enforces a wall-clock timeout with kill.
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }

    /// Launch the process. Failure to start at all is a `SpawnError`,
    /// distinct from any non-zero exit.
    pub fn spawn(&self, command: &DeployCommand, strategy: Strategy) -> Result<RunHandle, DeployError> {
        let args = command.args_for(strategy);
        info!(program = %command.program.display(), ?args, %strategy, "spawning deployment process");

        let mut child = Command::new(&command.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DeployError::Spawn(e.to_string()))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let stdout_task = tokio::spawn(stream_stdout(stdout, strategy));
        let stderr_task = tokio::spawn(stream_stderr(stderr, strategy));

        Ok(RunHandle {
            child,
            stdout_task,
            stderr_task,
        })
    }

    /// Wait for the process to finish, killing it once the timeout elapses.
    /// After a declared timeout the child's result is discarded so no
    /// half-reported outcome leaks to the caller.
    pub async fn wait(&self, mut handle: RunHandle) -> ExitOutcome {
        match tokio::time::timeout(self.timeout, handle.child.wait()).await {
            Ok(Ok(status)) => {
                let result = handle.stdout_task.await.ok().flatten();
                let _ = handle.stderr_task.await;
                ExitOutcome {
                    code: status.code(),
                    timed_out: false,
                    result,
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "failed to await deployment process");
                handle.stdout_task.abort();
                handle.stderr_task.abort();
                ExitOutcome {
                    code: None,
                    timed_out: false,
                    result: None,
                }
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "deployment process timed out; killing"
                );
                let _ = handle.child.start_kill();
                let _ = handle.child.wait().await;
                handle.stdout_task.abort();
                handle.stderr_task.abort();
                ExitOutcome {
                    code: None,
                    timed_out: true,
                    result: None,
                }
            }
        }
    }

    /// Spawn and wait in one call.
    pub async fn run(
        &self,
        command: &DeployCommand,
        strategy: Strategy,
    ) -> Result<ExitOutcome, DeployError> {
        let handle = self.spawn(command, strategy)?;
        Ok(self.wait(handle).await)
    }
}

async fn stream_stdout(
    stdout: Option<impl AsyncRead + Unpin>,
    strategy: Strategy,
) -> Option<DeploymentResult> {
    let stdout = stdout?;
    let mut lines = BufReader::new(stdout).lines();
    let mut result = None;

    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(payload) = line.strip_prefix(RESULT_LINE_PREFIX) {
            match serde_json::from_str::<DeploymentResult>(payload) {
                Ok(parsed) => result = Some(parsed),
                Err(e) => {
                    warn!(%strategy, error = %e, "unparseable RESULT line from deployment process")
                }
            }
        } else {
            info!(target: "deploy_worker", %strategy, "{line}");
        }
    }
    result
}

async fn stream_stderr(stderr: Option<impl AsyncRead + Unpin>, strategy: Strategy) {
    let Some(stderr) = stderr else { return };
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        warn!(target: "deploy_worker", %strategy, "{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> DeployCommand {
        DeployCommand {
            program: PathBuf::from("sh"),
            leading_args: vec!["-c".to_string(), script.to_string()],
            trailing_args: Vec::new(),
        }
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let runner = ProcessRunner::new(Duration::from_secs(5));
        let command = DeployCommand {
            program: PathBuf::from("/nonexistent/deploy-tool"),
            leading_args: Vec::new(),
            trailing_args: Vec::new(),
        };
        let err = runner
            .run(&command, Strategy::Hft)
            .await
            .expect_err("spawn should fail");
        assert!(matches!(err, DeployError::Spawn(_)));
    }

    #[tokio::test]
    async fn nonzero_exit_is_surfaced_not_a_spawn_error() {
        let runner = ProcessRunner::new(Duration::from_secs(5));
        let outcome = runner
            .run(&sh("exit 3"), Strategy::Hft)
            .await
            .expect("spawn should succeed");
        assert_eq!(outcome.code, Some(3));
        assert!(!outcome.timed_out);
        assert!(!outcome.exited_cleanly());
    }

    #[tokio::test]
    async fn result_line_is_parsed_and_other_lines_streamed() {
        let runner = ProcessRunner::new(Duration::from_secs(5));
        let script = concat!(
            "echo deploying...; ",
            "echo 'RESULT {\"runId\":\"a2f63c3f-52fa-41a8-8bb6-32012f1c9e63\",",
            "\"strategy\":\"hft\",\"address\":\"0xcccccccccccccccccccccccccccccccccccccccc\",",
            "\"verified\":false,\"completedAt\":\"2024-01-01T00:00:00Z\"}'"
        );
        let outcome = runner
            .run(&sh(script), Strategy::Hft)
            .await
            .expect("spawn should succeed");

        assert!(outcome.exited_cleanly());
        let result = outcome.result.expect("RESULT line should parse");
        assert_eq!(result.strategy, Strategy::Hft);
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn timeout_kills_the_process() {
        let runner = ProcessRunner::new(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let outcome = runner
            .run(&sh("sleep 30"), Strategy::Hft)
            .await
            .expect("spawn should succeed");

        assert!(outcome.timed_out);
        assert_eq!(outcome.code, None);
        assert!(outcome.result.is_none());
        // Killed promptly rather than waiting out the sleep.
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
