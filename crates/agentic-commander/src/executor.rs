//! Deadline-bounded shell command execution.

use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::process;
use crate::types::{
    format_duration, CommanderError, CommanderResult, ExecutionRequest, ExecutionResult,
    ExecutorConfig, ShellConfig, INFRA_FAILURE_EXIT_CODE,
};

/// Runs command strings through the configured shell.
///
/// Holds only immutable configuration, so one executor is shared by every
/// concurrent caller.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    config: ExecutorConfig,
}

impl CommandExecutor {
    pub fn new(config: ExecutorConfig) -> CommanderResult<Self> {
        if config.shell.program.trim().is_empty() {
            return Err(CommanderError::InvalidShell(
                "shell program must not be empty".to_string(),
            ));
        }
        if config.default_timeout.is_zero() {
            return Err(CommanderError::InvalidTimeout(
                "default timeout must be greater than zero".to_string(),
            ));
        }
        if config.max_timeout < config.default_timeout {
            return Err(CommanderError::InvalidTimeout(format!(
                "maximum timeout {} is shorter than default timeout {}",
                format_duration(config.max_timeout),
                format_duration(config.default_timeout)
            )));
        }
        Ok(Self { config })
    }

    pub fn shell(&self) -> &ShellConfig {
        &self.config.shell
    }

    pub fn default_timeout(&self) -> Duration {
        self.config.default_timeout
    }

    pub fn max_timeout(&self) -> Duration {
        self.config.max_timeout
    }

    /// Caller deadline clamped to the maximum; absent or zero means the default.
    pub fn effective_timeout(&self, requested: Option<Duration>) -> Duration {
        match requested {
            Some(timeout) if !timeout.is_zero() => timeout.min(self.config.max_timeout),
            _ => self.config.default_timeout,
        }
    }

    /// Run one command to completion or deadline. Never fails outward.
    pub async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        let start = Instant::now();
        let timeout = self.effective_timeout(request.timeout);

        if let Some(dir) = &request.working_directory {
            match tokio::fs::metadata(dir).await {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => {
                    return ExecutionResult::failed(
                        format!("working directory is not a directory: {}", dir.display()),
                        start.elapsed(),
                    );
                }
                Err(_) => {
                    return ExecutionResult::failed(
                        format!("working directory does not exist: {}", dir.display()),
                        start.elapsed(),
                    );
                }
            }
        }

        let mut command = Command::new(&self.config.shell.program);
        command
            .arg(&self.config.shell.flag)
            .arg(&request.command)
            .envs(&request.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &request.working_directory {
            command.current_dir(dir);
        }
        process::isolate(&mut command);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return ExecutionResult::failed(e.to_string(), start.elapsed()),
        };
        let pid = child.id();

        let mut stdout = OutputPipe::spawn(child.stdout.take());
        let mut stderr = OutputPipe::spawn(child.stderr.take());
        let deadline = tokio::time::Instant::from_std(start) + timeout;
        let timed_out = || format!("command timed out after {}", format_duration(timeout));

        let (mut exit_code, mut error) =
            match tokio::time::timeout_at(deadline, child.wait()).await {
                Ok(Ok(status)) => (status.code().unwrap_or(INFRA_FAILURE_EXIT_CODE), None),
                Ok(Err(e)) => {
                    process::terminate_tree(&mut child, pid).await;
                    (INFRA_FAILURE_EXIT_CODE, Some(e.to_string()))
                }
                Err(_) => {
                    process::terminate_tree(&mut child, pid).await;
                    (INFRA_FAILURE_EXIT_CODE, Some(timed_out()))
                }
            };

        // A descendant may still hold the pipes open after the shell exits,
        // possibly from outside the process group. Draining shares the deadline
        // and the readers are abandoned once it passes.
        let drained = tokio::time::timeout_at(deadline, async {
            stdout.finished().await;
            stderr.finished().await;
        })
        .await;
        if drained.is_err() {
            process::terminate_tree(&mut child, pid).await;
            stdout.abort();
            stderr.abort();
            exit_code = INFRA_FAILURE_EXIT_CODE;
            error.get_or_insert_with(timed_out);
        }

        let stdout = stdout.into_string();
        let stderr = stderr.into_string();

        ExecutionResult {
            stdout,
            stderr,
            exit_code,
            duration: start.elapsed(),
            error,
        }
    }
}

/// One captured output stream. The reader task appends as bytes arrive, so
/// whatever was read before an abort is kept.
struct OutputPipe {
    buf: Arc<Mutex<Vec<u8>>>,
    reader: Option<JoinHandle<()>>,
}

impl OutputPipe {
    fn spawn<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let reader = pipe.map(|mut pipe| {
            let buf = buf.clone();
            tokio::spawn(async move {
                let mut chunk = [0u8; 8192];
                loop {
                    match pipe.read(&mut chunk).await {
                        Ok(0) => break,
                        Ok(n) => {
                            let mut buf = buf.lock().unwrap_or_else(PoisonError::into_inner);
                            buf.extend_from_slice(&chunk[..n]);
                        }
                        Err(e) => {
                            tracing::debug!("output pipe read ended early: {e}");
                            break;
                        }
                    }
                }
            })
        });
        Self { buf, reader }
    }

    /// Wait for EOF on the pipe.
    async fn finished(&mut self) {
        if let Some(reader) = &mut self.reader {
            if let Err(e) = reader.await {
                tracing::warn!("output reader task failed: {e}");
            }
            self.reader = None;
        }
    }

    /// Stop reading; the pipe closes when the task is dropped.
    fn abort(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }

    fn into_string(self) -> String {
        let bytes = std::mem::take(&mut *self.buf.lock().unwrap_or_else(PoisonError::into_inner));
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
