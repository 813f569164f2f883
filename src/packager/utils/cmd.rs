//! External command execution.
//!
//! Commands run through `sh -c` so build steps can be written as plain
//! command lines. Stdout and stderr are captured into one combined output.
//! The caller is blocked until the process exits or the optional timeout
//! elapses.

use crate::packager::error::{Error, Result};
use std::{
    collections::HashMap,
    fmt,
    path::Path,
    process::Stdio,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
};

/// Exit status and captured output of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    content: String,
}

impl CommandResult {
    pub fn new(code: Option<i32>, content: impl Into<String>) -> Self {
        Self {
            code,
            content: content.into(),
        }
    }

    /// Captured output with line breaks removed.
    pub fn output(&self) -> String {
        self.content.replace('\n', "")
    }

    /// Captured output exactly as produced.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "CommandResult with returncode: {code}"),
            None => write!(f, "CommandResult terminated by signal"),
        }
    }
}

/// Runs shell command lines with an optional timeout.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    timeout: Option<Duration>,
}

impl CommandRunner {
    /// Creates a runner. `None` waits for commands indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Runs `command` in `cwd` (or the current directory) with `env` as the
    /// complete environment when given, the inherited one otherwise.
    ///
    /// # Errors
    ///
    /// * [`Error::CommandSpawn`] - the shell could not be started
    /// * [`Error::CommandTimeout`] - the timeout elapsed, the child was killed
    /// * [`Error::CommandFailed`] - non-zero exit, carries the captured result
    pub async fn run(
        &self,
        command: &str,
        cwd: Option<&Path>,
        env: Option<&HashMap<String, String>>,
    ) -> Result<CommandResult> {
        log::debug!("Running command: {}", command);

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }
        if let Some(env) = env {
            cmd.env_clear().envs(env);
        }

        let mut child = cmd.spawn().map_err(|error| Error::CommandSpawn {
            command: command.to_string(),
            error,
        })?;

        // Both pipes feed one buffer so output keeps its arrival order.
        let combined = Arc::new(Mutex::new(String::new()));
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let drain = async {
            tokio::join!(
                capture_lines(stdout, Arc::clone(&combined)),
                capture_lines(stderr, Arc::clone(&combined)),
            );
            child.wait().await
        };

        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, drain).await.ok(),
            None => Some(drain.await),
        };

        let Some(status) = waited else {
            let seconds = self.timeout.map(|t| t.as_secs()).unwrap_or_default();
            log::warn!("Command timed out after {}s, terminating: {}", seconds, command);
            if let Err(e) = child.kill().await {
                log::warn!("Failed to kill timed out command: {}", e);
            }
            return Err(Error::CommandTimeout {
                command: command.to_string(),
                seconds,
            });
        };

        let status = status.map_err(|error| Error::CommandSpawn {
            command: command.to_string(),
            error,
        })?;

        let content = combined
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default();
        let result = CommandResult::new(status.code(), content);

        if !result.success() {
            return Err(Error::CommandFailed {
                command: command.to_string(),
                result,
            });
        }

        Ok(result)
    }
}

async fn capture_lines<R>(stream: Option<R>, sink: Arc<Mutex<String>>)
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return;
    };
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if let Ok(mut buf) = sink.lock() {
                    buf.push_str(&String::from_utf8_lossy(&line));
                    if !line.ends_with(b"\n") {
                        buf.push('\n');
                    }
                }
            }
        }
    }
}
