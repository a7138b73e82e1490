// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Subprocess execution for the `eos` and `xrdcopy` binaries
//!
//! [`CommandRunner`] is the seam between the CLI backend and the operating
//! system so that the backend can be driven by scripted output in tests.

use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use crate::domain::backend::EosError;

/// Marker EOS prints when the role lacks a privilege, whatever the exit code
const NOT_PERMITTED: &str = "Operation not permitted";

/// A fully specified process invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for CommandInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `-1` when the process was killed by a signal
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion. A non-zero exit is not an error at this level.
    async fn run(&self, invocation: &CommandInvocation) -> Result<CommandOutput, EosError>;
}

/// Runs processes with tokio, bounded by a timeout
///
/// Children are killed if the returned future is dropped, so cancelling a
/// request never leaves an `eos` process behind.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, invocation: &CommandInvocation) -> Result<CommandOutput, EosError> {
        let mut cmd = tokio::process::Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }

        let start_time = std::time::Instant::now();
        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => {
                let result = CommandOutput {
                    exit_code: output.status.code().unwrap_or(-1),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };
                tracing::debug!(
                    command = %invocation,
                    exit_code = result.exit_code,
                    duration_ms = start_time.elapsed().as_millis() as u64,
                    "command finished"
                );
                Ok(result)
            }
            Ok(Err(e)) => Err(EosError::Transport(format!(
                "failed to execute {}: {}",
                invocation.program, e
            ))),
            Err(_) => {
                tracing::warn!(command = %invocation, timeout_secs = self.timeout.as_secs(), "command timed out");
                Err(EosError::Timeout)
            }
        }
    }
}

/// Map an `eos`/`xrdcopy` result onto the error taxonomy
pub fn check_exit(output: &CommandOutput) -> Result<(), EosError> {
    let stderr = output.stderr.trim();
    if stderr.contains(NOT_PERMITTED) {
        return Err(EosError::PermissionDenied(stderr.to_string()));
    }
    if output.exit_code == 0 {
        return Ok(());
    }
    let msg = if stderr.is_empty() {
        format!("exit code {}", output.exit_code)
    } else {
        stderr.to_string()
    };
    Err(EosError::from_errno(output.exit_code as i64, msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_builder() {
        let inv = CommandInvocation::new("/usr/bin/eos")
            .env("EOS_MGM_URL", "root://mgm")
            .args(["file", "info"])
            .arg("/eos/x");
        assert_eq!(inv.to_string(), "/usr/bin/eos file info /eos/x");
        assert_eq!(inv.env_value("EOS_MGM_URL"), Some("root://mgm"));
    }

    #[test]
    fn test_check_exit_mapping() {
        assert!(check_exit(&CommandOutput::success("")).is_ok());
        assert!(matches!(
            check_exit(&CommandOutput::failure(2, "No such file or directory")),
            Err(EosError::NotFound(_))
        ));
        assert!(matches!(
            check_exit(&CommandOutput::failure(22, "")),
            Err(EosError::PermissionDenied(_))
        ));
        assert!(matches!(
            check_exit(&CommandOutput::failure(17, "exists")),
            Err(EosError::AlreadyExists(_))
        ));
        assert!(matches!(
            check_exit(&CommandOutput::failure(61, "no attr")),
            Err(EosError::NotFound(_))
        ));
        assert!(matches!(
            check_exit(&CommandOutput::failure(255, "error: Operation not permitted")),
            Err(EosError::PermissionDenied(_))
        ));
        assert_eq!(
            check_exit(&CommandOutput::failure(5, "")),
            Err(EosError::Internal("exit code 5".to_string()))
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tokio_runner_captures_output() {
        let runner = TokioCommandRunner::new(Duration::from_secs(10));
        let inv = CommandInvocation::new("sh")
            .args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = runner.run(&inv).await.unwrap();
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tokio_runner_timeout() {
        let runner = TokioCommandRunner::new(Duration::from_millis(100));
        let inv = CommandInvocation::new("sleep").arg("5");
        assert_eq!(runner.run(&inv).await, Err(EosError::Timeout));
    }

    #[tokio::test]
    async fn test_tokio_runner_missing_binary() {
        let runner = TokioCommandRunner::new(Duration::from_secs(1));
        let inv = CommandInvocation::new("/nonexistent/eos-binary");
        assert!(matches!(runner.run(&inv).await, Err(EosError::Transport(_))));
    }
}
