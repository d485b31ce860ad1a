//! External command execution and the `ord` wallet invocations.
//!
//! Commands run from an argument vector, never through a shell, so request
//! fields cannot be interpreted as shell syntax.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::queue::FeeRate;

/// Errors that can occur when running an external command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The process could not be started.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited unsuccessfully.
    #[error("`{command}` exited with {}: {stderr}", exit_label(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandInvocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
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
}

impl fmt::Display for CommandInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured output of a successful command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs commands to completion, buffering their output.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner;

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `invocation` and wait for it to exit.
    ///
    /// Any non-zero exit status is a [`CommandError::Failed`].
    pub async fn run(&self, invocation: &CommandInvocation) -> Result<CommandOutput, CommandError> {
        let command = invocation.to_string();
        info!(command = %command, "command_starting");

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        debug!(command = %command, stdout = %stdout, stderr = %stderr, "command_output");

        if !output.status.success() {
            return Err(CommandError::Failed {
                command,
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        info!(command = %command, stdout_length = stdout.len(), "command_complete");

        Ok(CommandOutput { stdout, stderr })
    }
}

/// Builds `ord` invocations bound to a single named wallet.
#[derive(Debug, Clone)]
pub struct WalletCli {
    ord_bin: PathBuf,
    global_args: Vec<String>,
    wallet: String,
}

impl WalletCli {
    /// `global_args` go before `--wallet`, e.g. `["--chain", "signet"]`.
    pub fn new(ord_bin: impl Into<PathBuf>, global_args: Vec<String>, wallet: impl Into<String>) -> Self {
        Self {
            ord_bin: ord_bin.into(),
            global_args,
            wallet: wallet.into(),
        }
    }

    pub fn wallet(&self) -> &str {
        &self.wallet
    }

    fn base(&self) -> CommandInvocation {
        CommandInvocation::new(&self.ord_bin)
            .args(self.global_args.iter().cloned())
            .arg("--wallet")
            .arg(&self.wallet)
            .arg("wallet")
    }

    /// `ord --wallet <name> wallet inscribe --fee-rate <fee> <file>`
    pub fn inscribe(&self, file: &Path, fee_rate: FeeRate) -> CommandInvocation {
        self.base()
            .arg("inscribe")
            .arg("--fee-rate")
            .arg(fee_rate.to_string())
            .arg(file.to_string_lossy())
    }

    /// `ord --wallet <name> wallet send --fee-rate <fee> <address>`
    pub fn send(&self, address: &str, fee_rate: FeeRate) -> CommandInvocation {
        self.base()
            .arg("send")
            .arg("--fee-rate")
            .arg(fee_rate.to_string())
            .arg(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fee(value: f64) -> FeeRate {
        FeeRate::new(value).unwrap()
    }

    #[test]
    fn test_inscribe_invocation() {
        let cli = WalletCli::new("/home/ord/bin/ord", vec![], "ilyaFriends");
        let inv = cli.inscribe(Path::new("./image-folder/abc.png"), fee(10.0));

        assert_eq!(inv.program, PathBuf::from("/home/ord/bin/ord"));
        assert_eq!(
            inv.args,
            vec![
                "--wallet",
                "ilyaFriends",
                "wallet",
                "inscribe",
                "--fee-rate",
                "10",
                "./image-folder/abc.png"
            ]
        );
    }

    #[test]
    fn test_send_invocation_with_global_args() {
        let cli = WalletCli::new("ord", vec!["--chain".into(), "signet".into()], "hot");
        let inv = cli.send("bc1qexample", fee(2.5));

        assert_eq!(
            inv.to_string(),
            "ord --chain signet --wallet hot wallet send --fee-rate 2.5 bc1qexample"
        );
    }

    #[test]
    fn test_address_is_a_single_argument() {
        let cli = WalletCli::new("ord", vec![], "w");
        let inv = cli.send("bc1q; rm -rf /", fee(1.0));
        assert_eq!(inv.args.last().map(String::as_str), Some("bc1q; rm -rf /"));
    }

    #[tokio::test]
    async fn test_run_captures_output() {
        let inv = CommandInvocation::new("sh").args(["-c", "echo out; echo err >&2"]);
        let output = CommandRunner::new().run(&inv).await.unwrap();
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[tokio::test]
    async fn test_run_nonzero_exit() {
        let inv = CommandInvocation::new("sh").args(["-c", "echo broke >&2; exit 3"]);
        let err = CommandRunner::new().run(&inv).await.unwrap_err();
        match err {
            CommandError::Failed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "broke");
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let inv = CommandInvocation::new("/nonexistent/ord-webhook-test-binary");
        let err = CommandRunner::new().run(&inv).await.unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[test]
    fn test_exit_label() {
        assert_eq!(exit_label(&Some(1)), "code 1");
        assert_eq!(exit_label(&None), "a signal");
    }
}
