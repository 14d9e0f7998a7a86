//! External command execution

use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished child process.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Process exit code; -1 when the process died without one (signal)
    pub exit_code: i32,
    /// Captured standard output, lossily decoded as UTF-8
    pub stdout: String,
    /// Captured standard error, lossily decoded as UTF-8
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the process exited with code 0
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes an external command and captures its output.
///
/// Implementations never treat a non-zero exit as an error; failure
/// interpretation belongs to the caller. The `Err` case is reserved for
/// spawn failures (missing binary, fork errors).
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` with `args`, waiting for it to exit.
    async fn run(&self, command: &str, args: &[&str]) -> io::Result<CommandOutput>;
}

/// Runs commands on the host system.
///
/// Spawns exactly one child process per call; no retries and no
/// timeout. Callers needing bounded execution time must wrap it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &str, args: &[&str]) -> io::Result<CommandOutput> {
        // Arguments regularly carry keychain passwords; log only the
        // command and its subcommand.
        debug!(
            command,
            subcommand = args.first().copied().unwrap_or(""),
            "running external command"
        );

        let output = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let runner = SystemRunner;
        let output = runner.run("echo", &["hello"]).await.unwrap();

        assert_eq!(output.exit_code, 0);
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
        assert!(output.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_not_an_error() {
        let runner = SystemRunner;
        let output = runner.run("false", &[]).await.unwrap();

        assert_eq!(output.exit_code, 1);
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let runner = SystemRunner;
        let result = runner.run("gantry-no-such-binary", &[]).await;

        assert!(result.is_err());
    }
}
