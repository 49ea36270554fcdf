//! Command executor for notify commands
//!
//! After a destination changes, its configured notify command runs through
//! the system shell, typically to reload the service reading the file.

use std::process::{Command, Stdio};

use crate::core::error::{Error, Result};

/// Trait for executing shell commands
pub trait CommandExecutor: Send + Sync {
    /// Execute a shell command and wait for it to finish
    fn execute(&self, command: &str) -> Result<CommandResult>;
}

/// Result of command execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    /// Check if the command was successful
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Default command executor using `sh -c`
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellCommandExecutor;

impl ShellCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for ShellCommandExecutor {
    fn execute(&self, command: &str) -> Result<CommandResult> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::Notify {
                command: command.to_string(),
                message: format!("unable to start: {e}"),
            })?;

        Ok(CommandResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Mock command executor for testing
#[cfg(test)]
#[derive(Default)]
pub struct MockCommandExecutor {
    pub results: std::collections::HashMap<String, CommandResult>,
    pub calls: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(mut self, command: &str, exit_code: i32, stdout: &str, stderr: &str) -> Self {
        self.results.insert(
            command.to_string(),
            CommandResult {
                exit_code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        );
        self
    }

    /// Commands executed so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
impl CommandExecutor for MockCommandExecutor {
    fn execute(&self, command: &str) -> Result<CommandResult> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command.to_string());
        }
        self.results.get(command).cloned().ok_or_else(|| Error::Notify {
            command: command.to_string(),
            message: "mock executor has no result for command".to_string(),
        })
    }
}
