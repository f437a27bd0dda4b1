//! Shell command execution for setup and finalize commands
//!
//! Commands are opaque strings handed to the shell. The runner never parses
//! them and only reports whether the shell exited successfully.

use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Default shell used to interpret commands
pub const DEFAULT_SHELL: &str = "sh";

/// Result of one command invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub code: Option<i32>,
    /// stdout and stderr in emission order, empty unless capture was requested
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code for error reporting (-1 for signals)
    pub fn code_or_signal(&self) -> i32 {
        self.code.unwrap_or(-1)
    }
}

/// Executes commands on behalf of the cache orchestrator
pub trait CommandRunner {
    /// Run `command` from `working_dir`
    fn run(&self, working_dir: &Path, command: &str) -> CommandOutput;
}

/// Build the single shell string `cd <dir>; <command>`
pub fn command_string(working_dir: &Path, command: &str) -> String {
    format!("cd {}; {}", shell_quote(&working_dir.to_string_lossy()), command)
}

/// Single-quote a string for POSIX shells
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Runs commands through `<shell> -c`
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
    capture: bool,
}

impl ShellRunner {
    /// Create a runner; `capture` pipes and collects command output
    pub fn new(shell: impl Into<String>, capture: bool) -> Self {
        Self {
            shell: shell.into(),
            capture,
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL, false)
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, working_dir: &Path, command: &str) -> CommandOutput {
        let script = command_string(working_dir, command);
        debug!("Execute: {}", script);

        // One pipe for both streams keeps their interleaving intact
        let script = if self.capture {
            format!("exec 2>&1; {}", script)
        } else {
            script
        };

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(&script).stdin(Stdio::null());

        if self.capture {
            match cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).output() {
                Ok(output) => {
                    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                    combined.push_str(&String::from_utf8_lossy(&output.stderr));
                    CommandOutput {
                        code: output.status.code(),
                        output: combined,
                    }
                }
                Err(e) => {
                    warn!("Failed to spawn {}: {}", self.shell, e);
                    CommandOutput::default()
                }
            }
        } else {
            match cmd.stdout(Stdio::null()).stderr(Stdio::null()).status() {
                Ok(status) => CommandOutput {
                    code: status.code(),
                    output: String::new(),
                },
                Err(e) => {
                    warn!("Failed to spawn {}: {}", self.shell, e);
                    CommandOutput::default()
                }
            }
        }
    }
}
