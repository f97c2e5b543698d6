use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::error::{HelmPilotError, Result};
use crate::helm::invocation::HelmInvocation;

/// Captured result of running helm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, absent when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    fn status_description(&self) -> String {
        match self.code {
            Some(code) => format!("exit status: {}", code),
            None => "termination by signal".to_string(),
        }
    }
}

/// Runs helm invocations.
pub trait HelmExecutor {
    /// Run the invocation and capture its output, whatever the exit status.
    fn run(&self, invocation: &HelmInvocation) -> Result<CommandOutput>;

    /// Human-readable command line for logs and errors.
    fn describe(&self, invocation: &HelmInvocation) -> String {
        format!("helm {}", invocation)
    }

    /// Run the invocation, turning a non-zero exit into an execution error.
    fn execute(&self, invocation: &HelmInvocation) -> Result<CommandOutput> {
        let output = self.run(invocation)?;
        if output.is_success() {
            Ok(output)
        } else {
            Err(HelmPilotError::Execution {
                command: self.describe(invocation),
                status: output.status_description(),
                stdout: output.stdout,
                stderr: output.stderr,
            })
        }
    }
}

/// Executes helm as a child process.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    executable: PathBuf,
}

impl ProcessExecutor {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new("helm")
    }
}

impl HelmExecutor for ProcessExecutor {
    fn run(&self, invocation: &HelmInvocation) -> Result<CommandOutput> {
        debug!("Running {}", self.describe(invocation));
        let mut command = Command::new(&self.executable);
        command.args(invocation.to_args());
        let output = match invocation.stdin_data() {
            None => command.output()?,
            Some(input) => {
                let mut child = command
                    .stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .spawn()?;
                if let Some(mut stdin) = child.stdin.take() {
                    stdin.write_all(input.as_bytes())?;
                }
                child.wait_with_output()?
            }
        };

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn describe(&self, invocation: &HelmInvocation) -> String {
        format!("{} {}", self.executable.display(), invocation)
    }
}
