//! Process execution capability
//!
//! Every external tool invocation goes through [`CommandRunner`], so tests
//! can substitute [`crate::fakes::ScriptedRunner`] instead of real binaries.
//! Commands block until the child exits; there is no timeout of our own.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::DepsError;
use crate::Result;

/// A command line to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path
    pub program: String,
    /// Arguments, passed verbatim
    pub args: Vec<String>,
    /// Stream child output to the terminal instead of capturing it
    pub inherit_stdio: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            inherit_stdio: false,
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

    /// Stream output live (long-running installers).
    pub fn streamed(mut self) -> Self {
        self.inherit_stdio = true;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        CommandOutput {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        CommandOutput {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// stdout followed by stderr, trimmed
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr).trim().to_string()
    }

    fn describe_status(&self) -> String {
        match self.status {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Narrow capability for running external processes
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion. `Err` means it could not be started.
    fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput>;

    /// Resolve a program name against the search path.
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// Runs real processes via `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
        debug!(command = %spec, streamed = spec.inherit_stdio, "running command");

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);

        if spec.inherit_stdio {
            let status = command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()?;
            return Ok(CommandOutput {
                status: status.code(),
                stdout: String::new(),
                stderr: String::new(),
            });
        }

        let output = command.output()?;
        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        let path_var = std::env::var_os("PATH")?;
        find_in_path(program, &path_var)
    }
}

/// Search `path_var` (a `PATH`-style list) for an executable named `program`.
pub fn find_in_path(program: &str, path_var: &OsStr) -> Option<PathBuf> {
    if program.contains(std::path::MAIN_SEPARATOR) {
        let candidate = PathBuf::from(program);
        return is_executable(&candidate).then_some(candidate);
    }

    std::env::split_paths(path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Run a command and turn start failures or non-zero exits into errors.
pub fn run_checked(runner: &dyn CommandRunner, spec: &CommandSpec) -> Result<CommandOutput> {
    let output = runner.run(spec).map_err(|e| DepsError::CommandFailed {
        command: spec.to_string(),
        status: "failed to start".to_string(),
        stderr: e.to_string(),
    })?;

    if !output.success() {
        return Err(DepsError::CommandFailed {
            command: spec.to_string(),
            status: output.describe_status(),
            stderr: output.stderr.trim().to_string(),
        });
    }

    Ok(output)
}
