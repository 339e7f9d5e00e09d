//! Narrow interface to external programs.
//!
//! The toolchain and the merge tool are only ever reached through
//! [`CommandRunner`], so tests can swap in scripted fakes.

use crate::bundler::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

/// A command to run: program, arguments and working directory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invocation {
    /// Program to execute.
    pub program: PathBuf,
    /// Arguments, in order.
    pub args: Vec<OsString>,
    /// Working directory; inherits the current one when `None`.
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    /// Starts an invocation of `program` with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory.
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Human-readable command line, for logs and reports.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            line.push(' ');
            if arg.contains(' ') {
                line.push('"');
                line.push_str(&arg);
                line.push('"');
            } else {
                line.push_str(&arg);
            }
        }
        line
    }

    /// Returns true if `arg` appears among the arguments.
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Returns the argument following the first occurrence of `flag`.
    pub fn value_of(&self, flag: &str) -> Option<&std::ffi::OsStr> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(OsString::as_os_str)
    }
}

/// Exit status and captured output of a finished program.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProcessOutput {
    /// Exit code; `None` when terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ProcessOutput {
    /// Returns true if the program exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Standard output followed by standard error.
    pub fn combined(&self) -> String {
        match (self.stdout.trim_end(), self.stderr.trim_end()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{out}\n{err}"),
        }
    }
}

/// Runs external programs to completion.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Runs `invocation`, waiting for it to exit and capturing its output.
    ///
    /// A non-zero exit is *not* an error; it is reported through
    /// [`ProcessOutput::exit_code`]. Errors mean the program could not be
    /// run at all (missing binary, timeout).
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;
}

/// [`CommandRunner`] backed by real child processes.
#[derive(Clone, Debug)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    /// Creates a runner that kills programs running longer than `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        let program = invocation.program.display().to_string();
        log::debug!("Running: {}", invocation.command_line());

        let mut command = tokio::process::Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(result) => result.map_err(|source| Error::Spawn {
                program: program.clone(),
                source,
            })?,
            Err(_) => {
                return Err(Error::Timeout {
                    program,
                    timeout: self.timeout,
                });
            }
        };

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Last `lines` lines of `text`.
pub fn tail_lines(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}
