//! Host side effects other than plain file edits.
//!
//! Everything that needs root, spawns a process or asks the clock goes through
//! [`System`], so the configurators can be driven against a fake host.

use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use nix::unistd::{Uid, User};

use crate::error::SetupError;

/// An external command to run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
    /// Capture stdout/stderr instead of passing them through to the terminal.
    pub capture: bool,
}

impl Invocation {
    pub fn new(program: &str) -> Self {
        Invocation {
            program: program.to_string(),
            args: Vec::new(),
            envs: Vec::new(),
            capture: true,
        }
    }

    /// Runs `program` as `user` through `runuser`, keeping the environment.
    pub fn as_user(user: &str, program: &str) -> Self {
        Invocation::new("runuser").args(["-u", user, "--", program])
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

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn inherit_output(mut self) -> Self {
        self.capture = false;
        self
    }
}

// Environment values are never shown; they carry passwords.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, _) in &self.envs {
            write!(f, "{key}=*** ")?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Outcome of a finished command. Output is empty unless it was captured.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Completed {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Completed {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

pub trait System {
    /// Whether the process runs with root privileges.
    fn is_privileged(&self) -> bool;

    /// Runs a command to completion. Errors only when it cannot be started.
    fn run(&self, invocation: &Invocation) -> Result<Completed>;

    /// Gives `path` to `owner` and that user's primary group.
    fn chown(&self, path: &Path, owner: &str) -> Result<()>;

    /// Local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    /// Like [`System::run`], but a non-zero exit becomes [`SetupError::CommandFailed`].
    fn run_checked(&self, invocation: &Invocation) -> Result<Completed> {
        let completed = self.run(invocation)?;
        if !completed.success() {
            return Err(SetupError::CommandFailed {
                command: invocation.to_string(),
                code: completed.code,
                stderr: completed.stderr.trim().to_string(),
            }
            .into());
        }
        Ok(completed)
    }
}

/// The machine this process runs on.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostSystem;

impl System for HostSystem {
    fn is_privileged(&self) -> bool {
        Uid::effective().is_root()
    }

    fn run(&self, invocation: &Invocation) -> Result<Completed> {
        tracing::debug!(command = %invocation, "running");
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        for (key, value) in &invocation.envs {
            command.env(key, value);
        }
        let completed = if invocation.capture {
            let output = command
                .stdin(Stdio::null())
                .output()
                .with_context(|| format!("failed to start `{}`", invocation.program))?;
            Completed {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            }
        } else {
            let status = command
                .status()
                .with_context(|| format!("failed to start `{}`", invocation.program))?;
            Completed {
                code: status.code(),
                ..Completed::default()
            }
        };
        tracing::debug!(command = %invocation, code = ?completed.code, "finished");
        Ok(completed)
    }

    fn chown(&self, path: &Path, owner: &str) -> Result<()> {
        let user = User::from_name(owner)
            .with_context(|| format!("failed to look up user `{owner}`"))?
            .ok_or_else(|| SetupError::UnknownOsUser(owner.to_string()))?;
        nix::unistd::chown(path, Some(user.uid), Some(user.gid))
            .with_context(|| format!("failed to chown {} to {owner}", path.display()))?;
        Ok(())
    }

    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}
