//! External command execution.
//!
//! Builder-based API for running a subprocess and turning a non-zero exit
//! status into a typed error carrying the captured stderr.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! Cmd::new("node")
//!     .args(["node_modules/.bin/webpack", "--config", "out/abc.config.js"])
//!     .cwd(root)
//!     .run()?;
//! ```

use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Command, Output},
};

use thiserror::Error;

/// Subprocess failures.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("`{0}` not found on PATH")]
    NotFound(String),

    #[error("failed to execute `{program}`")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}\n{stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Command builder for external process execution.
#[derive(Debug, Default, Clone)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Create from a command array (e.g., `["node", "webpack"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        let args: Vec<_> = iter.map(|s| s.as_ref().to_owned()).collect();
        Self {
            program,
            args,
            ..Default::default()
        }
    }

    /// Add a single argument. Empty arguments are skipped.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set environment variables for the subprocess.
    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in vars {
            self.envs.push((k.as_ref().to_owned(), v.as_ref().to_owned()));
        }
        self
    }

    /// Human-readable command line, for logs.
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Execute the command and return its output.
    ///
    /// A non-zero exit status is an error; so is a zero exit status that
    /// still wrote to stderr when `strict_stderr` is set.
    pub fn run(self, strict_stderr: bool) -> Result<Output, ExecError> {
        let name = self.program.to_string_lossy().to_string();
        let program = which::which(&self.program).map_err(|_| ExecError::NotFound(name.clone()))?;

        let mut cmd = Command::new(program);
        cmd.args(&self.args).envs(self.envs.iter().cloned());

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|source| ExecError::Io {
            program: name.clone(),
            source,
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() || (strict_stderr && !stderr.is_empty()) {
            return Err(ExecError::Failed {
                program: name,
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_splits_program_and_args() {
        let cmd = Cmd::from_slice(&["node", "webpack", "--config", "a.js"]);
        assert_eq!(cmd.display(), "node webpack --config a.js");
    }

    #[test]
    fn empty_args_are_skipped() {
        let cmd = Cmd::new("node").args(["", "--version"]);
        assert_eq!(cmd.display(), "node --version");
    }

    #[test]
    fn missing_program_is_not_found() {
        let err = Cmd::new("pagepack-definitely-not-a-real-binary")
            .run(false)
            .unwrap_err();
        assert!(matches!(err, ExecError::NotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_failure() {
        let err = Cmd::new("sh")
            .args(["-c", "echo boom >&2; exit 3"])
            .run(false)
            .unwrap_err();
        match err {
            ExecError::Failed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn strict_stderr_rejects_warnings() {
        assert!(Cmd::new("sh").args(["-c", "echo warn >&2"]).run(false).is_ok());
        assert!(
            Cmd::new("sh")
                .args(["-c", "echo warn >&2"])
                .run(true)
                .is_err()
        );
    }
}
