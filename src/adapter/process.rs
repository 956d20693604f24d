//! Running adapter processes.
//!
//! Determinators are started with the harness environment, except that
//! `HOME` and `PATH` are set explicitly and `PATH` loses every entry under
//! the user cache's `bazelisk` directory. Some tools shell out to a bare
//! `bazel`, and bazelisk's cache would otherwise put the harness's own Bazel
//! version first on `PATH`.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::adapter::{DeterminationError, FailureCause, FailurePayload};

/// Captured output of a successful process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Captured {
    pub stdout: String,
    pub stderr: String,
}

/// A single adapter process: program, arguments and working directory.
#[derive(Clone, Debug)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: PathBuf,
}

impl Invocation {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// The command line, for logs and error messages.
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(OsStr::to_string_lossy)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion, capturing stdout and stderr separately.
    ///
    /// # Errors
    /// A [`DeterminationError`] carrying both streams and `payload`'s
    /// partial set if the process cannot start or exits unsuccessfully.
    pub fn run(&self, payload: &FailurePayload) -> Result<Captured, DeterminationError> {
        let command = self.display();
        tracing::info!(command = %command, cwd = %self.cwd.display(), "invoking determinator");

        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.cwd)
            .envs(curated_env())
            .stdin(Stdio::null())
            .output()
            .map_err(|e| DeterminationError {
                command: command.clone(),
                cause: FailureCause::Spawn(e.to_string()),
                stdout: String::new(),
                stderr: String::new(),
                partial: payload.partial(""),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(Captured { stdout, stderr })
        } else {
            tracing::debug!(command = %command, code = ?output.status.code(), "determinator failed");
            Err(DeterminationError {
                command,
                cause: FailureCause::Exit(output.status.code()),
                partial: payload.partial(&stdout),
                stdout,
                stderr,
            })
        }
    }
}

/// `HOME` and the filtered `PATH`, to be set on top of the inherited
/// environment.
#[must_use]
pub fn curated_env() -> Vec<(&'static str, OsString)> {
    let mut env = Vec::with_capacity(2);
    if let Some(home) = dirs::home_dir() {
        env.push(("HOME", home.into_os_string()));
    }
    if let Some(path) = std::env::var_os("PATH") {
        env.push(("PATH", filter_path(&path, dirs::cache_dir().as_deref())));
    }
    env
}

/// Drop `PATH` entries that contain `<cache_dir>/bazelisk`.
#[must_use]
pub fn filter_path(path: &OsStr, cache_dir: Option<&Path>) -> OsString {
    let Some(cache_dir) = cache_dir else {
        return path.to_os_string();
    };
    let marker = cache_dir.join("bazelisk");
    let marker = marker.to_string_lossy();

    let kept: Vec<PathBuf> = std::env::split_paths(path)
        .filter(|entry| !entry.to_string_lossy().contains(marker.as_ref()))
        .collect();
    std::env::join_paths(kept).unwrap_or_else(|_| path.to_os_string())
}
