//! Determinator adapters.
//!
//! A determinator is an external tool that, given a workspace whose current
//! checkout is the "after" state and a "before" revision, prints the labels
//! of every target whose behavior may differ. Each adapter wraps one such
//! tool behind the [`Determinator`] trait; the runner never knows which one
//! it is talking to.
//!
//! Adapters are registered in [`REGISTRY`] together with their
//! [`AdapterProfile`](crate::profile::AdapterProfile), so a conformance run
//! is parameterized by adapter name alone.

pub mod bazel_diff;
pub mod bazel_differ;
pub mod process;
pub mod target_determinator;

use std::fmt;
use std::path::Path;

use crate::config::{AdaptersConfig, ConfigError};
use crate::label::{InvalidLabelError, Label, TargetSet};
use crate::profile::AdapterProfile;

pub use bazel_diff::BazelDiff;
pub use bazel_differ::BazelDiffer;
pub use target_determinator::TargetDeterminator;

// ---------------------------------------------------------------------------
// Determinator
// ---------------------------------------------------------------------------

/// One target-determinator implementation.
///
/// Implementations are stateless between calls: everything an invocation
/// needs arrives through its arguments, and nothing about the workspace is
/// retained afterwards.
pub trait Determinator: Send + Sync {
    /// Registry name, e.g. `"target-determinator"`.
    fn name(&self) -> &str;

    /// Flags passed when a scenario does not ask for specific ones.
    fn default_flags(&self) -> Vec<String> {
        Vec::new()
    }

    /// Run the tool once against `workspace`, comparing its current checkout
    /// with `before`, and return its raw output.
    ///
    /// # Errors
    /// A [`DeterminationError`] if any process the adapter runs fails.
    fn determine(
        &self,
        workspace: &Path,
        before: &str,
        flags: &[String],
    ) -> Result<Determination, DeterminationError>;

    /// The affected targets between `before` and the current checkout.
    ///
    /// # Errors
    /// [`AffectedTargetsError::Determination`] if the tool fails, or
    /// [`AffectedTargetsError::InvalidLabel`] if it succeeds but prints a
    /// line that is not a label.
    fn compute_affected_targets(
        &self,
        workspace: &Path,
        before: &str,
    ) -> Result<TargetSet, AffectedTargetsError> {
        let determination = self.determine(workspace, before, &self.default_flags())?;
        match determination.targets() {
            Ok(targets) => Ok(targets),
            Err(error) => Err(AffectedTargetsError::InvalidLabel {
                error,
                determination,
            }),
        }
    }
}

/// Raw output of one successful determination.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Determination {
    /// The command line (or pipeline) that produced this output.
    pub command: String,
    /// Newline-delimited labels: stdout for tools that print them, the
    /// contents of the output file for tools that write one.
    pub labels: String,
    pub stdout: String,
    pub stderr: String,
}

impl Determination {
    /// Parse [`labels`](Self::labels) through the normalizer.
    ///
    /// # Errors
    /// Fails on the first non-blank line that is not a label.
    pub fn targets(&self) -> Result<TargetSet, InvalidLabelError> {
        TargetSet::from_lines(&self.labels)
    }
}

// ---------------------------------------------------------------------------
// Failure payload
// ---------------------------------------------------------------------------

/// What partial target set a failed invocation carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailurePayload {
    /// No targets.
    Empty,
    /// A fixed marker label.
    Sentinel(Label),
    /// Whatever labels the tool managed to print before failing.
    PartialStdout,
}

impl FailurePayload {
    /// The partial set for a failed run that printed `stdout`.
    #[must_use]
    pub fn partial(&self, stdout: &str) -> TargetSet {
        match self {
            Self::Empty => TargetSet::new(),
            Self::Sentinel(label) => std::iter::once(label.clone()).collect(),
            Self::PartialStdout => TargetSet::from_lines_lossy(stdout),
        }
    }
}

impl fmt::Display for FailurePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Sentinel(label) => write!(f, "sentinel {label}"),
            Self::PartialStdout => write!(f, "partial stdout"),
        }
    }
}

// ---------------------------------------------------------------------------
// DeterminationError
// ---------------------------------------------------------------------------

/// Why an invocation failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureCause {
    /// The process ran and exited unsuccessfully (`None` if killed by a
    /// signal).
    Exit(Option<i32>),
    /// The process could not be started.
    Spawn(String),
    /// The adapter could not prepare or collect the invocation, e.g. a
    /// missing output file.
    Setup(String),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exit(Some(code)) => write!(f, "exited with code {code}"),
            Self::Exit(None) => write!(f, "was terminated by a signal"),
            Self::Spawn(e) => write!(f, "could not be started: {e}"),
            Self::Setup(e) => write!(f, "could not be completed: {e}"),
        }
    }
}

/// A failed determinator invocation, with everything it printed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeterminationError {
    pub command: String,
    pub cause: FailureCause,
    pub stdout: String,
    pub stderr: String,
    /// The adapter's [`FailurePayload`] applied to this failure.
    pub partial: TargetSet,
}

impl DeterminationError {
    pub(crate) fn setup(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            cause: FailureCause::Setup(message.into()),
            stdout: String::new(),
            stderr: String::new(),
            partial: TargetSet::new(),
        }
    }
}

impl fmt::Display for DeterminationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` {}", self.command, self.cause)?;
        if !self.stdout.is_empty() {
            write!(f, "\n--- stdout ---\n{}", self.stdout.trim_end())?;
        }
        if !self.stderr.is_empty() {
            write!(f, "\n--- stderr ---\n{}", self.stderr.trim_end())?;
        }
        Ok(())
    }
}

impl std::error::Error for DeterminationError {}

// ---------------------------------------------------------------------------
// AffectedTargetsError
// ---------------------------------------------------------------------------

/// Why [`Determinator::compute_affected_targets`] produced no target set.
///
/// A tool that exits successfully is never a [`DeterminationError`], even if
/// its output does not parse; that case is an [`InvalidLabelError`] carrying
/// the output it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AffectedTargetsError {
    /// The tool failed.
    Determination(DeterminationError),
    /// The tool succeeded but printed a line that is not a label.
    InvalidLabel {
        error: InvalidLabelError,
        determination: Determination,
    },
}

impl fmt::Display for AffectedTargetsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Determination(e) => write!(f, "{e}"),
            Self::InvalidLabel {
                error,
                determination,
            } => write!(f, "`{}` printed {error}", determination.command),
        }
    }
}

impl std::error::Error for AffectedTargetsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Determination(e) => Some(e),
            Self::InvalidLabel { error, .. } => Some(error),
        }
    }
}

impl From<DeterminationError> for AffectedTargetsError {
    fn from(e: DeterminationError) -> Self {
        Self::Determination(e)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Constructor for one adapter.
pub type BuildFn =
    fn(&AdaptersConfig, &AdapterProfile) -> Result<Box<dyn Determinator>, ConfigError>;

/// A registered adapter: its name, its profile and how to build it.
pub struct AdapterEntry {
    pub name: &'static str,
    pub profile: fn() -> AdapterProfile,
    pub build: BuildFn,
}

impl fmt::Debug for AdapterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Every adapter the harness knows how to drive.
pub static REGISTRY: [AdapterEntry; 3] = [
    AdapterEntry {
        name: target_determinator::NAME,
        profile: AdapterProfile::target_determinator,
        build: target_determinator::build,
    },
    AdapterEntry {
        name: bazel_diff::NAME,
        profile: AdapterProfile::bazel_diff,
        build: bazel_diff::build,
    },
    AdapterEntry {
        name: bazel_differ::NAME,
        profile: AdapterProfile::bazel_differ,
        build: bazel_differ::build,
    },
];

/// Look up a registered adapter by name.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static AdapterEntry> {
    REGISTRY.iter().find(|entry| entry.name == name)
}

/// Names of all registered adapters.
#[must_use]
pub fn names() -> Vec<&'static str> {
    REGISTRY.iter().map(|entry| entry.name).collect()
}

/// Error for an adapter whose binary is not configured.
pub(crate) fn not_configured(name: &str, key: &str, env: &str) -> ConfigError {
    ConfigError {
        path: None,
        message: format!(
            "adapter '{name}' has no binary configured; set [adapters].{key} or {env}"
        ),
    }
}
