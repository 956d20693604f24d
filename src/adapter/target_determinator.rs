//! Adapter for `target-determinator`, which prints affected labels on stdout.
//!
//! ```text
//! target-determinator --working-directory <ws> --bazel <launcher> [flags] <before>
//! ```
//!
//! When the workspace is unclean the tool computes the "before" state in a
//! cached git worktree under `~/.cache/target-determinator`; see
//! [`worktree_path`].

use std::path::{Path, PathBuf};

use crate::adapter::process::Invocation;
use crate::adapter::{Determination, DeterminationError, Determinator, FailurePayload};
use crate::config::{AdaptersConfig, ConfigError};
use crate::corpus::hex_sha1;
use crate::profile::{AdapterProfile, IGNORED_DIRECTORY};

pub const NAME: &str = "target-determinator";

/// Stdout the tool prints, alone, when an invocation fails.
pub const INVOCATION_ERROR_SENTINEL: &str = "Target Determinator invocation Error\n";

#[derive(Clone, Debug)]
pub struct TargetDeterminator {
    binary: PathBuf,
    launcher: String,
    payload: FailurePayload,
}

impl TargetDeterminator {
    #[must_use]
    pub fn new(binary: PathBuf, launcher: String, payload: FailurePayload) -> Self {
        Self {
            binary,
            launcher,
            payload,
        }
    }
}

pub(crate) fn build(
    config: &AdaptersConfig,
    profile: &AdapterProfile,
) -> Result<Box<dyn Determinator>, ConfigError> {
    let binary = config
        .target_determinator
        .clone()
        .ok_or_else(|| super::not_configured(NAME, "target_determinator", "TARGET_DETERMINATOR"))?;
    Ok(Box::new(TargetDeterminator::new(
        binary,
        config.launcher.clone(),
        profile.failure_payload.clone(),
    )))
}

impl Determinator for TargetDeterminator {
    fn name(&self) -> &str {
        NAME
    }

    fn default_flags(&self) -> Vec<String> {
        vec!["--ignore-file".to_owned(), IGNORED_DIRECTORY.to_owned()]
    }

    fn determine(
        &self,
        workspace: &Path,
        before: &str,
        flags: &[String],
    ) -> Result<Determination, DeterminationError> {
        let invocation = Invocation::new(&self.binary, workspace)
            .arg("--working-directory")
            .arg(workspace)
            .arg("--bazel")
            .arg(&self.launcher)
            .args(flags)
            .arg(before);
        let out = invocation.run(&self.payload)?;
        Ok(Determination {
            command: invocation.display(),
            labels: out.stdout.clone(),
            stdout: out.stdout,
            stderr: out.stderr,
        })
    }
}

/// Where the tool caches its worktree for `working_dir`:
/// `~/.cache/target-determinator/td-worktree-<basename>-<sha1(path)>`.
///
/// `None` if there is no home directory.
#[must_use]
pub fn worktree_path(working_dir: &Path) -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    let basename = working_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let hash = hex_sha1(&working_dir.to_string_lossy());
    Some(
        home.join(".cache")
            .join("target-determinator")
            .join(format!("td-worktree-{basename}-{hash}")),
    )
}
