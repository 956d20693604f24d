//! Adapter for `bazel-diff`, which works from per-revision hash files.
//!
//! Hashes are generated with the workspace checked out at each revision in
//! turn, so the adapter moves the checkout to `before` and back. It always
//! restores the original branch (or detached commit) before returning.

use std::path::{Path, PathBuf};

use tdc_git::{CliRepo, GitRepo};

use crate::adapter::process::Invocation;
use crate::adapter::{Determination, DeterminationError, Determinator, FailurePayload};
use crate::config::{AdaptersConfig, ConfigError};
use crate::profile::AdapterProfile;

pub const NAME: &str = "bazel-diff";

#[derive(Clone, Debug)]
pub struct BazelDiff {
    binary: PathBuf,
    launcher: String,
    payload: FailurePayload,
}

impl BazelDiff {
    #[must_use]
    pub fn new(binary: PathBuf, launcher: String, payload: FailurePayload) -> Self {
        Self {
            binary,
            launcher,
            payload,
        }
    }

    fn generate_hashes(&self, workspace: &Path, out: &Path) -> Invocation {
        Invocation::new(&self.binary, workspace)
            .arg("generate-hashes")
            .arg("-w")
            .arg(workspace)
            .arg("-b")
            .arg(&self.launcher)
            .arg(out)
    }
}

pub(crate) fn build(
    config: &AdaptersConfig,
    profile: &AdapterProfile,
) -> Result<Box<dyn Determinator>, ConfigError> {
    let binary = config
        .bazel_diff
        .clone()
        .ok_or_else(|| super::not_configured(NAME, "bazel_diff", "BAZEL_DIFF"))?;
    Ok(Box::new(BazelDiff::new(
        binary,
        config.launcher.clone(),
        profile.failure_payload.clone(),
    )))
}

impl Determinator for BazelDiff {
    fn name(&self) -> &str {
        NAME
    }

    fn determine(
        &self,
        workspace: &Path,
        before: &str,
        flags: &[String],
    ) -> Result<Determination, DeterminationError> {
        let original = current_ref(workspace)?;
        let scratch = tempfile::Builder::new()
            .prefix("tdc-bazel-diff-")
            .tempdir()
            .map_err(|e| DeterminationError::setup(NAME, format!("temp dir: {e}")))?;
        let hashes_before = scratch.path().join("hashes-before");
        let hashes_after = scratch.path().join("hashes-after");
        let impacted = scratch.path().join("impacted-targets");

        let mut log = Vec::new();
        let mut run = |invocation: Invocation| -> Result<(), DeterminationError> {
            let out = invocation.run(&self.payload)?;
            log.push(out);
            Ok(())
        };

        let hashed_before = run(git_checkout(workspace, before))
            .and_then(|()| run(self.generate_hashes(workspace, &hashes_before)));
        // Restore even if hashing at `before` failed.
        let restored = run(git_checkout(workspace, &original));
        hashed_before?;
        restored?;

        let impacted_cmd = Invocation::new(&self.binary, workspace)
            .arg("get-impacted-targets")
            .arg("-sh")
            .arg(&hashes_before)
            .arg("-fh")
            .arg(&hashes_after)
            .arg("-w")
            .arg(workspace)
            .arg("-b")
            .arg(&self.launcher)
            .arg("-o")
            .arg(&impacted)
            .args(flags);
        let command = impacted_cmd.display();
        run(self.generate_hashes(workspace, &hashes_after))?;
        run(impacted_cmd)?;

        let labels = std::fs::read_to_string(&impacted).map_err(|e| {
            DeterminationError::setup(
                command.clone(),
                format!("reading {}: {e}", impacted.display()),
            )
        })?;
        Ok(Determination {
            command,
            labels,
            stdout: log.iter().map(|c| c.stdout.as_str()).collect(),
            stderr: log.iter().map(|c| c.stderr.as_str()).collect(),
        })
    }
}

fn git_checkout(workspace: &Path, rev: &str) -> Invocation {
    Invocation::new("git", workspace).args(["checkout", "--quiet", rev])
}

/// The branch checked out in `workspace`, or the HEAD commit if detached.
fn current_ref(workspace: &Path) -> Result<String, DeterminationError> {
    let repo = CliRepo::at(workspace);
    let setup =
        |e: tdc_git::GitError| DeterminationError::setup("git rev-parse HEAD", e.to_string());
    match repo.current_branch().map_err(setup)? {
        Some(branch) => Ok(branch),
        None => Ok(repo.rev_parse("HEAD").map_err(setup)?.to_string()),
    }
}
