//! Adapter for `bazel-differ`, which diffs two revisions in one call and
//! writes affected labels to a file.

use std::path::{Path, PathBuf};

use tdc_git::{CliRepo, GitRepo};

use crate::adapter::process::Invocation;
use crate::adapter::{Determination, DeterminationError, Determinator, FailurePayload};
use crate::config::{AdaptersConfig, ConfigError};
use crate::profile::AdapterProfile;

pub const NAME: &str = "bazel-differ";

/// Query template that restricts reported targets to rules.
const RULE_QUERY: &str = "kind(rule, set({{.Targets}}))";

#[derive(Clone, Debug)]
pub struct BazelDiffer {
    binary: PathBuf,
    launcher: String,
    payload: FailurePayload,
}

impl BazelDiffer {
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
        .bazel_differ
        .clone()
        .ok_or_else(|| super::not_configured(NAME, "bazel_differ", "BAZEL_DIFFER"))?;
    Ok(Box::new(BazelDiffer::new(
        binary,
        config.launcher.clone(),
        profile.failure_payload.clone(),
    )))
}

impl Determinator for BazelDiffer {
    fn name(&self) -> &str {
        NAME
    }

    fn determine(
        &self,
        workspace: &Path,
        before: &str,
        flags: &[String],
    ) -> Result<Determination, DeterminationError> {
        let after = CliRepo::at(workspace)
            .rev_parse("HEAD")
            .map_err(|e| DeterminationError::setup("git rev-parse HEAD", e.to_string()))?
            .to_string();
        let scratch = tempfile::Builder::new()
            .prefix("tdc-bazel-differ-")
            .tempdir()
            .map_err(|e| DeterminationError::setup(NAME, format!("temp dir: {e}")))?;
        let affected = scratch.path().join("affected-targets");

        let invocation = Invocation::new(&self.binary, workspace)
            .arg("get-targets")
            .arg("-w")
            .arg(workspace)
            .arg("-b")
            .arg(&self.launcher)
            .arg("-s")
            .arg(before)
            .arg("-f")
            .arg(&after)
            .arg("-o")
            .arg(&affected)
            .arg("-q")
            .arg(RULE_QUERY)
            .args(flags);
        let command = invocation.display();
        let out = invocation.run(&self.payload)?;

        let labels = std::fs::read_to_string(&affected).map_err(|e| {
            DeterminationError::setup(
                command.clone(),
                format!("reading {}: {e}", affected.display()),
            )
        })?;
        Ok(Determination {
            command,
            labels,
            stdout: out.stdout,
            stderr: out.stderr,
        })
    }
}
