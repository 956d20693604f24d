//! Per-adapter capability profiles.
//!
//! Adapters differ in fidelity: some cannot express a scenario at all, some
//! knowingly over-report. Rather than branching in scenario code, each
//! adapter carries a table from scenario name to [`Treatment`]. Scenarios
//! without an entry run normally.

use std::collections::BTreeMap;
use std::fmt;

use crate::adapter::{FailurePayload, bazel_diff, bazel_differ, target_determinator};

/// Untracked directory planted in corpus workspaces for adapters that
/// promise to leave ignored, unadded files alone.
pub const IGNORED_DIRECTORY: &str = "ignored-directory";

/// File inside [`IGNORED_DIRECTORY`].
pub const IGNORED_FILE: &str = "some-file";

/// How an adapter handles one scenario.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "treatment", content = "reason", rename_all = "kebab-case")]
pub enum Treatment {
    Run,
    /// Not run; reported as skipped with the reason.
    Skip(String),
    /// Run, with every check tolerating (and requiring) over-reporting.
    AllowOverBuilds(String),
}

impl fmt::Display for Treatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run => write!(f, "run"),
            Self::Skip(reason) => write!(f, "skip ({reason})"),
            Self::AllowOverBuilds(reason) => write!(f, "allow over-builds ({reason})"),
        }
    }
}

/// What the harness knows about one adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterProfile {
    /// Registry name.
    pub adapter: &'static str,
    /// Whether the adapter leaves ignored, unadded files in place. Corpus
    /// scenarios then plant one and check it survives each invocation.
    pub supports_ignored_unadded_files: bool,
    pub failure_payload: FailurePayload,
    overrides: BTreeMap<&'static str, Treatment>,
}

const RULE_IMPLEMENTATION_HASHES: &str = "Rule implementation attr factors in hashes of entire transitively loaded bzl files, rather than anything more granular or processed";
const NO_CONFIGURATIONS: &str = "doesn't inspect configurations";
const NO_BAZEL_VERSIONS: &str = "doesn't seem to track bazel versions";
const NO_SUBMODULES: &str = "submodules are not supported";
const NO_RELATIVE_REVISIONS: &str = "seems to behave weirdly with relative git revisions";
const NO_FILE_MODES: &str = "doesn't check file modes";
const NO_INCOMPATIBLE_FILTER: &str = "does not filter incompatible targets";
const NO_PLATFORM_FILTER: &str = "doesn't filter platform-specific changes";
const NO_ATTRIBUTE_DEFAULTS: &str = "isn't aware of attribute defaults";

const CONFIGURATION_SCENARIOS: [&str; 6] = [
    "changed_bazelrc_affecting_all_tests",
    "changed_bazelrc_affecting_some_tests",
    "import_in_bazelrc_affecting_java",
    "try_import_in_bazelrc_affecting_java",
    "changing_target_configuration_does_not_affect_host_configuration",
    "changing_host_configuration_does_not_affect_target_configuration",
];

const IGNORED_PLATFORM_SCENARIOS: [&str; 2] = [
    "ignored_platform_specific_src_changed",
    "ignored_platform_specific_dep_changed",
];

const INCOMPATIBLE_SCENARIOS: [&str; 2] = [
    "incompatible_targets_are_filtered",
    "incompatible_targets_are_filtered_bazel_issue_21010",
];

impl AdapterProfile {
    fn new(adapter: &'static str, failure_payload: FailurePayload) -> Self {
        Self {
            adapter,
            supports_ignored_unadded_files: false,
            failure_payload,
            overrides: BTreeMap::new(),
        }
    }

    fn skip(mut self, scenarios: &[&'static str], reason: &str) -> Self {
        for &name in scenarios {
            self.overrides
                .insert(name, Treatment::Skip(format!("{} {reason}", self.adapter)));
        }
        self
    }

    fn allow_over_builds(mut self, scenarios: &[&'static str], reason: &str) -> Self {
        for &name in scenarios {
            self.overrides
                .insert(name, Treatment::AllowOverBuilds(reason.to_owned()));
        }
        self
    }

    /// Treatment of the scenario called `name`.
    #[must_use]
    pub fn treatment(&self, name: &str) -> Treatment {
        self.overrides.get(name).cloned().unwrap_or(Treatment::Run)
    }

    /// Every scenario with a non-default treatment.
    pub fn overrides(&self) -> impl Iterator<Item = (&'static str, &Treatment)> {
        self.overrides.iter().map(|(name, t)| (*name, t))
    }

    #[must_use]
    pub fn target_determinator() -> Self {
        let mut profile = Self::new(target_determinator::NAME, FailurePayload::PartialStdout)
            .allow_over_builds(
                &["refactoring_starlark_rule_is_no_op"],
                RULE_IMPLEMENTATION_HASHES,
            )
            .allow_over_builds(
                &[
                    "import_in_bazelrc_affecting_java",
                    "changed_bazelrc_affecting_some_tests",
                    "try_import_in_bazelrc_affecting_java",
                ],
                "Configuration calculation doesn't appear to trim java fragments from sh_test configuration, so Java changes are viewed to also affect sh_test targets",
            )
            .allow_over_builds(
                &[
                    "adding_target_used_in_host_configuration",
                    "changing_host_configuration_does_not_affect_target_configuration",
                    "changing_target_configuration_does_not_affect_host_configuration",
                ],
                "cquery doesn't factor configuration into ruleInputs, so we can't differentiate between host and target deps. See https://github.com/bazelbuild/bazel/issues/14610#issuecomment-1024460141",
            );
        profile.supports_ignored_unadded_files = true;
        profile
    }

    #[must_use]
    pub fn bazel_diff() -> Self {
        let name = bazel_diff::NAME;
        Self::new(name, FailurePayload::Empty)
            .skip(&CONFIGURATION_SCENARIOS, NO_CONFIGURATIONS)
            .skip(
                &[
                    "changed_bazel_patch_version_native",
                    "changed_bazel_patch_version_starlark",
                ],
                NO_BAZEL_VERSIONS,
            )
            .allow_over_builds(
                &IGNORED_PLATFORM_SCENARIOS,
                &format!("{name} {NO_PLATFORM_FILTER}"),
            )
            .skip(
                &[
                    "change_submodule_path",
                    "add_dependent_target_in_submodule",
                    "succeed_for_unclean_submodule",
                ],
                NO_SUBMODULES,
            )
            .skip(&["relative_revisions"], NO_RELATIVE_REVISIONS)
            .allow_over_builds(
                &["explicitly_specifying_default_value_does_not_trigger_native"],
                &format!("{name} {NO_ATTRIBUTE_DEFAULTS}."),
            )
            .allow_over_builds(
                &["refactoring_starlark_rule_is_no_op"],
                RULE_IMPLEMENTATION_HASHES,
            )
            .skip(&["chmod_file"], NO_FILE_MODES)
            .skip(&INCOMPATIBLE_SCENARIOS, NO_INCOMPATIBLE_FILTER)
    }

    #[must_use]
    pub fn bazel_differ() -> Self {
        let name = bazel_differ::NAME;
        Self::new(name, FailurePayload::Empty)
            .skip(&CONFIGURATION_SCENARIOS, NO_CONFIGURATIONS)
            .allow_over_builds(
                &IGNORED_PLATFORM_SCENARIOS,
                &format!("{name} {NO_PLATFORM_FILTER}"),
            )
            .allow_over_builds(
                &[
                    "unconsumed_indirect_workspace_change_is_no_op",
                    "moving_starlark_rule_to_external_repo_is_no_op",
                    "modifying_rule_via_workspace_file",
                    "changing_file_loaded_by_workspace_triggers_targets",
                ],
                &format!("{name} returns targets in //external as changed"),
            )
            .skip(
                &[
                    "changed_bazel_major_version_native",
                    "changed_bazel_patch_version_native",
                    "changed_bazel_major_version_starlark",
                    "changed_bazel_patch_version_starlark",
                ],
                NO_BAZEL_VERSIONS,
            )
            .skip(
                &[
                    "add_trivial_submodule",
                    "change_submodule_path",
                    "add_dependent_target_in_submodule",
                    "succeed_for_unclean_submodule",
                ],
                NO_SUBMODULES,
            )
            .skip(&["relative_revisions"], NO_RELATIVE_REVISIONS)
            .allow_over_builds(
                &["explicitly_specifying_default_value_does_not_trigger_native"],
                &format!("{name} {NO_ATTRIBUTE_DEFAULTS}."),
            )
            .allow_over_builds(
                &["changing_unimportant_permission_does_not_trigger_native"],
                &format!("{name} takes into account all permission bits."),
            )
            .allow_over_builds(
                &["refactoring_starlark_rule_is_no_op"],
                RULE_IMPLEMENTATION_HASHES,
            )
            .skip(&["chmod_file"], NO_FILE_MODES)
            .skip(
                &["zero_to_one_target_native"],
                "doesn't handle no targets being returned from a query",
            )
            .skip(&INCOMPATIBLE_SCENARIOS, NO_INCOMPATIBLE_FILTER)
            .skip(
                &["minimum_supported_bazel_version"],
                "fails against the minimum supported Bazel version",
            )
    }
}
