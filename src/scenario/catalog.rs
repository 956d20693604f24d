//! The built-in scenarios.

#[allow(clippy::wildcard_imports)]
use super::commits::*;
use super::{Check, Rev, Scenario, Step, TextExpectation};
use crate::adapter::target_determinator::{self, INVOCATION_ERROR_SENTINEL};

const EXAMPLE_TEST: &str = "//java/example:ExampleTest";
const OTHER_EXAMPLE_TEST: &str = "//java/example:OtherExampleTest";
const SH_TEST: &str = "//sh:sh_test";
const SIMPLE: &str = "//java/example/simple:simple";
const SIMPLE_DEP: &str = "//java/example/simple:simple_dep";
const SIMPLE_DEP_LINUX: &str = "//java/example/simple:simple_dep_linux";
const GLOBS_ROOT: &str = "//globs:root";
const JBIN: &str = "//configurations:jbin";
const RUN_JBIN: &str = "//configurations:run_jbin";

const UNTRACKED_FILE: &str = "untracked-file";
const IGNORED_FILE: &str = "ignored-file";

/// Scenarios every adapter is held to.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn catalog() -> Vec<Scenario> {
    let linux = cfg!(target_os = "linux");
    let (platform_src, other_platform_src) = if linux {
        (CHANGED_LINUX_SRC, CHANGED_NONLINUX_SRC)
    } else {
        (CHANGED_NONLINUX_SRC, CHANGED_LINUX_SRC)
    };
    let (platform_dep, platform_dep_targets, other_platform_dep, other_platform_dep_targets) =
        if linux {
            (
                CHANGED_LINUX_DEP,
                [SIMPLE, SIMPLE_DEP_LINUX],
                CHANGED_NONLINUX_DEP,
                SIMPLE_DEP,
            )
        } else {
            (
                CHANGED_NONLINUX_DEP,
                [SIMPLE, SIMPLE_DEP],
                CHANGED_LINUX_DEP,
                SIMPLE_DEP_LINUX,
            )
        };

    vec![
        // -- Targets added and removed ------------------------------------
        between("zero_to_one_target_native", NO_TARGETS, ONE_TEST, &[EXAMPLE_TEST]),
        between("added_target_native", ONE_TEST, TWO_TESTS, &[OTHER_EXAMPLE_TEST]),
        Scenario::corpus("deleted_target_native")
            .check(Check::between(TWO_TESTS, ONE_TEST).forbid(&[OTHER_EXAMPLE_TEST])),
        // -- Attributes and permissions -----------------------------------
        between(
            "rule_affecting_attribute_change_native",
            TWO_TESTS,
            HAS_JVM_FLAGS,
            &[EXAMPLE_TEST],
        ),
        between(
            "explicitly_specifying_default_value_does_not_trigger_native",
            TWO_TESTS,
            EXPLICIT_DEFAULT_VALUE,
            &[],
        ),
        Scenario::corpus("changing_unimportant_permission_does_not_trigger_native")
            .step(Step::checkout(EXPLICIT_DEFAULT_VALUE))
            .step(chmod("java/example/ExampleTest.java", 0o444))
            .check(Check::new(snapshot(TWO_TESTS)))
            .step(chmod("java/example/ExampleTest.java", 0o666))
            .check(Check::new(snapshot(TWO_TESTS))),
        Scenario::corpus("changing_important_permission_does_trigger_native")
            .step(Step::checkout(EXPLICIT_DEFAULT_VALUE))
            .step(chmod("java/example/ExampleTest.java", 0o744))
            .check(Check::new(snapshot(TWO_TESTS)).expect(&[EXAMPLE_TEST])),
        // -- Build-tool versions --------------------------------------------
        between(
            "changed_bazel_major_version_native",
            TWO_TESTS,
            TWO_NATIVE_TESTS_BAZEL5_4_0,
            &[EXAMPLE_TEST, OTHER_EXAMPLE_TEST],
        ),
        between(
            "changed_bazel_patch_version_native",
            TWO_TESTS,
            TWO_NATIVE_TESTS_BAZEL6_0_0,
            &[EXAMPLE_TEST, OTHER_EXAMPLE_TEST],
        ),
        between(
            "changed_bazel_major_version_starlark",
            SIMPLE_JAVA_LIBRARY_TARGETS,
            SIMPLE_TARGETS_BAZEL5_4_0,
            &[SIMPLE, SIMPLE_DEP],
        ),
        between(
            "changed_bazel_patch_version_starlark",
            SIMPLE_JAVA_LIBRARY_TARGETS,
            SIMPLE_TARGETS_BAZEL6_0_0,
            &[SIMPLE, SIMPLE_DEP],
        ),
        between(
            "minimum_supported_bazel_version",
            SIMPLE_JAVA_LIBRARY_TARGETS,
            CHANGE_TRANSITIVE_FILE_BAZEL4_0_0,
            &[SIMPLE, SIMPLE_DEP],
        ),
        // -- Sources ----------------------------------------------------------
        between("changed_src", TWO_TESTS, MODIFIED_TEST_SRC, &[EXAMPLE_TEST]),
        between(
            "changed_transitive_src",
            SIMPLE_JAVA_LIBRARY_TARGETS,
            CHANGE_TRANSITIVE_FILE,
            &[SIMPLE, SIMPLE_DEP],
        ),
        // -- rc files ---------------------------------------------------------
        between(
            "changed_bazelrc_affecting_all_tests",
            TWO_LANGUAGES_OF_TESTS,
            BAZELRC_TEST_ENV,
            &[EXAMPLE_TEST, OTHER_EXAMPLE_TEST, SH_TEST],
        ),
        between(
            "changed_bazelrc_affecting_some_tests",
            TWO_LANGUAGES_OF_TESTS,
            BAZELRC_AFFECTING_JAVA,
            &[EXAMPLE_TEST, OTHER_EXAMPLE_TEST],
        ),
        between(
            "empty_try_import_in_bazelrc",
            TWO_TESTS,
            ADD_OPTIONAL_PRESENT_EMPTY_BAZELRC,
            &[],
        ),
        between(
            "try_import_missing",
            TWO_LANGUAGES_OF_TESTS,
            TWO_LANGUAGES_OPTIONAL_MISSING_TRY_IMPORT,
            &[],
        ),
        Scenario::corpus("try_import_in_bazelrc_affecting_java")
            .check(
                Check::between(
                    TWO_LANGUAGES_OPTIONAL_MISSING_TRY_IMPORT,
                    TWO_LANGUAGES_OPTIONAL_PRESENT_BAZELRC_AFFECTING_JAVA,
                )
                .expect(&[EXAMPLE_TEST, OTHER_EXAMPLE_TEST])
                .allow_over_builds(),
            )
            .check(
                Check::between(
                    TWO_LANGUAGES_OF_TESTS,
                    TWO_LANGUAGES_OPTIONAL_PRESENT_BAZELRC_AFFECTING_JAVA,
                )
                .expect(&[EXAMPLE_TEST, OTHER_EXAMPLE_TEST])
                .allow_over_builds(),
            )
            .check(
                Check::between(
                    TWO_LANGUAGES_OPTIONAL_PRESENT_BAZELRC_AFFECTING_JAVA,
                    TWO_LANGUAGES_OF_TESTS,
                )
                .expect(&[EXAMPLE_TEST, OTHER_EXAMPLE_TEST])
                .allow_over_builds(),
            ),
        between(
            "import_in_bazelrc_not_affecting_java",
            TWO_LANGUAGES_OF_TESTS,
            TWO_LANGUAGES_NOOP_IMPORTED_BAZELRC,
            &[],
        ),
        between(
            "import_in_bazelrc_affecting_java",
            TWO_LANGUAGES_OF_TESTS,
            TWO_LANGUAGES_IMPORTED_BAZELRC_AFFECTING_JAVA,
            &[EXAMPLE_TEST, OTHER_EXAMPLE_TEST],
        ),
        // -- Starlark rules -------------------------------------------------
        between(
            "added_unused_starlark_rules_triggers_no_targets",
            TWO_TESTS,
            JAVA_TESTS_AND_SIMPLE_JAVA_RULES,
            &[],
        ),
        between(
            "starlark_rules_trigger",
            SIMPLE_JAVA_LIBRARY_RULE,
            SIMPLE_JAVA_LIBRARY_TARGETS,
            &[SIMPLE, SIMPLE_DEP],
        ),
        between(
            "adding_dep_on_starlark_rules_trigger",
            SIMPLE_JAVA_LIBRARY_AND_JAVA_TESTS,
            DEP_ON_STARLARK_TARGET,
            &[EXAMPLE_TEST],
        ),
        between(
            "changing_starlark_rule_definition",
            DEP_ON_STARLARK_TARGET,
            CHANGE_STARLARK_RULE_IMPLEMENTATION,
            &[EXAMPLE_TEST, SIMPLE, SIMPLE_DEP],
        ),
        between(
            "refactoring_starlark_rule_is_no_op",
            CHANGE_STARLARK_RULE_IMPLEMENTATION,
            NOOP_REFACTOR_STARLARK_RULE_IMPLEMENTATION,
            &[],
        ),
        // -- WORKSPACE --------------------------------------------------------
        between(
            "moving_starlark_rule_to_external_repo_is_no_op",
            NOOP_REFACTOR_STARLARK_RULE_IMPLEMENTATION,
            RULES_IN_EXTERNAL_REPO,
            &[],
        ),
        between(
            "refactoring_workspace_file_is_no_op",
            RULES_IN_EXTERNAL_REPO,
            NOOP_REFACTOR_IN_WORKSPACE_FILE,
            &[],
        ),
        between(
            "modifying_rule_via_workspace_file",
            NOOP_REFACTOR_IN_WORKSPACE_FILE,
            ADD_SIMPLE_PACKAGE_RULE,
            &["//java/example/simple:simple_srcs"],
        ),
        between(
            "unconsumed_indirect_workspace_change_is_no_op",
            ADD_SIMPLE_PACKAGE_RULE,
            REFACTORED_WORKSPACE_INDIRECTLY,
            &[],
        ),
        between(
            "changing_file_loaded_by_workspace_triggers_targets",
            ADD_SIMPLE_PACKAGE_RULE,
            CHANGE_ATTRIBUTES_VIA_INDIRECTION,
            &[EXAMPLE_TEST, SIMPLE, SIMPLE_DEP],
        ),
        // -- Macros and globs -------------------------------------------------
        Scenario::corpus("changing_macro_expansion_based_on_file_existence")
            .check(
                Check::between(PATHOLOGICAL_RULES_SINGLE_TARGET, PATHOLOGICAL_RULES_TWO_TARGETS)
                    .expect(&[
                        "//weird:length_of_compute_lengths.0",
                        "//weird:length_of_compute_lengths.2",
                    ]),
            )
            .check(
                Check::between(PATHOLOGICAL_RULES_TWO_TARGETS, PATHOLOGICAL_RULES_SINGLE_TARGET)
                    .expect(&["//weird:length_of_compute_lengths.0"]),
            )
            .check(
                Check::between(PATHOLOGICAL_RULES_SINGLE_TARGET, PATHOLOGICAL_RULES_THREE_TARGETS)
                    .expect(&[
                        "//weird:length_of_compute_lengths.2",
                        "//weird:length_of_compute_lengths.3",
                    ]),
            )
            .check(
                Check::between(PATHOLOGICAL_RULES_SINGLE_TARGET, PATHOLOGICAL_RULES_FIVE_TARGETS)
                    .expect(&["//weird:pathological"]),
            ),
        between("removing_globbed_file_triggers", HAS_GLOBS, CHANGE_GLOBS, &[GLOBS_ROOT]),
        between(
            "removing_build_file_retriggers_globs",
            ADD_BUILD_FILE_INTERFERING_WITH_GLOBS,
            CHANGE_GLOBS,
            &[GLOBS_ROOT],
        ),
        between(
            "adding_build_file_retriggers_globs",
            CHANGE_GLOBS,
            ADD_BUILD_FILE_INTERFERING_WITH_GLOBS,
            &[GLOBS_ROOT],
        ),
        // -- Configurations -------------------------------------------------
        between(
            "adding_target_used_in_host_configuration",
            BAZELRC_INCLUDED_EMPTY,
            JAVA_USED_IN_GENRULE,
            &[JBIN, RUN_JBIN],
        ),
        between(
            "changing_host_configuration_does_not_affect_target_configuration",
            JAVA_USED_IN_GENRULE,
            BAZELRC_HOST_JAVACOPT,
            &[RUN_JBIN],
        ),
        between(
            "changing_target_configuration_does_not_affect_host_configuration",
            JAVA_USED_IN_GENRULE,
            BAZELRC_INCLUDED_JAVACOPT,
            &[JBIN, EXAMPLE_TEST],
        ),
        between(
            "reducing_visibility_on_dependency_affects_target",
            ADD_INDIRECTION_FOR_SIMPLE_JAVA_LIBRARY,
            REDUCE_DEPENDENCY_VISIBILITY,
            &[EXAMPLE_TEST, "//java/example/simple"],
        ),
        // -- Unclean repositories ---------------------------------------------
        Scenario::corpus("succeed_for_unclean_repository")
            .step(Step::create_file(UNTRACKED_FILE))
            .check(Check::between(TWO_TESTS, HAS_JVM_FLAGS).expect(&[EXAMPLE_TEST])),
        Scenario::corpus("succeed_for_unclean_ignored_files")
            .step(Step::create_file(IGNORED_FILE))
            .check(
                Check::between(ONE_TEST, TWO_TESTS_WITH_GITIGNORE).expect(&[OTHER_EXAMPLE_TEST]),
            )
            .step(Step::exists(IGNORED_FILE)),
        Scenario::corpus("succeed_for_unclean_submodule")
            .step(Step::checkout(SUBMODULE_CHANGE_DIRECTORY))
            .step(Step::create_file("demo-submodule-2/untracked-file"))
            .check(
                Check::between(SUBMODULE_ADD_DEPENDENT_ON_SIMPLE_JAVA_LIBRARY, SUBMODULE_CHANGE_DIRECTORY)
                    .expect(&["//demo-submodule-2:submodule_simple"]),
            ),
        // -- Submodules -------------------------------------------------------
        Scenario::corpus("add_trivial_submodule")
            .check(Check::between(SIMPLE_JAVA_LIBRARY_TARGETS, SUBMODULE_ADD_TRIVIAL_SUBMODULE))
            .step(Step::exists("demo-submodule/README.md")),
        between(
            "add_dependent_target_in_submodule",
            SUBMODULE_ADD_TRIVIAL_SUBMODULE,
            SUBMODULE_ADD_DEPENDENT_ON_SIMPLE_JAVA_LIBRARY,
            &["//demo-submodule:submodule_simple"],
        ),
        Scenario::corpus("change_submodule_path")
            .check(
                Check::between(SUBMODULE_ADD_DEPENDENT_ON_SIMPLE_JAVA_LIBRARY, SUBMODULE_CHANGE_DIRECTORY)
                    .expect(&["//demo-submodule-2:submodule_simple"]),
            )
            .step(Step::absent("demo-submodule"))
            .step(Step::exists("demo-submodule-2/README.md")),
        Scenario::corpus("delete_submodule")
            .check(Check::between(SUBMODULE_CHANGE_DIRECTORY, SUBMODULE_DELETE_SUBMODULE))
            .step(Step::absent("demo-submodule-2")),
        // -- Revisions --------------------------------------------------------
        Scenario::corpus("relative_revisions")
            .step(Step::checkout(TWO_TESTS))
            .check(
                Check::new(Rev::Literal("HEAD^".to_owned()))
                    .after(Rev::Literal("HEAD".to_owned()))
                    .expect(&[OTHER_EXAMPLE_TEST]),
            ),
        Scenario::corpus("branch_revision")
            .step(Step::checkout(TWO_TESTS))
            .step(Step::CheckoutBranch(TWO_TESTS_BRANCH.to_owned()))
            .check(
                Check::new(snapshot(ONE_TEST))
                    .after(Rev::Literal(TWO_TESTS_BRANCH.to_owned()))
                    .expect(&[OTHER_EXAMPLE_TEST]),
            )
            .step(Step::AssertBranch(TWO_TESTS_BRANCH.to_owned())),
        // -- Executable bits ------------------------------------------------
        between("chmod_file", ONE_SH_TEST, SH_TEST_NOT_EXECUTABLE, &[SH_TEST]),
        // -- Incompatible targets ---------------------------------------------
        Scenario::corpus("incompatible_targets_are_filtered").check(
            Check::between(ONE_TEST, INCOMPATIBLE_TARGET)
                .expect(&["//java/example:CompatibleTest"])
                .forbid(&["//java/example:IncompatibleTest"]),
        ),
        Scenario::corpus("incompatible_targets_are_filtered_bazel_issue_21010").check(
            Check::between(ONE_TEST_BAZEL7_0_0, INCOMPATIBLE_TARGET_BAZEL7_0_0)
                .expect(&["//java/example:CompatibleTest"])
                .forbid(&["//java/example:IncompatibleTest"]),
        ),
        // -- Platform-specific selects ----------------------------------------
        between("platform_specific_src_changed", SELECT_TARGET, platform_src, &[SIMPLE]),
        between(
            "ignored_platform_specific_src_changed",
            SELECT_TARGET,
            other_platform_src,
            &[],
        ),
        between(
            "platform_specific_dep_changed",
            SELECT_TARGET,
            platform_dep,
            &platform_dep_targets,
        ),
        between(
            "ignored_platform_specific_dep_changed",
            SELECT_TARGET,
            other_platform_dep,
            &[other_platform_dep_targets],
        ),
        // -- Aliases ----------------------------------------------------------
        between(
            "alias_target_is_detected_if_actual_target_changed",
            ALIAS_ADD_TARGET,
            ALIAS_CHANGE_TARGET_THROUGH_ALIAS,
            &[EXAMPLE_TEST, "//java/example:example_test"],
        ),
        between(
            "alias_target_is_detected_if_actual_file_changed",
            ALIAS_ADD_TARGET_TO_FILE,
            ALIAS_CHANGE_TARGET_THROUGH_ALIAS_TO_FILE,
            &[EXAMPLE_TEST, "//java/example:ExampleTestSource"],
        ),
        between(
            "alias_target_is_detected_if_actual_label_changed",
            ALIAS_ADD_TARGET,
            ALIAS_CHANGE_ACTUAL,
            &["//java/example:example_test"],
        ),
    ]
}

/// `target-determinator` option scenarios. Each builds its own history from
/// fixtures in an empty repository.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn flag_catalog() -> Vec<Scenario> {
    let sentinel = || TextExpectation::Equals(INVOCATION_ERROR_SENTINEL.to_owned());

    vec![
        fresh_pair("target_pattern_flag_all", TWO_LANGUAGES_OF_TESTS, BAZELRC_TEST_ENV).check(
            td_check(TdFlags::targets("//..."))
                .expect(&[EXAMPLE_TEST, OTHER_EXAMPLE_TEST, SH_TEST]),
        ),
        fresh_pair("target_pattern_flag_java", TWO_LANGUAGES_OF_TESTS, BAZELRC_TEST_ENV)
            .check(td_check(TdFlags::targets("//java/...")).expect(&[EXAMPLE_TEST, OTHER_EXAMPLE_TEST])),
        fresh_pair("target_pattern_flag_one_target", TWO_LANGUAGES_OF_TESTS, BAZELRC_TEST_ENV)
            .check(td_check(TdFlags::targets(EXAMPLE_TEST)).expect(&[EXAMPLE_TEST])),
        fresh_pair(
            "target_pattern_flag_one_target_not_affected",
            TWO_NATIVE_TESTS_BAZEL5_4_0,
            TWO_TESTS,
        )
        .check(td_check(TdFlags::targets(EXAMPLE_TEST)).expect(&[EXAMPLE_TEST])),
        fresh_pair("target_pattern_flag_query_before_was_error", NO_TARGETS, ONE_TEST)
            .check(td_check(TdFlags::targets("//java/...")).expect(&[EXAMPLE_TEST])),
        fresh_pair("target_pattern_flag_query_before_was_error_verbose", NO_TARGETS, ONE_TEST)
            .check(
                td_check(TdFlags::targets("//java/...").extra(&["--verbose"]))
                    .output_only()
                    .stdout(TextExpectation::Equals(format!(
                        "{EXAMPLE_TEST} Changes: ErrorInQueryBefore\n"
                    ))),
            ),
        fresh_pair("target_pattern_flag_query_before_was_error_when_fatal", NO_TARGETS, ONE_TEST)
            .check(
                td_check(
                    TdFlags::targets("//java/...")
                        .extra(&["--before-query-error-behavior=fatal"]),
                )
                .fails()
                .stdout(sentinel())
                .stderr(TextExpectation::Contains(
                    "failed to query at revision 'before'".to_owned(),
                )),
            ),
        fresh_pair("fail_for_unclean_repository_with_enforce_clean", TWO_TESTS, HAS_JVM_FLAGS)
            .step(Step::create_file(UNTRACKED_FILE))
            .check(
                td_check(TdFlags::targets("//...").enforce_clean())
                    .fails()
                    .stdout(sentinel()),
            ),
        fresh_pair("ignores_ignored_file", ONE_TEST_WITH_GITIGNORE, TWO_TESTS_WITH_GITIGNORE)
            .step(Step::create_file(IGNORED_FILE))
            .check(
                td_check(TdFlags::targets("//...").enforce_clean()).expect(&[OTHER_EXAMPLE_TEST]),
            )
            .step(Step::exists(IGNORED_FILE)),
        fresh_pair(
            "fails_if_changing_commits_causes_an_ignored_file_to_become_untracked",
            ONE_TEST,
            TWO_TESTS_WITH_GITIGNORE,
        )
        .step(Step::create_file(IGNORED_FILE))
        .check(
            td_check(TdFlags::targets("//...").enforce_clean())
                .fails()
                .stdout(sentinel())
                .stderr(TextExpectation::Contains(
                    "repository was not clean after checking out revision 'before'".to_owned(),
                )),
        ),
        Scenario::fresh("fail_for_unclean_submodule_with_enforce_clean")
            .only_for(target_determinator::NAME)
            .step(Step::NewRepo("submodule".to_owned()))
            .step(Step::ReplaceIn {
                repo: "submodule".to_owned(),
                snapshot: EMPTY_SUBMODULE.to_owned(),
            })
            .step(Step::CommitIn {
                repo: "submodule".to_owned(),
                message: "empty submodule".to_owned(),
            })
            .step(Step::replace(SIMPLE_JAVA_LIBRARY_TARGETS))
            .step(Step::commit("simple java library targets"))
            .step(Step::AddSubmodule {
                repo: "submodule".to_owned(),
                path: "demo-submodule".to_owned(),
            })
            .step(Step::commit("add submodule"))
            .step(Step::ReplaceIn {
                repo: "submodule".to_owned(),
                snapshot: ADD_DEPENDENT_ON_SIMPLE_JAVA_LIBRARY.to_owned(),
            })
            .step(Step::CommitIn {
                repo: "submodule".to_owned(),
                message: "add dependent on simple java library".to_owned(),
            })
            .step(Step::PullSubmodule("demo-submodule".to_owned()))
            .step(Step::Commit {
                message: "update submodule".to_owned(),
                capture: Some(BEFORE.to_owned()),
                extra_paths: vec!["demo-submodule".to_owned()],
            })
            .step(Step::Move {
                from: "demo-submodule".to_owned(),
                to: "demo-submodule-2".to_owned(),
            })
            .step(Step::commit("move submodule"))
            .step(Step::create_file("demo-submodule-2/untracked-file"))
            .check(
                td_check(TdFlags::targets("//...").enforce_clean())
                    .fails()
                    .stdout(sentinel()),
            ),
        fresh_pair("worktree_creation", ONE_TEST, TWO_TESTS)
            .step(Step::create_file(UNTRACKED_FILE))
            .check(td_check(TdFlags::targets("//...").keep_worktree()).expect(&[OTHER_EXAMPLE_TEST]))
            .step(Step::AssertWorktreeCache { present: true })
            .check(td_check(TdFlags::targets("//...")).expect(&[OTHER_EXAMPLE_TEST]))
            .step(Step::AssertWorktreeCache { present: false }),
        fresh_pair("changed_configuration_verbose", TWO_LANGUAGES_OF_TESTS, BAZELRC_AFFECTING_JAVA)
            .check(
                td_check(TdFlags::targets(EXAMPLE_TEST).extra(&["--verbose"]))
                    .output_only()
                    .stdout(TextExpectation::Contains("-source 7 -target 7".to_owned())),
            ),
        fresh_pair("startup_opts_ignoring_bazelrc", TWO_LANGUAGES_OF_TESTS, BAZELRC_TEST_ENV)
            .check(td_check(
                TdFlags::targets("//...").extra(&["--bazel-startup-opts=--noworkspace_rc"]),
            )),
    ]
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Capture key for the "before" commit of fresh scenarios.
const BEFORE: &str = "before";

fn snapshot(name: &str) -> Rev {
    Rev::Snapshot(name.to_owned())
}

fn chmod(path: &str, mode: u32) -> Step {
    Step::SetMode {
        path: path.to_owned(),
        mode,
    }
}

/// A corpus scenario with one check from `before` to `after`.
fn between(name: &str, before: &str, after: &str, expected: &[&str]) -> Scenario {
    Scenario::corpus(name).check(Check::between(before, after).expect(expected))
}

/// A fresh `target-determinator` scenario with two commits, the first
/// captured as [`BEFORE`].
fn fresh_pair(name: &str, before: &str, after: &str) -> Scenario {
    Scenario::fresh(name)
        .only_for(target_determinator::NAME)
        .step(Step::replace(before))
        .step(Step::commit_as(before, BEFORE))
        .step(Step::replace(after))
        .step(Step::commit(after))
}

/// Flags for a `target-determinator` check, in the order the tool's own
/// tests pass them.
struct TdFlags {
    targets: &'static str,
    extra: Vec<&'static str>,
    enforce_clean: bool,
    delete_cached_worktree: bool,
}

impl TdFlags {
    const fn targets(pattern: &'static str) -> Self {
        Self {
            targets: pattern,
            extra: Vec::new(),
            enforce_clean: false,
            delete_cached_worktree: true,
        }
    }

    fn extra(mut self, flags: &[&'static str]) -> Self {
        self.extra.extend_from_slice(flags);
        self
    }

    const fn enforce_clean(mut self) -> Self {
        self.enforce_clean = true;
        self
    }

    const fn keep_worktree(mut self) -> Self {
        self.delete_cached_worktree = false;
        self
    }

    fn into_args(self) -> Vec<String> {
        let mut args = vec!["--targets".to_owned(), self.targets.to_owned()];
        args.extend(self.extra.into_iter().map(str::to_owned));
        if self.enforce_clean {
            args.push("--enforce-clean=enforce-clean".to_owned());
        }
        if self.delete_cached_worktree {
            args.push("--delete-cached-worktree".to_owned());
        }
        args
    }
}

/// Compare the captured "before" commit with the current checkout.
fn td_check(flags: TdFlags) -> Check {
    let mut check = Check::new(Rev::Captured(BEFORE.to_owned()));
    check.flags = Some(flags.into_args());
    check
}
