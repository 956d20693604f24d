//! Snapshot names in the shared corpus.
//!
//! Each name is a tag in the remote corpus repository and, for the subset
//! bundled with the harness, a directory under `testdata/`.

pub const NO_TARGETS: &str = "v1/new-branch";
pub const ONE_TEST: &str = "v1/one-test";
pub const ONE_TEST_BAZEL7_0_0: &str = "v1/one-test-bazel-7.0.0";
pub const TWO_TESTS: &str = "v1/two-tests";
pub const HAS_JVM_FLAGS: &str = "v1/has-jvm-flags";
pub const EXPLICIT_DEFAULT_VALUE: &str = "v1/explicit-default-value";
pub const TWO_NATIVE_TESTS_BAZEL5_4_0: &str = "v1/two-native-tests-bazel-5.4.0";
pub const TWO_NATIVE_TESTS_BAZEL6_0_0: &str = "v1/two-native-tests-bazel-6.0.0";
pub const MODIFIED_TEST_SRC: &str = "v1/modified-test-src";
pub const TWO_LANGUAGES_OF_TESTS: &str = "v1/two-languages-of-tests";
pub const BAZELRC_TEST_ENV: &str = "v1/bazelrc-test-env";
pub const BAZELRC_AFFECTING_JAVA: &str = "v1/bazelrc-affecting-java";
pub const SIMPLE_TARGETS_BAZEL5_4_0: &str = "v1/simple-targets-bazel-5.4.0";
pub const SIMPLE_TARGETS_BAZEL6_0_0: &str = "v1/simple-targets-bazel-6.0.0";
pub const ADD_OPTIONAL_PRESENT_EMPTY_BAZELRC: &str = "v1/optional-present-empty-try-import";
pub const SIMPLE_JAVA_LIBRARY_RULE: &str = "v1/simple-java-library-rule";
pub const SIMPLE_JAVA_LIBRARY_TARGETS: &str = "v1/simple-java-library-targets";
pub const SIMPLE_JAVA_LIBRARY_AND_JAVA_TESTS: &str = "v1/simple-java-library-and-java-tests";
pub const CHANGE_TRANSITIVE_FILE: &str = "v1/change-transitive-file";
pub const CHANGE_TRANSITIVE_FILE_BAZEL4_0_0: &str = "v1/change-transitive-file-bazel-4.0.0";
pub const TWO_LANGUAGES_OPTIONAL_MISSING_TRY_IMPORT: &str = "v1/two-languages-missing-try-import";
pub const TWO_LANGUAGES_OPTIONAL_PRESENT_BAZELRC_AFFECTING_JAVA: &str =
    "v1/two-languages-optional-present-bazelrc-affecting-java";
pub const TWO_LANGUAGES_NOOP_IMPORTED_BAZELRC: &str = "v1/two-languages-noop-imported-bazelrc";
pub const TWO_LANGUAGES_IMPORTED_BAZELRC_AFFECTING_JAVA: &str =
    "v1/two-languages-imported-bazelrc-affecting-java";
pub const JAVA_TESTS_AND_SIMPLE_JAVA_RULES: &str = "v1/java-tests-and-simple-java-library-rule";
pub const DEP_ON_STARLARK_TARGET: &str = "v1/dep-on-starlark-target";
pub const CHANGE_STARLARK_RULE_IMPLEMENTATION: &str = "v1/change-starlark-rule-implementation";
pub const NOOP_REFACTOR_STARLARK_RULE_IMPLEMENTATION: &str =
    "v1/noop-refactor-starlark-rule-implementation";
pub const RULES_IN_EXTERNAL_REPO: &str = "v1/move-rules-to-external-repo";
pub const NOOP_REFACTOR_IN_WORKSPACE_FILE: &str = "v1/noop-refactor-in-workspace-file";
pub const ADD_SIMPLE_PACKAGE_RULE: &str = "v1/add-simple-package-rule";
pub const REFACTORED_WORKSPACE_INDIRECTLY: &str = "v1/refactored-workspace-indirectly";
pub const PATHOLOGICAL_RULES_SINGLE_TARGET: &str = "v1/pathological-rules-single-target";
pub const PATHOLOGICAL_RULES_TWO_TARGETS: &str = "v1/pathological-rules-two-targets";
pub const PATHOLOGICAL_RULES_THREE_TARGETS: &str = "v1/pathological-rules-three-targets";
pub const PATHOLOGICAL_RULES_FIVE_TARGETS: &str = "v1/pathological-rules-five-targets";
pub const CHANGE_ATTRIBUTES_VIA_INDIRECTION: &str = "v1/set-flags-via-indirected-rules";
pub const HAS_GLOBS: &str = "v1/globs";
pub const CHANGE_GLOBS: &str = "v1/globs-changed";
pub const ADD_BUILD_FILE_INTERFERING_WITH_GLOBS: &str = "v1/globs-add-interfering-build-file";
pub const BAZELRC_INCLUDED_EMPTY: &str = "v1/bazelrc-included-empty";
pub const JAVA_USED_IN_GENRULE: &str = "v1/java-used-in-genrule";
pub const BAZELRC_INCLUDED_JAVACOPT: &str = "v1/bazelrc-included-javacopt";
pub const BAZELRC_HOST_JAVACOPT: &str = "v1/bazelrc-host-javacopt";
pub const ADD_INDIRECTION_FOR_SIMPLE_JAVA_LIBRARY: &str =
    "v1/add-indirection-for-simple-java-library";
pub const REDUCE_DEPENDENCY_VISIBILITY: &str = "v1/reduce-dependency-visibility";
pub const ONE_TEST_WITH_GITIGNORE: &str = "v1/one-test-with-gitignore";
pub const TWO_TESTS_WITH_GITIGNORE: &str = "v1/two-tests-with-gitignore";
pub const SUBMODULE_ADD_TRIVIAL_SUBMODULE: &str = "v1/submodule-add-trivial-submodule";
pub const SUBMODULE_ADD_DEPENDENT_ON_SIMPLE_JAVA_LIBRARY: &str =
    "v1/submodule-add-dependent-of-simple_java_library";
pub const SUBMODULE_CHANGE_DIRECTORY: &str = "v1/submodule-change-directory";
pub const SUBMODULE_DELETE_SUBMODULE: &str = "v1/submodule-delete-submodule";
pub const ONE_SH_TEST: &str = "v1/sh-test";
pub const SH_TEST_NOT_EXECUTABLE: &str = "v1/sh-test-non-executable";
pub const INCOMPATIBLE_TARGET: &str = "v1/incompatible-target";
pub const INCOMPATIBLE_TARGET_BAZEL7_0_0: &str = "v1/incompatible-target-bazel-7.0.0";
pub const SELECT_TARGET: &str = "v1/platform-specific-selects";
pub const CHANGED_NONLINUX_SRC: &str = "v1/platform-specific-selects-change-non-linux-src";
pub const CHANGED_LINUX_SRC: &str = "v1/platform-specific-selects-change-linux-src";
pub const CHANGED_NONLINUX_DEP: &str = "v1/platform-specific-selects-change-non-linux-dep";
pub const CHANGED_LINUX_DEP: &str = "v1/platform-specific-selects-change-linux-dep";
pub const ALIAS_ADD_TARGET: &str = "v1/alias-add-target";
pub const ALIAS_CHANGE_ACTUAL: &str = "v1/alias-change-actual";
pub const ALIAS_CHANGE_TARGET_THROUGH_ALIAS: &str = "v1/alias-change-target-through-alias";
pub const ALIAS_ADD_TARGET_TO_FILE: &str = "v1/alias-file-add-target";
pub const ALIAS_CHANGE_TARGET_THROUGH_ALIAS_TO_FILE: &str = "v1/alias-file-change-actual";

// Fixture-only snapshots, used to build submodule histories from scratch.
pub const EMPTY_SUBMODULE: &str = "v1/empty-submodule";
pub const ADD_DEPENDENT_ON_SIMPLE_JAVA_LIBRARY: &str = "v1/add-dependent-on-simple-java-library";

/// Branch created locally by the branch-revision scenario.
pub const TWO_TESTS_BRANCH: &str = "two-tests-branch";
