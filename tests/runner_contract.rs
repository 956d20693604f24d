//! End-to-end runner behavior against fake determinators.
//!
//! Corpus scenarios clone the bundled fixture corpus; fresh scenarios build
//! their history from the same fixtures.

#![cfg(unix)]

mod common;

use common::{catalog_scenarios, fake_bazel_diff, fake_target_determinator, fixtures, run_with};
use tdc::adapter::FailureCause;
use tdc::label::Label;
use tdc::matcher::{MatchPolicy, ViolationKind};
use tdc::profile::AdapterProfile;
use tdc::runner::{Phase, ScenarioFailure};
use tdc::scenario::commits::{ONE_TEST, TWO_TESTS};
use tdc::scenario::{Check, Scenario, TextExpectation};
use tdc::{RunOptions, Runner, SuiteReport, Verdict};
use tempfile::TempDir;

const EXAMPLE_TEST: &str = "//java/example:ExampleTest";
const OTHER_EXAMPLE_TEST: &str = "//java/example:OtherExampleTest";

fn only_report(suite: &SuiteReport) -> &Verdict {
    assert_eq!(suite.reports.len(), 1, "expected exactly one report: {suite}");
    &suite.reports[0].verdict
}

fn failure(suite: &SuiteReport) -> (Phase, &ScenarioFailure) {
    match only_report(suite) {
        Verdict::Failed { phase, failure } => (*phase, failure),
        other => panic!("expected a failure, got {other:?}\n{suite}"),
    }
}

fn run_one(
    prelude: &str,
    profile: &AdapterProfile,
    scenario: Scenario,
    options: RunOptions,
) -> SuiteReport {
    let bin = TempDir::new().unwrap();
    let td = fake_target_determinator(bin.path(), prelude);
    run_with(&td, profile, &[scenario], options)
}

// ---------------------------------------------------------------------------
// Passing catalogs
// ---------------------------------------------------------------------------

#[test]
fn corpus_scenarios_pass_against_a_faithful_determinator() {
    let bin = TempDir::new().unwrap();
    let td = fake_target_determinator(bin.path(), "");
    let scenarios = catalog_scenarios(&[
        "added_target_native",
        "deleted_target_native",
        "branch_revision",
        "succeed_for_unclean_ignored_files",
    ]);

    let suite = run_with(
        &td,
        &AdapterProfile::target_determinator(),
        &scenarios,
        RunOptions::default(),
    );

    assert!(suite.is_success(), "{suite}");
    assert_eq!(suite.counts.passed, 4, "{suite}");
}

#[test]
fn fresh_scenarios_build_their_own_history() {
    let bin = TempDir::new().unwrap();
    let td = fake_target_determinator(bin.path(), "");
    let scenarios = catalog_scenarios(&[
        "fail_for_unclean_repository_with_enforce_clean",
        "ignores_ignored_file",
        "fail_for_unclean_submodule_with_enforce_clean",
    ]);

    let suite = run_with(
        &td,
        &AdapterProfile::target_determinator(),
        &scenarios,
        RunOptions::default(),
    );

    assert!(suite.is_success(), "{suite}");
    assert_eq!(suite.counts.passed, 3, "{suite}");
}

#[test]
fn parallel_runs_report_in_catalog_order() {
    let bin = TempDir::new().unwrap();
    let td = fake_target_determinator(bin.path(), "");
    let names = [
        "added_target_native",
        "deleted_target_native",
        "branch_revision",
        "ignores_ignored_file",
    ];
    let scenarios = catalog_scenarios(&names);

    let suite = run_with(
        &td,
        &AdapterProfile::target_determinator(),
        &scenarios,
        RunOptions {
            jobs: 3,
            ..RunOptions::default()
        },
    );

    let reported: Vec<&str> = suite.reports.iter().map(|r| r.scenario.as_str()).collect();
    assert_eq!(reported, names);
    assert!(suite.is_success(), "{suite}");
}

#[test]
fn filter_selects_scenarios_by_glob() {
    let bin = TempDir::new().unwrap();
    let td = fake_target_determinator(bin.path(), "");
    let scenarios = catalog_scenarios(&[
        "added_target_native",
        "deleted_target_native",
        "branch_revision",
    ]);

    let suite = run_with(
        &td,
        &AdapterProfile::target_determinator(),
        &scenarios,
        RunOptions {
            filter: Some(glob::Pattern::new("*_native").unwrap()),
            ..RunOptions::default()
        },
    );

    let reported: Vec<&str> = suite.reports.iter().map(|r| r.scenario.as_str()).collect();
    assert_eq!(reported, ["added_target_native", "deleted_target_native"]);
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[test]
fn missing_targets_fail_in_the_match_phase() {
    let scenario = Scenario::corpus("missing")
        .check(Check::between(ONE_TEST, TWO_TESTS).expect(&[EXAMPLE_TEST, OTHER_EXAMPLE_TEST]));
    let suite = run_one(
        "",
        &AdapterProfile::target_determinator(),
        scenario,
        RunOptions::default(),
    );

    let (phase, failure) = failure(&suite);
    assert_eq!(phase, Phase::Match);
    let ScenarioFailure::Match { violation, stdout, .. } = failure else {
        panic!("expected a match failure, got {failure}");
    };
    assert_eq!(violation.kind, ViolationKind::Missing);
    assert!(violation.missing.contains(&Label::normalize(EXAMPLE_TEST).unwrap()));
    assert!(stdout.contains("OtherExampleTest"), "stdout: {stdout}");
}

#[test]
fn over_building_fails_unless_the_valve_is_open() {
    let scenario = || Scenario::corpus("over").check(Check::between(ONE_TEST, TWO_TESTS));
    let profile = AdapterProfile::target_determinator();

    let strict = run_one("", &profile, scenario(), RunOptions::default());
    let (phase, failure) = failure(&strict);
    assert_eq!(phase, Phase::Match);
    assert!(matches!(
        failure,
        ScenarioFailure::Match { violation, .. } if violation.kind == ViolationKind::OverBuilt
    ));

    let lenient = run_one(
        "",
        &profile,
        scenario(),
        RunOptions {
            policy: MatchPolicy {
                allow_over_building: true,
            },
            ..RunOptions::default()
        },
    );
    match only_report(&lenient) {
        Verdict::Passed { warnings } => {
            assert_eq!(warnings.len(), 1, "{warnings:?}");
            assert!(warnings[0].contains("OtherExampleTest"), "{warnings:?}");
        }
        other => panic!("expected a pass with a warning, got {other:?}"),
    }
}

#[test]
fn profile_tolerance_requires_over_building() {
    // Tolerated by the target-determinator profile.
    const TOLERATED: &str = "refactoring_starlark_rule_is_no_op";
    let profile = AdapterProfile::target_determinator();

    let over_built = run_one(
        "",
        &profile,
        Scenario::corpus(TOLERATED).check(Check::between(ONE_TEST, TWO_TESTS)),
        RunOptions::default(),
    );
    assert!(over_built.is_success(), "{over_built}");

    let exact = run_one(
        "",
        &profile,
        Scenario::corpus(TOLERATED).check(Check::between(TWO_TESTS, ONE_TEST)),
        RunOptions::default(),
    );
    let (phase, failure) = failure(&exact);
    assert_eq!(phase, Phase::Match);
    assert!(matches!(
        failure,
        ScenarioFailure::Match { violation, .. } if violation.kind == ViolationKind::StaleTolerance
    ));
}

#[test]
fn stdout_expectations_are_checked() {
    let scenario = Scenario::corpus("stdout").check(
        Check::between(ONE_TEST, TWO_TESTS)
            .output_only()
            .stdout(TextExpectation::Equals("nothing\n".to_owned())),
    );
    let suite = run_one(
        "",
        &AdapterProfile::target_determinator(),
        scenario,
        RunOptions::default(),
    );

    let (phase, failure) = failure(&suite);
    assert_eq!(phase, Phase::Match);
    assert!(
        matches!(failure, ScenarioFailure::Output { stream: "stdout", actual, .. } if actual.contains("OtherExampleTest")),
        "{failure}"
    );
}

// ---------------------------------------------------------------------------
// Invocation failures
// ---------------------------------------------------------------------------

#[test]
fn unexpected_failure_carries_output_and_partial_targets() {
    let suite = run_one(
        &format!("echo '{EXAMPLE_TEST}'; echo boom >&2; exit 3"),
        &AdapterProfile::target_determinator(),
        Scenario::corpus("crash").check(
            Check::between(ONE_TEST, TWO_TESTS).expect(&[OTHER_EXAMPLE_TEST]),
        ),
        RunOptions::default(),
    );

    let (phase, failure) = failure(&suite);
    assert_eq!(phase, Phase::InvokeAdapter);
    let ScenarioFailure::Determination(error) = failure else {
        panic!("expected a determination failure, got {failure}");
    };
    assert_eq!(error.cause, FailureCause::Exit(Some(3)));
    assert!(error.stderr.contains("boom"));
    assert!(error.partial.contains(&Label::normalize(EXAMPLE_TEST).unwrap()));
}

#[test]
fn expected_failure_that_succeeds_is_reported() {
    let suite = run_one(
        "",
        &AdapterProfile::target_determinator(),
        Scenario::corpus("should_fail").check(Check::between(ONE_TEST, TWO_TESTS).fails()),
        RunOptions::default(),
    );

    let (phase, failure) = failure(&suite);
    assert_eq!(phase, Phase::InvokeAdapter);
    assert!(
        matches!(failure, ScenarioFailure::UnexpectedSuccess { stdout } if stdout.contains("OtherExampleTest")),
        "{failure}"
    );
}

#[test]
fn expected_failure_matches_the_partial_payload() {
    let suite = run_one(
        &format!("echo '{OTHER_EXAMPLE_TEST}'; exit 1"),
        &AdapterProfile::target_determinator(),
        Scenario::corpus("partial").check(
            Check::between(ONE_TEST, TWO_TESTS)
                .fails()
                .expect(&[OTHER_EXAMPLE_TEST]),
        ),
        RunOptions::default(),
    );
    assert!(suite.is_success(), "{suite}");
}

// ---------------------------------------------------------------------------
// Workspace hygiene and materialization
// ---------------------------------------------------------------------------

#[test]
fn determinator_deleting_ignored_files_fails_hygiene() {
    let bin = TempDir::new().unwrap();
    let td = fake_target_determinator(bin.path(), "rm -rf ignored-directory");
    let suite = run_with(
        &td,
        &AdapterProfile::target_determinator(),
        &catalog_scenarios(&["added_target_native"]),
        RunOptions::default(),
    );

    let (phase, failure) = failure(&suite);
    assert_eq!(phase, Phase::HygieneCheck);
    assert!(failure.to_string().contains("some-file"), "{failure}");
}

#[test]
fn unknown_snapshot_fails_before_materializing() {
    let suite = run_one(
        "",
        &AdapterProfile::target_determinator(),
        Scenario::corpus("unknown").check(Check::between("v1/no-such-snapshot", ONE_TEST)),
        RunOptions::default(),
    );

    let (phase, failure) = failure(&suite);
    assert_eq!(phase, Phase::Init);
    assert!(matches!(failure, ScenarioFailure::Materialization(_)), "{failure}");
    assert!(failure.to_string().contains("v1/no-such-snapshot"), "{failure}");
}

#[test]
fn fresh_scenarios_are_skipped_without_fixtures() {
    let bin = TempDir::new().unwrap();
    let td = fake_target_determinator(bin.path(), "");
    let profile = AdapterProfile::target_determinator();
    let corpus = fixtures();
    let runner = Runner::new(&td, &profile, &corpus, None, RunOptions::default());

    let suite = runner.run_all(&catalog_scenarios(&["ignores_ignored_file"]));
    assert!(
        matches!(only_report(&suite), Verdict::Skipped { reason } if reason.contains("fixture")),
        "{suite}"
    );
}

// ---------------------------------------------------------------------------
// Profiles and reports
// ---------------------------------------------------------------------------

#[test]
fn skipped_scenarios_never_invoke_the_adapter() {
    // Exits non-zero if ever invoked.
    let suite = run_one(
        "exit 3",
        &AdapterProfile::bazel_diff(),
        catalog_scenarios(&["chmod_file"]).remove(0),
        RunOptions::default(),
    );

    match only_report(&suite) {
        Verdict::Skipped { reason } => assert!(reason.starts_with("bazel-diff"), "{reason}"),
        other => panic!("expected a skip, got {other:?}"),
    }
}

#[test]
fn adapter_restricted_scenarios_are_not_selected() {
    let bin = TempDir::new().unwrap();
    let bazel_diff = fake_bazel_diff(bin.path(), "");
    let suite = run_with(
        &bazel_diff,
        &AdapterProfile::bazel_diff(),
        &catalog_scenarios(&["ignores_ignored_file", "added_target_native"]),
        RunOptions::default(),
    );

    let reported: Vec<&str> = suite.reports.iter().map(|r| r.scenario.as_str()).collect();
    assert_eq!(reported, ["added_target_native"]);
    assert!(suite.is_success(), "{suite}");
}

#[test]
fn json_report_has_a_status_per_scenario() {
    let bin = TempDir::new().unwrap();
    let td = fake_target_determinator(bin.path(), "");
    let suite = run_with(
        &td,
        &AdapterProfile::bazel_diff(),
        &catalog_scenarios(&["added_target_native", "chmod_file"]),
        RunOptions::default(),
    );

    let json = serde_json::to_value(&suite).unwrap();
    assert_eq!(json["adapter"], "target-determinator");
    assert_eq!(json["counts"]["passed"], 1);
    assert_eq!(json["counts"]["skipped"], 1);
    assert_eq!(json["reports"][0]["scenario"], "added_target_native");
    assert_eq!(json["reports"][0]["status"], "passed");
    assert_eq!(json["reports"][1]["status"], "skipped");
    assert!(json["reports"][1]["reason"].is_string());
}
