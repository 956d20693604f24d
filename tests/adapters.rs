//! Adapter invocation contracts, driven by fake tools.

#![cfg(unix)]

mod common;

use common::{fake_bazel_diff, fake_target_determinator, fixtures, write_script};
use tdc::adapter::{
    AffectedTargetsError, BazelDiffer, Determinator, FailureCause, FailurePayload,
};
use tdc::label::{Label, TargetSet};
use tdc::materialize::{DEFAULT_BRANCH, Workspace};
use tdc::scenario::commits::{ONE_TEST, TWO_TESTS};
use tempfile::TempDir;

const OTHER_EXAMPLE_TEST: &str = "//java/example:OtherExampleTest";

/// A workspace on the default branch with `ONE_TEST` then `TWO_TESTS`
/// committed. Returns it with the first commit.
fn two_commits() -> (Workspace, String) {
    let corpus = fixtures();
    let workspace = Workspace::create(None).unwrap();
    workspace
        .replace_contents(&corpus.resolve_snapshot(ONE_TEST).unwrap())
        .unwrap();
    let before = workspace.commit("one test", &[]).unwrap();
    workspace
        .replace_contents(&corpus.resolve_snapshot(TWO_TESTS).unwrap())
        .unwrap();
    workspace.commit("two tests", &[]).unwrap();
    (workspace, before.to_string())
}

fn determination_error<T: std::fmt::Debug>(
    result: Result<T, AffectedTargetsError>,
) -> tdc::adapter::DeterminationError {
    match result {
        Err(AffectedTargetsError::Determination(e)) => e,
        other => panic!("expected a determination error, got {other:?}"),
    }
}

fn labels(raw: &[&str]) -> TargetSet {
    TargetSet::parse(raw.iter().copied()).unwrap()
}

// ---------------------------------------------------------------------------
// target-determinator
// ---------------------------------------------------------------------------

#[test]
fn target_determinator_reports_labels_from_stdout() {
    let bin = TempDir::new().unwrap();
    let td = fake_target_determinator(bin.path(), "");
    let (workspace, before) = two_commits();

    let targets = td.compute_affected_targets(workspace.path(), &before).unwrap();
    assert_eq!(targets, labels(&[OTHER_EXAMPLE_TEST]));

    let determination = td
        .determine(workspace.path(), &before, &td.default_flags())
        .unwrap();
    assert!(determination.command.contains("--working-directory"));
    assert!(determination.command.contains("--ignore-file ignored-directory"));
    assert!(determination.command.ends_with(&before));
    workspace.teardown().unwrap();
}

#[test]
fn non_label_output_from_a_successful_run_is_an_invalid_label() {
    let bin = TempDir::new().unwrap();
    let td = fake_target_determinator(
        bin.path(),
        "echo '//java/example:OtherExampleTest'; echo 'INFO: analysed 3 targets'; exit 0",
    );
    let (workspace, before) = two_commits();

    let err = td.compute_affected_targets(workspace.path(), &before).unwrap_err();
    let AffectedTargetsError::InvalidLabel {
        error,
        determination,
    } = &err
    else {
        panic!("expected an invalid label, got {err:?}");
    };
    assert_eq!(error.value, "INFO: analysed 3 targets");
    assert!(determination.stdout.contains(OTHER_EXAMPLE_TEST));
    workspace.teardown().unwrap();
}

#[test]
fn non_label_output_from_a_failed_run_is_a_determination_error() {
    let bin = TempDir::new().unwrap();
    let td = fake_target_determinator(bin.path(), "echo 'not a label'; exit 2");
    let (workspace, before) = two_commits();

    let err = determination_error(td.compute_affected_targets(workspace.path(), &before));
    assert_eq!(err.cause, FailureCause::Exit(Some(2)));
    assert!(err.stdout.contains("not a label"));
    workspace.teardown().unwrap();
}

#[test]
fn missing_binary_fails_to_spawn() {
    let td = tdc::adapter::TargetDeterminator::new(
        "/nonexistent/target-determinator".into(),
        "bazelisk".to_owned(),
        FailurePayload::Sentinel(Label::normalize("//:sentinel").unwrap()),
    );
    let dir = TempDir::new().unwrap();

    let err = td.determine(dir.path(), "HEAD", &[]).unwrap_err();
    assert!(matches!(err.cause, FailureCause::Spawn(_)), "{err}");
    assert_eq!(err.partial, labels(&["//:sentinel"]));
}

// ---------------------------------------------------------------------------
// bazel-diff
// ---------------------------------------------------------------------------

#[test]
fn bazel_diff_compares_hashes_and_restores_the_branch() {
    let bin = TempDir::new().unwrap();
    let bazel_diff = fake_bazel_diff(bin.path(), "");
    let (workspace, before) = two_commits();

    let targets = bazel_diff
        .compute_affected_targets(workspace.path(), &before)
        .unwrap();
    assert_eq!(targets, labels(&[OTHER_EXAMPLE_TEST]));
    assert_eq!(
        workspace.current_branch().unwrap().as_deref(),
        Some(DEFAULT_BRANCH)
    );
    workspace.teardown().unwrap();
}

#[test]
fn bazel_diff_restores_the_branch_when_hashing_fails() {
    let bin = TempDir::new().unwrap();
    // Hashing only works on a branch, so the "before" checkout fails.
    let bazel_diff = fake_bazel_diff(
        bin.path(),
        r#"git symbolic-ref -q HEAD >/dev/null || { echo "detached HEAD" >&2; exit 1; }"#,
    );
    let (workspace, before) = two_commits();

    let err = determination_error(bazel_diff.compute_affected_targets(workspace.path(), &before));
    assert_eq!(err.cause, FailureCause::Exit(Some(1)));
    assert!(err.stderr.contains("detached HEAD"));
    assert!(err.partial.is_empty());
    assert_eq!(
        workspace.current_branch().unwrap().as_deref(),
        Some(DEFAULT_BRANCH)
    );
    workspace.teardown().unwrap();
}

// ---------------------------------------------------------------------------
// bazel-differ
// ---------------------------------------------------------------------------

#[test]
fn bazel_differ_passes_both_commits_and_reads_the_output_file() {
    let bin = TempDir::new().unwrap();
    // Writes the revisions it was given as labels.
    let script = write_script(
        bin.path(),
        "bazel-differ",
        r#"
s=""; f=""; o=""
while [ $# -gt 0 ]; do
  case "$1" in
    -s) s="$2"; shift 2 ;;
    -f) f="$2"; shift 2 ;;
    -o) o="$2"; shift 2 ;;
    *) shift ;;
  esac
done
printf '//before:%s\n//after:%s\n' "$s" "$f" > "$o"
"#,
    );
    let differ = BazelDiffer::new(script, "bazelisk".to_owned(), FailurePayload::Empty);
    let (workspace, before) = two_commits();
    let after = workspace.rev_parse("HEAD").unwrap().to_string();

    let targets = differ
        .compute_affected_targets(workspace.path(), &before)
        .unwrap();
    assert_eq!(
        targets,
        labels(&[
            format!("//before:{before}").as_str(),
            format!("//after:{after}").as_str(),
        ])
    );
    workspace.teardown().unwrap();
}

#[test]
fn bazel_differ_without_an_output_file_fails_setup() {
    let bin = TempDir::new().unwrap();
    let script = write_script(bin.path(), "bazel-differ", "exit 0\n");
    let differ = BazelDiffer::new(script, "bazelisk".to_owned(), FailurePayload::Empty);
    let (workspace, before) = two_commits();

    let err = differ.determine(workspace.path(), &before, &[]).unwrap_err();
    assert!(matches!(err.cause, FailureCause::Setup(_)), "{err}");
    workspace.teardown().unwrap();
}
