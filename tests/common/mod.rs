//! Shared helpers for the harness integration tests.
//!
//! The determinators here are small shell scripts that mimic the real tools
//! closely enough to drive the runner: they read revisions from the
//! workspace with git and print one label per changed `.java` file.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tdc::adapter::{BazelDiff, FailurePayload, TargetDeterminator};
use tdc::config::bundled_fixtures_dir;
use tdc::corpus::{Corpus, CorpusSource};
use tdc::profile::AdapterProfile;
use tdc::scenario::{self, Scenario};
use tdc::{RunOptions, Runner, SuiteReport};

/// Prints `//<dir>:<Basename>` for every `.java` path read from stdin.
const PATHS_TO_LABELS: &str = r#"
to_labels() {
  while read -r f; do
    echo "//$(dirname "$f"):$(basename "$f" .java)"
  done
}
"#;

/// Command line of `target-determinator`, answered from `git diff`.
///
/// `--enforce-clean=enforce-clean` makes an unclean workspace an error, the
/// way the real tool reports it.
const TARGET_DETERMINATOR: &str = r#"
ws=""; before=""; enforce=0
while [ $# -gt 0 ]; do
  case "$1" in
    --working-directory) ws="$2"; shift 2 ;;
    --bazel|--ignore-file|--targets) shift 2 ;;
    --enforce-clean=enforce-clean) enforce=1; shift ;;
    --*) shift ;;
    *) before="$1"; shift ;;
  esac
done
cd "$ws" || exit 2
__PRELUDE__
if [ "$enforce" = 1 ] && [ -n "$(git status --porcelain)" ]; then
  printf 'Target Determinator invocation Error\n'
  echo "workspace is not clean" >&2
  exit 1
fi
git diff --name-only --diff-filter=AM "$before" HEAD -- '*.java' | to_labels
"#;

/// `bazel-diff generate-hashes` hashes `.java` blobs; `get-impacted-targets`
/// reports the paths whose hash line is new.
const BAZEL_DIFF: &str = r#"
cmd="$1"; shift
ws=""; out=""; before=""; after=""; impacted=""
while [ $# -gt 0 ]; do
  case "$1" in
    -w) ws="$2"; shift 2 ;;
    -b) shift 2 ;;
    -sh) before="$2"; shift 2 ;;
    -fh) after="$2"; shift 2 ;;
    -o) impacted="$2"; shift 2 ;;
    *) out="$1"; shift ;;
  esac
done
case "$cmd" in
  generate-hashes)
    cd "$ws" || exit 2
    __PRELUDE__
    git ls-files -s -- '*.java' > "$out"
    ;;
  get-impacted-targets)
    sort "$before" > "$impacted.before"
    sort "$after" > "$impacted.after"
    comm -13 "$impacted.before" "$impacted.after" | cut -f2 | to_labels > "$impacted"
    rm -f "$impacted.before" "$impacted.after"
    ;;
  *) exit 2 ;;
esac
"#;

/// Write an executable `/bin/sh` script into `dir`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\nset -u\n{PATHS_TO_LABELS}{body}"))
        .expect("failed to write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("failed to chmod script");
    path
}

/// A fake `target-determinator`. `prelude` runs inside the workspace before
/// anything is computed.
pub fn fake_target_determinator(dir: &Path, prelude: &str) -> TargetDeterminator {
    let script = write_script(
        dir,
        "target-determinator",
        &TARGET_DETERMINATOR.replace("__PRELUDE__", prelude),
    );
    TargetDeterminator::new(script, "bazelisk".to_owned(), FailurePayload::PartialStdout)
}

/// A fake `bazel-diff`. `prelude` runs inside the workspace before each
/// `generate-hashes`.
pub fn fake_bazel_diff(dir: &Path, prelude: &str) -> BazelDiff {
    let script = write_script(dir, "bazel-diff", &BAZEL_DIFF.replace("__PRELUDE__", prelude));
    BazelDiff::new(script, "bazelisk".to_owned(), FailurePayload::Empty)
}

/// The bundled fixture corpus, freshly published.
pub fn fixtures() -> Corpus {
    Corpus::open(CorpusSource::Fixtures(bundled_fixtures_dir()))
        .expect("bundled fixture corpus should open")
}

/// Catalog scenarios by name, in the order given.
pub fn catalog_scenarios(names: &[&str]) -> Vec<Scenario> {
    let all = scenario::all();
    names
        .iter()
        .map(|name| {
            all.iter()
                .find(|s| s.name == *name)
                .unwrap_or_else(|| panic!("no scenario named {name}"))
                .clone()
        })
        .collect()
}

/// Run `scenarios` with the fixture corpus backing both corpus clones and
/// fresh repositories.
pub fn run_with(
    determinator: &dyn tdc::adapter::Determinator,
    profile: &AdapterProfile,
    scenarios: &[Scenario],
    options: RunOptions,
) -> SuiteReport {
    let corpus = fixtures();
    let runner = Runner::new(determinator, profile, &corpus, Some(&corpus), options);
    runner.run_all(scenarios)
}

/// Run git in `dir` and assert it succeeds. Returns stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap_or_else(|e| panic!("failed to run git {}: {e}", args.join(" ")));
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        out.status.success(),
        "git {} failed:\nstdout: {stdout}\nstderr: {stderr}",
        args.join(" "),
    );
    stdout.to_string()
}
