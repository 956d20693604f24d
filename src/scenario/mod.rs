//! Data-driven scenarios.
//!
//! A [`Scenario`] is a named list of [`Step`]s executed against one private
//! workspace. Steps build the workspace up (check out corpus snapshots,
//! commit fixture trees, plant untracked files, wire submodules), invoke the
//! determinator ([`Step::Determine`]) and assert on side effects.
//!
//! The shared catalog ([`catalog`]) applies to every adapter; the flag
//! catalog ([`flag_catalog`]) exercises `target-determinator` options.

mod catalog;
pub mod commits;

use std::fmt;

pub use catalog::{catalog, flag_catalog};

/// The shared catalog followed by the flag catalog.
#[must_use]
pub fn all() -> Vec<Scenario> {
    let mut scenarios = catalog();
    scenarios.extend(flag_catalog());
    scenarios
}

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

/// How a scenario's workspace starts out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// A clone of the shared corpus; snapshots are checked out
    /// by name.
    CorpusClone,
    /// An empty repository; snapshots are copied in from the fixture corpus
    /// and committed.
    Fresh,
}

/// A revision as a scenario refers to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rev {
    /// A corpus snapshot name (a tag in the corpus repository).
    Snapshot(String),
    /// Passed through verbatim, e.g. `HEAD^` or a branch the scenario made.
    Literal(String),
    /// The commit recorded by an earlier [`Step::Commit`] under this key.
    Captured(String),
}

impl fmt::Display for Rev {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot(name) | Self::Literal(name) => f.write_str(name),
            Self::Captured(key) => write!(f, "<{key}>"),
        }
    }
}

/// An expectation on one captured output stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextExpectation {
    Equals(String),
    Contains(String),
}

impl TextExpectation {
    #[must_use]
    pub fn matches(&self, actual: &str) -> bool {
        match self {
            Self::Equals(want) => actual == want,
            Self::Contains(want) => actual.contains(want.as_str()),
        }
    }
}

impl fmt::Display for TextExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(want) => write!(f, "equal to {want:?}"),
            Self::Contains(want) => write!(f, "containing {want:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Check
// ---------------------------------------------------------------------------

/// One determinator invocation and what it must produce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Check {
    pub before: Rev,
    /// Checked out (with submodules) before invoking; `None` leaves the
    /// current checkout as the "after" state.
    pub after: Option<Rev>,
    /// Explicit flags; `None` uses the adapter's defaults.
    pub flags: Option<Vec<String>>,
    pub expected: Vec<String>,
    pub forbidden: Vec<String>,
    pub allow_over_builds: bool,
    /// The invocation must fail; its partial payload is then matched.
    pub expect_failure: bool,
    /// Whether the reported labels are matched at all. Off for checks that
    /// only inspect free-form output.
    pub match_targets: bool,
    pub stdout: Option<TextExpectation>,
    pub stderr: Option<TextExpectation>,
}

impl Check {
    /// Compare `before` against the current checkout.
    #[must_use]
    pub const fn new(before: Rev) -> Self {
        Self {
            before,
            after: None,
            flags: None,
            expected: Vec::new(),
            forbidden: Vec::new(),
            allow_over_builds: false,
            expect_failure: false,
            match_targets: true,
            stdout: None,
            stderr: None,
        }
    }

    /// Check out corpus snapshot `after`, then compare with snapshot
    /// `before`.
    #[must_use]
    pub fn between(before: &str, after: &str) -> Self {
        Self::new(Rev::Snapshot(before.to_owned())).after(Rev::Snapshot(after.to_owned()))
    }

    #[must_use]
    pub fn after(mut self, rev: Rev) -> Self {
        self.after = Some(rev);
        self
    }

    #[must_use]
    pub fn expect(mut self, labels: &[&str]) -> Self {
        self.expected = labels.iter().map(|l| (*l).to_owned()).collect();
        self
    }

    #[must_use]
    pub fn forbid(mut self, labels: &[&str]) -> Self {
        self.forbidden = labels.iter().map(|l| (*l).to_owned()).collect();
        self
    }

    #[must_use]
    pub const fn allow_over_builds(mut self) -> Self {
        self.allow_over_builds = true;
        self
    }

    #[must_use]
    pub fn flags(mut self, flags: &[&str]) -> Self {
        self.flags = Some(flags.iter().map(|f| (*f).to_owned()).collect());
        self
    }

    #[must_use]
    pub const fn fails(mut self) -> Self {
        self.expect_failure = true;
        self
    }

    /// Skip label matching; only output expectations apply.
    #[must_use]
    pub const fn output_only(mut self) -> Self {
        self.match_targets = false;
        self
    }

    #[must_use]
    pub fn stdout(mut self, expectation: TextExpectation) -> Self {
        self.stdout = Some(expectation);
        self
    }

    #[must_use]
    pub fn stderr(mut self, expectation: TextExpectation) -> Self {
        self.stderr = Some(expectation);
        self
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// One action in a scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Check out a revision and update submodules.
    Checkout(Rev),
    /// Create a branch at HEAD and switch to it.
    CheckoutBranch(String),
    /// Set permission bits on a path.
    SetMode { path: String, mode: u32 },
    /// Create an empty, untracked file.
    CreateFile(String),
    /// Replace the main workspace contents with a fixture snapshot.
    Replace(String),
    /// Commit the main workspace, optionally recording the commit.
    Commit {
        message: String,
        capture: Option<String>,
        extra_paths: Vec<String>,
    },
    /// Create a sibling repository, referred to by `key`.
    NewRepo(String),
    /// Replace a sibling repository's contents with a fixture snapshot.
    ReplaceIn { repo: String, snapshot: String },
    /// Commit a sibling repository.
    CommitIn { repo: String, message: String },
    /// Register a sibling repository as a submodule at `path`.
    AddSubmodule { repo: String, path: String },
    /// Fast-forward the submodule checked out at `path`.
    PullSubmodule(String),
    /// `git mv` a tracked path.
    Move { from: String, to: String },
    /// Invoke the determinator.
    Determine(Check),
    /// Assert a path exists (or does not) after the previous steps.
    AssertExists { path: String, present: bool },
    /// Assert the checked-out branch.
    AssertBranch(String),
    /// Assert the determinator's cached worktree exists (or does not).
    AssertWorktreeCache { present: bool },
}

impl Step {
    #[must_use]
    pub fn checkout(snapshot: &str) -> Self {
        Self::Checkout(Rev::Snapshot(snapshot.to_owned()))
    }

    #[must_use]
    pub fn replace(snapshot: &str) -> Self {
        Self::Replace(snapshot.to_owned())
    }

    #[must_use]
    pub fn commit(message: &str) -> Self {
        Self::Commit {
            message: message.to_owned(),
            capture: None,
            extra_paths: Vec::new(),
        }
    }

    /// Commit and record the commit as `key`.
    #[must_use]
    pub fn commit_as(message: &str, key: &str) -> Self {
        Self::Commit {
            message: message.to_owned(),
            capture: Some(key.to_owned()),
            extra_paths: Vec::new(),
        }
    }

    #[must_use]
    pub fn create_file(path: &str) -> Self {
        Self::CreateFile(path.to_owned())
    }

    #[must_use]
    pub fn exists(path: &str) -> Self {
        Self::AssertExists {
            path: path.to_owned(),
            present: true,
        }
    }

    #[must_use]
    pub fn absent(path: &str) -> Self {
        Self::AssertExists {
            path: path.to_owned(),
            present: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// A named, self-contained conformance scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    pub origin: Origin,
    /// Restrict to one adapter (by registry name).
    pub only_for: Option<&'static str>,
    pub steps: Vec<Step>,
}

impl Scenario {
    /// A scenario over a clone of the shared corpus.
    #[must_use]
    pub fn corpus(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            origin: Origin::CorpusClone,
            only_for: None,
            steps: Vec::new(),
        }
    }

    /// A scenario that builds its history from fixtures in an empty
    /// repository.
    #[must_use]
    pub fn fresh(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            origin: Origin::Fresh,
            only_for: None,
            steps: Vec::new(),
        }
    }

    #[must_use]
    pub const fn only_for(mut self, adapter: &'static str) -> Self {
        self.only_for = Some(adapter);
        self
    }

    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Append a [`Step::Determine`].
    #[must_use]
    pub fn check(self, check: Check) -> Self {
        self.step(Step::Determine(check))
    }

    /// Whether this scenario applies to `adapter`.
    #[must_use]
    pub fn applies_to(&self, adapter: &str) -> bool {
        self.only_for.is_none_or(|only| only == adapter)
    }

    /// Every snapshot name the scenario resolves, in first-use order
    /// deduplicated.
    #[must_use]
    pub fn snapshots(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for step in &self.steps {
            let names: Vec<&str> = match step {
                Step::Checkout(Rev::Snapshot(name))
                | Step::Replace(name)
                | Step::ReplaceIn { snapshot: name, .. } => vec![name.as_str()],
                Step::Determine(check) => std::iter::once(&check.before)
                    .chain(check.after.as_ref())
                    .filter_map(|rev| match rev {
                        Rev::Snapshot(name) => Some(name.as_str()),
                        _ => None,
                    })
                    .collect(),
                _ => Vec::new(),
            };
            for name in names {
                if !out.contains(&name) {
                    out.push(name);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshots_are_deduplicated_in_first_use_order() {
        let scenario = Scenario::corpus("s")
            .step(Step::checkout("v1/two-tests"))
            .check(Check::between("v1/one-test", "v1/two-tests"))
            .check(Check::new(Rev::Literal("HEAD^".to_owned())));
        assert_eq!(scenario.snapshots(), vec!["v1/two-tests", "v1/one-test"]);
    }

    #[test]
    fn only_for_restricts_adapters() {
        let scenario = Scenario::fresh("s").only_for("target-determinator");
        assert!(scenario.applies_to("target-determinator"));
        assert!(!scenario.applies_to("bazel-diff"));
        assert!(Scenario::fresh("t").applies_to("bazel-diff"));
    }

    #[test]
    fn text_expectations() {
        assert!(TextExpectation::Equals("a\n".to_owned()).matches("a\n"));
        assert!(!TextExpectation::Equals("a".to_owned()).matches("a\n"));
        assert!(TextExpectation::Contains("-source 7".to_owned()).matches("x -source 7 -target 7"));
    }
}
