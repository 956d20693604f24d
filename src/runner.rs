//! The scenario runner.
//!
//! Each scenario runs in its own workspace through these phases:
//!
//! ```text
//! Init -> MaterializeBefore -> MaterializeAfter -> InvokeAdapter
//!      -> { success: Match -> HygieneCheck
//!         , failure: expected? Match on the partial payload : fail }
//! ```
//!
//! Every workspace the scenario created is torn down afterwards, whatever
//! the outcome. Results are collected into a [`SuiteReport`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use serde::Serialize;
use tracing::instrument;

use crate::adapter::{DeterminationError, Determinator, target_determinator};
use crate::corpus::Corpus;
use crate::label::{InvalidLabelError, TargetSet};
use crate::materialize::{MaterializationError, Workspace};
use crate::matcher::{MatchPolicy, MatchViolation, TargetExpectation, match_targets};
use crate::profile::{AdapterProfile, IGNORED_DIRECTORY, IGNORED_FILE, Treatment};
use crate::scenario::{Check, Origin, Rev, Scenario, Step, TextExpectation};

// ---------------------------------------------------------------------------
// Phases and failures
// ---------------------------------------------------------------------------

/// Where in its lifecycle a scenario failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Init,
    MaterializeBefore,
    MaterializeAfter,
    InvokeAdapter,
    Match,
    HygieneCheck,
    Teardown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::MaterializeBefore => "materialize-before",
            Self::MaterializeAfter => "materialize-after",
            Self::InvokeAdapter => "invoke-adapter",
            Self::Match => "match",
            Self::HygieneCheck => "hygiene-check",
            Self::Teardown => "teardown",
        };
        f.write_str(name)
    }
}

/// Why a scenario failed.
#[derive(Debug)]
pub enum ScenarioFailure {
    Materialization(MaterializationError),
    InvalidLabel(InvalidLabelError),
    /// The determinator failed and the check did not expect it to.
    Determination(DeterminationError),
    /// The check expected a failure but the determinator succeeded.
    UnexpectedSuccess { stdout: String },
    Match {
        violation: MatchViolation,
        stdout: String,
        stderr: String,
    },
    Output {
        stream: &'static str,
        expectation: TextExpectation,
        actual: String,
    },
    /// An out-of-band artifact was not in the state the scenario declared.
    Hygiene { message: String },
    /// The scenario itself is malformed, e.g. it uses an unknown capture.
    Catalog { message: String },
}

impl fmt::Display for ScenarioFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Materialization(e) => write!(f, "materialization failed: {e}"),
            Self::InvalidLabel(e) => write!(f, "{e}"),
            Self::Determination(e) => write!(f, "determinator failed unexpectedly: {e}"),
            Self::UnexpectedSuccess { stdout } => {
                write!(f, "determinator succeeded but was expected to fail")?;
                if !stdout.is_empty() {
                    write!(f, "\n--- stdout ---\n{}", stdout.trim_end())?;
                }
                Ok(())
            }
            Self::Match {
                violation,
                stdout,
                stderr,
            } => {
                write!(f, "{violation}")?;
                if !stdout.is_empty() {
                    write!(f, "\n--- stdout ---\n{}", stdout.trim_end())?;
                }
                if !stderr.is_empty() {
                    write!(f, "\n--- stderr ---\n{}", stderr.trim_end())?;
                }
                Ok(())
            }
            Self::Output {
                stream,
                expectation,
                actual,
            } => write!(f, "expected {stream} {expectation}, got {actual:?}"),
            Self::Hygiene { message } | Self::Catalog { message } => f.write_str(message),
        }
    }
}

impl std::error::Error for ScenarioFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Materialization(e) => Some(e),
            Self::InvalidLabel(e) => Some(e),
            Self::Determination(e) => Some(e),
            Self::Match { violation, .. } => Some(violation),
            _ => None,
        }
    }
}

impl From<MaterializationError> for ScenarioFailure {
    fn from(e: MaterializationError) -> Self {
        Self::Materialization(e)
    }
}

impl From<InvalidLabelError> for ScenarioFailure {
    fn from(e: InvalidLabelError) -> Self {
        Self::InvalidLabel(e)
    }
}

/// A failure together with the phase it happened in.
#[derive(Debug)]
struct PhaseError {
    phase: Phase,
    failure: ScenarioFailure,
}

trait InPhase<T> {
    fn in_phase(self, phase: Phase) -> Result<T, PhaseError>;
}

impl<T, E: Into<ScenarioFailure>> InPhase<T> for Result<T, E> {
    fn in_phase(self, phase: Phase) -> Result<T, PhaseError> {
        self.map_err(|e| PhaseError {
            phase,
            failure: e.into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// The outcome of one scenario.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Verdict {
    Passed {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
    },
    Failed {
        phase: Phase,
        #[serde(serialize_with = "serialize_display")]
        failure: ScenarioFailure,
    },
    Skipped {
        reason: String,
    },
}

fn serialize_display<S: serde::Serializer>(
    value: &ScenarioFailure,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl Verdict {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub adapter: String,
    #[serde(flatten)]
    pub verdict: Verdict,
    pub duration_ms: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Results of running a set of scenarios against one adapter.
#[derive(Debug, Serialize)]
pub struct SuiteReport {
    pub adapter: String,
    pub counts: Counts,
    pub reports: Vec<ScenarioReport>,
}

impl SuiteReport {
    fn new(adapter: &str, reports: Vec<ScenarioReport>) -> Self {
        let mut counts = Counts::default();
        for report in &reports {
            match report.verdict {
                Verdict::Passed { .. } => counts.passed += 1,
                Verdict::Failed { .. } => counts.failed += 1,
                Verdict::Skipped { .. } => counts.skipped += 1,
            }
        }
        Self {
            adapter: adapter.to_owned(),
            counts,
            reports,
        }
    }

    /// No scenario failed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.counts.failed == 0
    }

    /// The report for `scenario`, if it ran.
    #[must_use]
    pub fn get(&self, scenario: &str) -> Option<&ScenarioReport> {
        self.reports.iter().find(|r| r.scenario == scenario)
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.reports {
            match &report.verdict {
                Verdict::Passed { warnings } => {
                    writeln!(f, "PASS {} ({} ms)", report.scenario, report.duration_ms)?;
                    for warning in warnings {
                        writeln!(f, "     warning: {warning}")?;
                    }
                }
                Verdict::Skipped { reason } => writeln!(f, "SKIP {}: {reason}", report.scenario)?,
                Verdict::Failed { phase, failure } => {
                    writeln!(f, "FAIL {} [{phase}]", report.scenario)?;
                    for line in failure.to_string().lines() {
                        writeln!(f, "     {line}")?;
                    }
                }
            }
        }
        write!(
            f,
            "{}: {} passed, {} failed, {} skipped",
            self.adapter, self.counts.passed, self.counts.failed, self.counts.skipped
        )
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Run-wide options.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub policy: MatchPolicy,
    /// Reuse one workspace path between scenarios. Ignored when `jobs > 1`.
    pub stable_dir: Option<PathBuf>,
    /// Worker threads; `1` runs scenarios sequentially.
    pub jobs: usize,
    /// Only run scenarios whose names match.
    pub filter: Option<glob::Pattern>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::default(),
            stable_dir: None,
            jobs: 1,
            filter: None,
        }
    }
}

/// Runs scenarios for one adapter.
pub struct Runner<'a> {
    determinator: &'a dyn Determinator,
    profile: &'a AdapterProfile,
    corpus: &'a Corpus,
    fixtures: Option<&'a Corpus>,
    options: RunOptions,
}

impl<'a> Runner<'a> {
    /// `corpus` backs corpus-clone scenarios; `fixtures`, if any, backs
    /// scenarios that build their own history.
    #[must_use]
    pub const fn new(
        determinator: &'a dyn Determinator,
        profile: &'a AdapterProfile,
        corpus: &'a Corpus,
        fixtures: Option<&'a Corpus>,
        options: RunOptions,
    ) -> Self {
        Self {
            determinator,
            profile,
            corpus,
            fixtures,
            options,
        }
    }

    /// Scenarios from `scenarios` this run would execute: those that apply
    /// to the adapter and pass the filter.
    #[must_use]
    pub fn select<'s>(&self, scenarios: &'s [Scenario]) -> Vec<&'s Scenario> {
        scenarios
            .iter()
            .filter(|s| s.applies_to(self.determinator.name()))
            .filter(|s| {
                self.options
                    .filter
                    .as_ref()
                    .is_none_or(|pattern| pattern.matches(&s.name))
            })
            .collect()
    }

    /// Run every selected scenario and collect the results in catalog order.
    #[instrument(skip_all, fields(adapter = self.determinator.name()))]
    pub fn run_all(&self, scenarios: &[Scenario]) -> SuiteReport {
        let selected = self.select(scenarios);
        let jobs = self.options.jobs.clamp(1, selected.len().max(1));
        tracing::info!(scenarios = selected.len(), jobs, "running scenarios");

        let reports = if jobs == 1 {
            selected.iter().map(|s| self.run(s)).collect()
        } else {
            if self.options.stable_dir.is_some() {
                tracing::warn!("stable workspace directory ignored when running in parallel");
            }
            self.run_parallel(&selected, jobs)
        };
        SuiteReport::new(self.determinator.name(), reports)
    }

    fn run_parallel(&self, selected: &[&Scenario], jobs: usize) -> Vec<ScenarioReport> {
        let next = AtomicUsize::new(0);
        let slots: Mutex<Vec<Option<ScenarioReport>>> =
            Mutex::new((0..selected.len()).map(|_| None).collect());

        std::thread::scope(|scope| {
            for _ in 0..jobs {
                scope.spawn(|| {
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        let Some(scenario) = selected.get(i) else {
                            break;
                        };
                        fill_slot(&slots, i, self.run_in(scenario, None));
                    }
                });
            }
        });

        slots
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .into_iter()
            .flatten()
            .collect()
    }

    /// Run one scenario.
    pub fn run(&self, scenario: &Scenario) -> ScenarioReport {
        self.run_in(scenario, self.options.stable_dir.as_deref())
    }

    #[instrument(skip_all, fields(scenario = %scenario.name))]
    fn run_in(&self, scenario: &Scenario, stable_dir: Option<&std::path::Path>) -> ScenarioReport {
        let started = Instant::now();
        let verdict = match self.profile.treatment(&scenario.name) {
            Treatment::Skip(reason) => Verdict::Skipped { reason },
            treatment => {
                let force_over_builds = matches!(treatment, Treatment::AllowOverBuilds(_));
                self.execute(scenario, stable_dir, force_over_builds)
            }
        };

        match &verdict {
            Verdict::Passed { warnings } => {
                tracing::info!(warnings = warnings.len(), "scenario passed");
            }
            Verdict::Failed { phase, failure } => {
                tracing::warn!(%phase, %failure, "scenario failed");
            }
            Verdict::Skipped { reason } => tracing::info!(reason, "scenario skipped"),
        }

        ScenarioReport {
            scenario: scenario.name.clone(),
            adapter: self.determinator.name().to_owned(),
            verdict,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }

    fn execute(
        &self,
        scenario: &Scenario,
        stable_dir: Option<&std::path::Path>,
        force_over_builds: bool,
    ) -> Verdict {
        let source = match scenario.origin {
            Origin::CorpusClone => self.corpus,
            Origin::Fresh => match self.fixtures {
                Some(fixtures) => fixtures,
                None => {
                    return Verdict::Skipped {
                        reason: "no fixture corpus available".to_owned(),
                    };
                }
            },
        };

        let mut execution = Execution {
            runner: self,
            scenario,
            source,
            force_over_builds,
            main: None,
            siblings: BTreeMap::new(),
            captured: BTreeMap::new(),
            hygiene_file: None,
            warnings: Vec::new(),
            phase: Phase::MaterializeBefore,
        };
        let result = execution
            .init(stable_dir)
            .and_then(|()| execution.run_steps());
        let warnings = std::mem::take(&mut execution.warnings);
        let teardown = execution.teardown();

        match (result, teardown) {
            (Err(e), teardown) => {
                if let Err(t) = teardown {
                    tracing::warn!(error = %t, "teardown failed after scenario failure");
                }
                Verdict::Failed {
                    phase: e.phase,
                    failure: e.failure,
                }
            }
            (Ok(()), Err(e)) => Verdict::Failed {
                phase: Phase::Teardown,
                failure: e.into(),
            },
            (Ok(()), Ok(())) => Verdict::Passed { warnings },
        }
    }
}

/// Store `value` at `i`, even if another worker panicked holding the lock.
fn fill_slot<T>(slots: &Mutex<Vec<Option<T>>>, i: usize, value: T) {
    let mut slots = slots.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(slot) = slots.get_mut(i) {
        *slot = Some(value);
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// State of one running scenario. Owns every workspace it creates.
struct Execution<'r, 'a> {
    runner: &'r Runner<'a>,
    scenario: &'r Scenario,
    /// Where snapshots come from.
    source: &'r Corpus,
    force_over_builds: bool,
    main: Option<Workspace>,
    siblings: BTreeMap<String, Workspace>,
    captured: BTreeMap<String, String>,
    /// Planted ignored file that must survive every invocation.
    hygiene_file: Option<PathBuf>,
    warnings: Vec<String>,
    /// Materialization phase; moves on after the first commit or checkout.
    phase: Phase,
}

impl Execution<'_, '_> {
    fn init(&mut self, stable_dir: Option<&std::path::Path>) -> Result<(), PhaseError> {
        let mut workspace = match self.scenario.origin {
            Origin::CorpusClone => {
                // Tags must exist before cloning so the clone carries them.
                for name in self.scenario.snapshots() {
                    self.source.ensure_revision(name).in_phase(Phase::Init)?;
                }
                Workspace::clone_of(self.source.path(), stable_dir).in_phase(Phase::Init)?
            }
            Origin::Fresh => Workspace::create(stable_dir).in_phase(Phase::Init)?,
        };

        if self.scenario.origin == Origin::CorpusClone
            && self.runner.profile.supports_ignored_unadded_files
        {
            let rel = format!("{IGNORED_DIRECTORY}/{IGNORED_FILE}");
            let path = workspace.create_file(&rel).in_phase(Phase::Init)?;
            workspace.preserve(IGNORED_DIRECTORY);
            self.hygiene_file = Some(path);
        }
        self.main = Some(workspace);
        Ok(())
    }

    fn teardown(mut self) -> Result<(), MaterializationError> {
        // Tear everything down, then report the first error.
        let mut first = None;
        let workspaces = self.main.take().into_iter().chain(
            std::mem::take(&mut self.siblings).into_values(),
        );
        for workspace in workspaces {
            if let Err(e) = workspace.teardown() {
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    fn main(&self) -> Result<&Workspace, PhaseError> {
        self.main.as_ref().ok_or_else(|| PhaseError {
            phase: Phase::Init,
            failure: ScenarioFailure::Catalog {
                message: "workspace was not initialized".to_owned(),
            },
        })
    }

    fn sibling(&self, key: &str) -> Result<&Workspace, PhaseError> {
        self.siblings.get(key).ok_or_else(|| self.malformed(format!("unknown repository '{key}'")))
    }

    fn malformed(&self, message: String) -> PhaseError {
        PhaseError {
            phase: self.phase,
            failure: ScenarioFailure::Catalog {
                message: format!("scenario '{}': {message}", self.scenario.name),
            },
        }
    }

    fn resolve(&self, rev: &Rev) -> Result<String, PhaseError> {
        match rev {
            Rev::Snapshot(name) if self.scenario.origin == Origin::CorpusClone => Ok(name.clone()),
            Rev::Snapshot(name) => Err(self.malformed(format!(
                "snapshot '{name}' used as a revision outside a corpus clone"
            ))),
            Rev::Literal(rev) => Ok(rev.clone()),
            Rev::Captured(key) => self
                .captured
                .get(key)
                .cloned()
                .ok_or_else(|| self.malformed(format!("nothing captured as '{key}'"))),
        }
    }

    fn run_steps(&mut self) -> Result<(), PhaseError> {
        let scenario = self.scenario;
        for step in &scenario.steps {
            tracing::debug!(?step, "step");
            self.step(step)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn step(&mut self, step: &Step) -> Result<(), PhaseError> {
        let phase = self.phase;
        match step {
            Step::Checkout(rev) => {
                let rev = self.resolve(rev)?;
                self.main()?.checkout(&rev).in_phase(phase)?;
                self.phase = Phase::MaterializeAfter;
            }
            Step::CheckoutBranch(name) => {
                self.main()?.checkout_branch(name).in_phase(phase)?;
            }
            Step::SetMode { path, mode } => {
                self.main()?.set_mode(path, *mode).in_phase(phase)?;
            }
            Step::CreateFile(path) => {
                self.main()?.create_file(path).in_phase(phase)?;
            }
            Step::Replace(name) => {
                let snapshot = self.source.resolve_snapshot(name).in_phase(phase)?;
                self.main()?.replace_contents(&snapshot).in_phase(phase)?;
            }
            Step::Commit {
                message,
                capture,
                extra_paths,
            } => {
                let extra: Vec<&str> = extra_paths.iter().map(String::as_str).collect();
                let oid = self.main()?.commit(message, &extra).in_phase(phase)?;
                if let Some(key) = capture {
                    self.captured.insert(key.clone(), oid.to_string());
                }
                self.phase = Phase::MaterializeAfter;
            }
            Step::NewRepo(key) => {
                let repo = Workspace::create(None).in_phase(phase)?;
                self.siblings.insert(key.clone(), repo);
            }
            Step::ReplaceIn { repo, snapshot } => {
                let snapshot = self.source.resolve_snapshot(snapshot).in_phase(phase)?;
                self.sibling(repo)?.replace_contents(&snapshot).in_phase(phase)?;
            }
            Step::CommitIn { repo, message } => {
                self.sibling(repo)?.commit(message, &[]).in_phase(phase)?;
            }
            Step::AddSubmodule { repo, path } => {
                let child = self.sibling(repo)?;
                self.main()?.add_submodule(child, path).in_phase(phase)?;
            }
            Step::PullSubmodule(path) => {
                self.main()?.submodule(path).pull().in_phase(phase)?;
            }
            Step::Move { from, to } => {
                self.main()?.move_path(from, to).in_phase(phase)?;
            }
            Step::Determine(check) => self.determine(check)?,
            Step::AssertExists { path, present } => {
                let exists = self.main()?.path().join(path).exists();
                if exists != *present {
                    return Err(hygiene(format!(
                        "expected '{path}' to be {}",
                        if *present { "present" } else { "absent" }
                    )));
                }
            }
            Step::AssertBranch(name) => {
                let branch = self.main()?.current_branch().in_phase(Phase::HygieneCheck)?;
                if branch.as_deref() != Some(name.as_str()) {
                    return Err(hygiene(format!(
                        "expected branch '{name}' to be checked out, found {branch:?}"
                    )));
                }
            }
            Step::AssertWorktreeCache { present } => {
                let workspace = self.main()?.path();
                let Some(worktree) = target_determinator::worktree_path(workspace) else {
                    return Err(hygiene("no home directory for the worktree cache".to_owned()));
                };
                let exists = if *present {
                    worktree.join(".git").exists()
                } else {
                    worktree.exists()
                };
                if exists != *present {
                    return Err(hygiene(format!(
                        "expected cached worktree {} to be {}",
                        worktree.display(),
                        if *present { "present" } else { "absent" }
                    )));
                }
            }
        }
        Ok(())
    }

    fn determine(&mut self, check: &Check) -> Result<(), PhaseError> {
        if let Some(after) = &check.after {
            let after = self.resolve(after)?;
            self.main()?.checkout(&after).in_phase(Phase::MaterializeAfter)?;
            self.phase = Phase::MaterializeAfter;
        }
        let before = self.resolve(&check.before)?;
        let expectation = TargetExpectation {
            expected: TargetSet::parse(check.expected.iter().map(String::as_str))
                .in_phase(Phase::Init)?,
            forbidden: TargetSet::parse(check.forbidden.iter().map(String::as_str))
                .in_phase(Phase::Init)?,
            allow_over_builds: check.allow_over_builds || self.force_over_builds,
        };

        let determinator = self.runner.determinator;
        let flags = check
            .flags
            .clone()
            .unwrap_or_else(|| determinator.default_flags());
        let workspace = self.main()?.path();

        let (actual, stdout, stderr) = match determinator.determine(workspace, &before, &flags) {
            Ok(determination) if check.expect_failure => {
                return Err(PhaseError {
                    phase: Phase::InvokeAdapter,
                    failure: ScenarioFailure::UnexpectedSuccess {
                        stdout: determination.stdout,
                    },
                });
            }
            Ok(determination) => {
                let actual = if check.match_targets {
                    determination.targets().in_phase(Phase::InvokeAdapter)?
                } else {
                    TargetSet::new()
                };
                (actual, determination.stdout, determination.stderr)
            }
            Err(error) if check.expect_failure => {
                tracing::debug!(%error, "determinator failed as expected");
                (error.partial, error.stdout, error.stderr)
            }
            Err(error) => {
                return Err(PhaseError {
                    phase: Phase::InvokeAdapter,
                    failure: ScenarioFailure::Determination(error),
                });
            }
        };

        check_output("stdout", check.stdout.as_ref(), &stdout)?;
        check_output("stderr", check.stderr.as_ref(), &stderr)?;

        if check.match_targets {
            match match_targets(&actual, &expectation, self.runner.options.policy) {
                Ok(outcome) => self.warnings.extend(outcome.warnings),
                Err(violation) => {
                    return Err(PhaseError {
                        phase: Phase::Match,
                        failure: ScenarioFailure::Match {
                            violation,
                            stdout,
                            stderr,
                        },
                    });
                }
            }
        }

        if let Some(file) = &self.hygiene_file
            && !file.exists()
        {
            return Err(hygiene(format!(
                "ignored file {} was removed by the determinator",
                file.display()
            )));
        }
        Ok(())
    }
}

fn hygiene(message: String) -> PhaseError {
    PhaseError {
        phase: Phase::HygieneCheck,
        failure: ScenarioFailure::Hygiene { message },
    }
}

fn check_output(
    stream: &'static str,
    expectation: Option<&TextExpectation>,
    actual: &str,
) -> Result<(), PhaseError> {
    match expectation {
        Some(expectation) if !expectation.matches(actual) => Err(PhaseError {
            phase: Phase::Match,
            failure: ScenarioFailure::Output {
                stream,
                expectation: expectation.clone(),
                actual: actual.to_owned(),
            },
        }),
        _ => Ok(()),
    }
}
