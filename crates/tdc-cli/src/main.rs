use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tdc::adapter::{self, target_determinator};
use tdc::config::{DEFAULT_CONFIG_FILE, HarnessConfig};
use tdc::corpus::Corpus;
use tdc::scenario::{self, Origin};
use tdc::{Label, RunOptions, Runner};

mod telemetry;

/// Conformance harness for target determinators
///
/// Runs a catalog of repository scenarios against a target-determinator
/// implementation and checks the labels it reports for each pair of
/// revisions.
///
/// ADAPTER BINARIES:
///
///   Set with [adapters] in tdc.toml, or with TARGET_DETERMINATOR,
///   BAZEL_DIFF and BAZEL_DIFFER.
///
/// CORPUS:
///
///   The upstream testdata repository is cloned into the user cache dir.
///   Point TARGET_DETERMINATOR_TESTDATA_DIR at an existing clone to use
///   that instead.
#[derive(Parser)]
#[command(name = "tdc")]
#[command(version, about)]
#[command(after_help = "See 'tdc <command> --help' for more information on a specific command.")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "TDC_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List scenarios and how an adapter treats them
    List(ListArgs),

    /// Run the scenario catalog against one adapter
    ///
    /// Exits non-zero if any scenario fails.
    Run(RunArgs),

    /// Print the canonical form of each label
    Normalize {
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// Print where target-determinator caches its worktree for DIR
    #[command(name = "worktree-path")]
    WorktreePath { dir: PathBuf },
}

#[derive(Args)]
struct ListArgs {
    /// Only scenarios that apply to this adapter, with its treatment
    #[arg(long)]
    adapter: Option<String>,
}

#[derive(Args)]
struct RunArgs {
    /// Adapter to test
    #[arg(long)]
    adapter: String,

    /// Only run scenarios whose names match this glob
    #[arg(long)]
    filter: Option<String>,

    /// Scenarios to run in parallel
    #[arg(long, default_value_t = 1)]
    jobs: usize,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::List(args) => list(&args),
        Commands::Run(args) => {
            let config = HarnessConfig::from_file_and_env(&cli.config)?;
            if !run(&config, &args)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Normalize { labels } => normalize(&labels),
        Commands::WorktreePath { dir } => {
            let dir = std::path::absolute(&dir)
                .with_context(|| format!("resolving {}", dir.display()))?;
            let path = target_determinator::worktree_path(&dir)
                .context("no home directory to locate the worktree cache")?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn lookup(name: &str) -> Result<&'static adapter::AdapterEntry> {
    adapter::lookup(name).with_context(|| {
        format!(
            "unknown adapter '{name}' (known: {})",
            adapter::names().join(", ")
        )
    })
}

fn list(args: &ListArgs) -> Result<()> {
    let entry = args.adapter.as_deref().map(lookup).transpose()?;
    let profile = entry.map(|e| (e.profile)());

    for scenario in scenario::all() {
        let origin = match scenario.origin {
            Origin::CorpusClone => "corpus",
            Origin::Fresh => "fresh",
        };
        match &profile {
            Some(profile) if !scenario.applies_to(profile.adapter) => {}
            Some(profile) => {
                println!(
                    "{:<70} {origin:<7} {}",
                    scenario.name,
                    profile.treatment(&scenario.name)
                );
            }
            None => {
                let only = scenario
                    .only_for
                    .map(|a| format!(" (only {a})"))
                    .unwrap_or_default();
                println!("{:<70} {origin}{only}", scenario.name);
            }
        }
    }
    Ok(())
}

/// Returns whether every scenario passed.
fn run(config: &HarnessConfig, args: &RunArgs) -> Result<bool> {
    let entry = lookup(&args.adapter)?;
    let profile = (entry.profile)();
    let determinator = (entry.build)(&config.adapters, &profile)?;

    let filter = args
        .filter
        .as_deref()
        .map(glob::Pattern::new)
        .transpose()
        .context("invalid --filter pattern")?;
    if args.jobs == 0 {
        bail!("--jobs must be at least 1");
    }

    let source = config.corpus_source();
    let corpus = Corpus::shared(source.clone())
        .with_context(|| format!("preparing {source}"))?;
    let fixtures = config
        .fixtures_source()
        .map(Corpus::open)
        .transpose()
        .context("preparing fixture corpus")?;

    let options = RunOptions {
        policy: config.match_policy(),
        stable_dir: config.workspace.stable_dir.clone(),
        jobs: args.jobs,
        filter,
    };
    tracing::info!(
        adapter = entry.name,
        jobs = args.jobs,
        filter = args.filter.as_deref().unwrap_or("*"),
        "starting conformance run"
    );
    let runner = Runner::new(
        determinator.as_ref(),
        &profile,
        corpus,
        fixtures.as_ref(),
        options,
    );
    let report = runner.run_all(&scenario::all());
    tracing::info!(
        adapter = entry.name,
        passed = report.counts.passed,
        failed = report.counts.failed,
        skipped = report.counts.skipped,
        "conformance run finished"
    );

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serializing report")?
        );
    } else {
        println!("{report}");
    }
    Ok(report.is_success())
}

fn normalize(labels: &[String]) -> Result<()> {
    for raw in labels {
        let label = Label::normalize(raw)?;
        println!("{label}");
    }
    Ok(())
}
