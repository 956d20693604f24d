//! Harness configuration (`tdc.toml`).
//!
//! Every setting has a default, so a missing file is not an error. After
//! loading, [`HarnessConfig::with_env`] overlays the environment variables the
//! harness has always honored:
//!
//! | Variable                           | Overrides                      |
//! |------------------------------------|--------------------------------|
//! | `TARGET_DETERMINATOR_TESTDATA_DIR` | `corpus.testdata_dir`          |
//! | `TARGET_DETERMINATOR`              | `adapters.target_determinator` |
//! | `BAZEL_DIFF`                       | `adapters.bazel_diff`          |
//! | `BAZEL_DIFFER`                     | `adapters.bazel_differ`        |
//! | `ALLOW_OVER_BUILDING`              | `matching.allow_over_building` |

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::corpus::{CorpusSource, DEFAULT_REMOTE_URL};
use crate::matcher::MatchPolicy;

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "tdc.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level harness configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    #[serde(default)]
    pub corpus: CorpusConfig,

    #[serde(default)]
    pub adapters: AdaptersConfig,

    #[serde(default)]
    pub matching: MatchingConfig,

    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

// ---------------------------------------------------------------------------
// CorpusConfig
// ---------------------------------------------------------------------------

/// Where snapshots come from.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorpusConfig {
    /// An existing local clone of the corpus. Takes precedence over
    /// `remote_url`.
    #[serde(default)]
    pub testdata_dir: Option<PathBuf>,

    /// Corpus repository cloned (and cached) when no local clone is given.
    #[serde(default = "default_remote_url")]
    pub remote_url: String,

    /// Snapshot trees for scenarios that build their own history. Defaults
    /// to the `testdata/` directory shipped with the harness.
    #[serde(default)]
    pub fixtures_dir: Option<PathBuf>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            testdata_dir: None,
            remote_url: default_remote_url(),
            fixtures_dir: None,
        }
    }
}

fn default_remote_url() -> String {
    DEFAULT_REMOTE_URL.to_owned()
}

// ---------------------------------------------------------------------------
// AdaptersConfig
// ---------------------------------------------------------------------------

/// Adapter binaries and the build-tool launcher they are handed.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdaptersConfig {
    #[serde(default)]
    pub target_determinator: Option<PathBuf>,

    #[serde(default)]
    pub bazel_diff: Option<PathBuf>,

    #[serde(default)]
    pub bazel_differ: Option<PathBuf>,

    /// Passed to every adapter as the build tool (default: `"bazelisk"`).
    #[serde(default = "default_launcher")]
    pub launcher: String,
}

impl Default for AdaptersConfig {
    fn default() -> Self {
        Self {
            target_determinator: None,
            bazel_diff: None,
            bazel_differ: None,
            launcher: default_launcher(),
        }
    }
}

fn default_launcher() -> String {
    "bazelisk".to_owned()
}

// ---------------------------------------------------------------------------
// MatchingConfig / WorkspaceConfig
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchingConfig {
    /// Downgrade unexpected extras to warnings.
    #[serde(default)]
    pub allow_over_building: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Materialize every scenario at this one path instead of a fresh temp
    /// directory, so the build tool's server stays warm between scenarios.
    /// Ignored when scenarios run in parallel.
    #[serde(default)]
    pub stable_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading the harness configuration, or building an adapter from it.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl HarnessConfig {
    /// Load configuration from a TOML file.
    ///
    /// - If the file does not exist, returns all defaults (not an error).
    /// - If the file exists but contains invalid TOML or unknown fields,
    ///   returns a [`ConfigError`] with line-level detail.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found) or parse errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML or unknown fields.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })
    }

    /// Overlay environment variables read through `lookup`.
    ///
    /// Empty values are ignored. `ALLOW_OVER_BUILDING` opens the valve only
    /// when it is exactly `true`.
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        if let Some(dir) = var("TARGET_DETERMINATOR_TESTDATA_DIR") {
            self.corpus.testdata_dir = Some(PathBuf::from(dir));
        }
        if let Some(bin) = var("TARGET_DETERMINATOR") {
            self.adapters.target_determinator = Some(PathBuf::from(bin));
        }
        if let Some(bin) = var("BAZEL_DIFF") {
            self.adapters.bazel_diff = Some(PathBuf::from(bin));
        }
        if let Some(bin) = var("BAZEL_DIFFER") {
            self.adapters.bazel_differ = Some(PathBuf::from(bin));
        }
        if let Some(valve) = var("ALLOW_OVER_BUILDING") {
            self.matching.allow_over_building = valve == "true";
        }
        self
    }

    /// [`load`](Self::load) then overlay the process environment.
    ///
    /// # Errors
    /// As for [`load`](Self::load).
    pub fn from_file_and_env(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::load(path)?.with_env(|name| std::env::var(name).ok()))
    }

    /// The shared corpus: the local clone if one is configured, otherwise
    /// the remote repository.
    #[must_use]
    pub fn corpus_source(&self) -> CorpusSource {
        self.corpus.testdata_dir.as_ref().map_or_else(
            || CorpusSource::Remote {
                url: self.corpus.remote_url.clone(),
            },
            |dir| CorpusSource::Existing(dir.clone()),
        )
    }

    /// The fixture corpus, if its directory exists.
    #[must_use]
    pub fn fixtures_source(&self) -> Option<CorpusSource> {
        let dir = self
            .corpus
            .fixtures_dir
            .clone()
            .unwrap_or_else(bundled_fixtures_dir);
        dir.is_dir().then_some(CorpusSource::Fixtures(dir))
    }

    #[must_use]
    pub const fn match_policy(&self) -> MatchPolicy {
        MatchPolicy {
            allow_over_building: self.matching.allow_over_building,
        }
    }
}

/// The `testdata/` directory next to this crate's manifest.
#[must_use]
pub fn bundled_fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata")
}
