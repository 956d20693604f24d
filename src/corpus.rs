//! The scenario corpus: named workspace snapshots.
//!
//! A snapshot name (`v1/one-test`, `v1/two-tests`, ...) is a tag in a corpus
//! repository. Two strategies provide that repository:
//!
//! - **Remote**: clone the upstream testdata repository once (cached under
//!   the user cache directory and refreshed with `git fetch --tags`), or use
//!   an existing local clone as-is.
//! - **Fixtures**: a directory of snapshot trees (`<dir>/<name>/...`). On
//!   first use each tree is committed in a scratch workspace and published
//!   into a private bare repository under its name.
//!
//! Either way, [`Corpus::resolve_snapshot`] exports the tagged tree with
//! `git archive` into a fresh directory, so resolved snapshots never share
//! state and resolving the same name twice yields identical trees.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use sha1::{Digest, Sha1};
use tdc_git::{CliRepo, GitRepo};
use tempfile::TempDir;
use tracing::instrument;

use crate::materialize::{DEFAULT_BRANCH, MaterializationError, Workspace};

/// The upstream corpus used when nothing else is configured.
pub const DEFAULT_REMOTE_URL: &str =
    "https://github.com/bazel-contrib/target-determinator-testdata.git";

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A resolved, read-only snapshot tree.
#[derive(Debug)]
pub struct Snapshot {
    name: String,
    root: PathBuf,
    /// Owns the export directory; `None` when the tree is borrowed from a
    /// fixture directory.
    _export: Option<TempDir>,
}

impl Snapshot {
    /// The symbolic name this snapshot was resolved from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root of the snapshot tree.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    fn borrowed(name: &str, root: PathBuf) -> Self {
        Self {
            name: name.to_owned(),
            root,
            _export: None,
        }
    }
}

// ---------------------------------------------------------------------------
// CorpusSource
// ---------------------------------------------------------------------------

/// Where the corpus comes from. Selected once per run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CorpusSource {
    /// Clone (or refresh a cached clone of) this URL.
    Remote { url: String },
    /// Use an existing local clone without touching it.
    Existing(PathBuf),
    /// Publish snapshot trees from this fixture directory.
    Fixtures(PathBuf),
}

impl fmt::Display for CorpusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote { url } => write!(f, "remote corpus {url}"),
            Self::Existing(path) => write!(f, "corpus clone {}", path.display()),
            Self::Fixtures(path) => write!(f, "fixture corpus {}", path.display()),
        }
    }
}

// ---------------------------------------------------------------------------
// Corpus
// ---------------------------------------------------------------------------

/// A corpus repository plus the resolver from names to snapshots.
///
/// `Corpus` is `Sync`: scenario threads resolve snapshots and clone the
/// repository concurrently. Only fixture publication mutates the repository,
/// and it is serialized by an internal lock.
#[derive(Debug)]
pub struct Corpus {
    source: CorpusSource,
    repo: CliRepo,
    /// Fixture names already published as tags.
    published: Mutex<BTreeSet<String>>,
    /// Owns the bare repository of a fixture corpus.
    _storage: Option<TempDir>,
}

static SHARED: OnceLock<Corpus> = OnceLock::new();

impl Corpus {
    /// Prepare a corpus from `source`.
    ///
    /// # Errors
    /// Fails if the clone, refresh or bare-repository setup fails.
    #[instrument(skip_all, fields(source = %source))]
    pub fn open(source: CorpusSource) -> Result<Self, MaterializationError> {
        let (repo, storage) = match &source {
            CorpusSource::Remote { url } => (clone_or_refresh(url)?, None),
            CorpusSource::Existing(path) => (CliRepo::open(path)?, None),
            CorpusSource::Fixtures(dir) => {
                if !dir.is_dir() {
                    return Err(MaterializationError::Corpus {
                        message: format!("fixture directory {} does not exist", dir.display()),
                    });
                }
                let storage = tempfile::Builder::new()
                    .prefix("tdc-corpus-")
                    .tempdir()
                    .map_err(|e| MaterializationError::io("create corpus directory", e))?;
                (CliRepo::init_bare(storage.path())?, Some(storage))
            }
        };
        tracing::info!(path = %repo.root().display(), "corpus ready");
        Ok(Self {
            source,
            repo,
            published: Mutex::new(BTreeSet::new()),
            _storage: storage,
        })
    }

    /// The process-wide corpus, prepared from `source` on first call.
    ///
    /// Later calls return the same corpus whatever `source` they pass. If two
    /// threads race to initialize it, the loser's corpus is dropped.
    ///
    /// # Errors
    /// Fails if the first preparation fails; a later call retries.
    pub fn shared(source: CorpusSource) -> Result<&'static Self, MaterializationError> {
        if let Some(corpus) = SHARED.get() {
            return Ok(corpus);
        }
        let corpus = Self::open(source)?;
        let _ = SHARED.set(corpus);
        SHARED.get().ok_or_else(|| MaterializationError::Corpus {
            message: "shared corpus vanished after initialization".to_owned(),
        })
    }

    /// Repository that scenario workspaces clone from.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.repo.root()
    }

    /// Where this corpus came from.
    #[must_use]
    pub const fn source(&self) -> &CorpusSource {
        &self.source
    }

    /// Make sure `name` exists as a revision in the corpus repository,
    /// publishing it from the fixture directory if necessary.
    ///
    /// # Errors
    /// [`MaterializationError::UnknownSnapshot`] if the name is unknown.
    pub fn ensure_revision(&self, name: &str) -> Result<(), MaterializationError> {
        match &self.source {
            CorpusSource::Fixtures(dir) => self.publish_fixture(dir, name),
            CorpusSource::Remote { .. } | CorpusSource::Existing(_) => {
                if self.repo.rev_parse_opt(name)?.is_some() {
                    Ok(())
                } else {
                    Err(self.unknown(name))
                }
            }
        }
    }

    /// Resolve `name` into a fresh, private snapshot tree.
    ///
    /// # Errors
    /// Fails if the name is unknown or the export fails.
    #[instrument(skip(self))]
    pub fn resolve_snapshot(&self, name: &str) -> Result<Snapshot, MaterializationError> {
        self.ensure_revision(name)?;
        let export = tempfile::Builder::new()
            .prefix("tdc-snapshot-")
            .tempdir()
            .map_err(|e| MaterializationError::io("create snapshot directory", e))?;
        self.repo.archive_to(name, export.path())?;
        Ok(Snapshot {
            name: name.to_owned(),
            root: export.path().to_path_buf(),
            _export: Some(export),
        })
    }

    fn publish_fixture(&self, fixtures: &Path, name: &str) -> Result<(), MaterializationError> {
        let mut published = self
            .published
            .lock()
            .map_err(|_| MaterializationError::Corpus {
                message: "corpus lock poisoned".to_owned(),
            })?;
        if published.contains(name) {
            return Ok(());
        }

        let tree = fixture_dir(fixtures, name).ok_or_else(|| self.unknown(name))?;
        let scratch = Workspace::create(None)?;
        let result = (|| -> Result<(), MaterializationError> {
            scratch.replace_contents(&Snapshot::borrowed(name, tree))?;
            scratch.commit(name, &[])?;
            self.repo
                .fetch(&scratch.path().to_string_lossy(), DEFAULT_BRANCH)?;
            self.repo.tag(name, "FETCH_HEAD")?;
            Ok(())
        })();
        after_cleanup(result, scratch.teardown())?;

        tracing::debug!(name, "published fixture snapshot");
        published.insert(name.to_owned());
        Ok(())
    }

    fn unknown(&self, name: &str) -> MaterializationError {
        MaterializationError::UnknownSnapshot {
            name: name.to_owned(),
            corpus: self.source.to_string(),
        }
    }
}

/// `result`, unless only `cleanup` failed. A cleanup error behind a failed
/// `result` is logged and dropped.
fn after_cleanup(
    result: Result<(), MaterializationError>,
    cleanup: Result<(), MaterializationError>,
) -> Result<(), MaterializationError> {
    match (result, cleanup) {
        (Err(e), Err(cleanup)) => {
            tracing::warn!(error = %cleanup, "scratch workspace teardown failed");
            Err(e)
        }
        (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
        (Ok(()), Ok(())) => Ok(()),
    }
}

/// `<fixtures>/<name>` if `name` is a plain relative path naming a directory.
fn fixture_dir(fixtures: &Path, name: &str) -> Option<PathBuf> {
    let rel = Path::new(name);
    if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
        return None;
    }
    let dir = fixtures.join(rel);
    dir.is_dir().then_some(dir)
}

/// Clone `url` into the user cache, or refresh a clone that is already
/// there.
fn clone_or_refresh(url: &str) -> Result<CliRepo, MaterializationError> {
    let cache = dirs::cache_dir().ok_or_else(|| MaterializationError::Corpus {
        message: "no user cache directory to clone the corpus into".to_owned(),
    })?;
    let dest = cache
        .join("td-conformance")
        .join(format!("corpus-{}", &hex_sha1(url)[..12]));

    if dest.join(".git").is_dir() {
        let repo = CliRepo::open(&dest)?;
        tracing::info!(url, path = %dest.display(), "refreshing cached corpus clone");
        repo.git(&["fetch", "--quiet", "--tags", "--force", "origin"])?;
        return Ok(repo);
    }

    tracing::info!(url, path = %dest.display(), "cloning corpus");
    crate::materialize::remove_dir_if_present(&dest)
        .map_err(|e| MaterializationError::io(format!("remove {}", dest.display()), e))?;
    Ok(CliRepo::clone_from(url, &dest, true)?)
}

/// Lowercase hex SHA-1 of `input`.
pub(crate) fn hex_sha1(input: &str) -> String {
    use std::fmt::Write as _;

    Sha1::digest(input.as_bytes())
        .iter()
        .fold(String::with_capacity(40), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}
