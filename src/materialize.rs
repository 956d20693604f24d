//! Ephemeral git workspaces that scenarios build up and determinators run in.
//!
//! A [`Workspace`] is a real repository on disk, created either empty or as a
//! clone of the scenario corpus. Scenarios fill it with snapshot
//! contents, commit, branch, wire in submodules and then hand the root path
//! to a determinator. [`Workspace::teardown`] removes everything, and is
//! safe to call on a workspace whose directory is already gone.
//!
//! Every git failure is surfaced as a [`MaterializationError`] carrying the
//! command's stderr; nothing in this module retries.

use std::fmt;
use std::path::{Path, PathBuf};

use tdc_git::{CliRepo, GitError, GitOid, GitRepo};
use tempfile::TempDir;
use tracing::instrument;

use crate::corpus::Snapshot;

/// Branch every fresh workspace starts on.
pub const DEFAULT_BRANCH: &str = "main";

/// Snapshot file name that is renamed to `BUILD.bazel` on copy.
///
/// Fixture trees store build files under this name so that the build tool
/// does not treat the fixture directory itself as a package.
const BUILD_FILE_ALIAS: &str = "BUILD.bazel.mv";
const BUILD_FILE: &str = "BUILD.bazel";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// A workspace could not be brought into the state a scenario asked for.
#[derive(Debug)]
pub enum MaterializationError {
    /// A git command failed.
    Git(GitError),
    /// A filesystem operation failed.
    Io {
        /// What was being done, e.g. `"copy snapshot into /tmp/ws"`.
        context: String,
        source: std::io::Error,
    },
    /// The corpus has no snapshot with this name.
    UnknownSnapshot { name: String, corpus: String },
    /// The corpus itself could not be prepared.
    Corpus { message: String },
}

impl MaterializationError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

impl fmt::Display for MaterializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Git(e) => write!(f, "git: {e}"),
            Self::Io { context, source } => write!(f, "failed to {context}: {source}"),
            Self::UnknownSnapshot { name, corpus } => {
                write!(f, "snapshot '{name}' not found in {corpus}")
            }
            Self::Corpus { message } => write!(f, "corpus unavailable: {message}"),
        }
    }
}

impl std::error::Error for MaterializationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Git(e) => Some(e),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<GitError> for MaterializationError {
    fn from(e: GitError) -> Self {
        Self::Git(e)
    }
}

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

/// Who owns the directory behind a workspace.
#[derive(Debug)]
enum Storage {
    /// A private temp directory, removed on drop at the latest.
    Temp(TempDir),
    /// A caller-chosen directory that is reused between scenarios.
    Stable,
    /// A submodule checkout inside a parent workspace.
    Nested,
}

/// A disposable repository owned by one running scenario.
#[derive(Debug)]
pub struct Workspace {
    repo: CliRepo,
    storage: Storage,
    /// Paths (relative to the root) that [`replace_contents`](Self::replace_contents)
    /// leaves alone, e.g. ignored files a scenario plants out of band.
    preserved: Vec<PathBuf>,
}

impl Workspace {
    /// `git init` a fresh workspace on [`DEFAULT_BRANCH`].
    ///
    /// With `stable_dir` the workspace lives at that exact path (wiped
    /// first), otherwise in a new temp directory.
    ///
    /// # Errors
    /// Fails if the directory cannot be prepared or `git init` fails.
    #[instrument(skip_all)]
    pub fn create(stable_dir: Option<&Path>) -> Result<Self, MaterializationError> {
        let (root, storage) = prepare_root(stable_dir)?;
        let repo = CliRepo::init(&root, DEFAULT_BRANCH)?;
        let ws = Self::with_repo(repo, storage);
        ws.allow_file_protocol()?;
        tracing::debug!(path = %ws.path().display(), "created empty workspace");
        Ok(ws)
    }

    /// Clone `source`. Scenarios then [`checkout`](Self::checkout)
    /// snapshots by name; tags come along with the clone.
    ///
    /// # Errors
    /// Fails if the directory cannot be prepared or the clone fails.
    #[instrument(skip_all, fields(source = %source.display()))]
    pub fn clone_of(source: &Path, stable_dir: Option<&Path>) -> Result<Self, MaterializationError> {
        let (root, storage) = prepare_root(stable_dir)?;
        let repo = CliRepo::clone_from(&source.to_string_lossy(), &root, false)?;
        let ws = Self::with_repo(repo, storage);
        ws.allow_file_protocol()?;
        tracing::debug!(path = %ws.path().display(), "cloned corpus into workspace");
        Ok(ws)
    }

    const fn with_repo(repo: CliRepo, storage: Storage) -> Self {
        Self {
            repo,
            storage,
            preserved: Vec::new(),
        }
    }

    fn allow_file_protocol(&self) -> Result<(), MaterializationError> {
        self.repo.set_config("protocol.file.allow", "always")?;
        Ok(())
    }

    /// Root of the working tree.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.repo.root()
    }

    /// The underlying repository.
    #[must_use]
    pub const fn repo(&self) -> &CliRepo {
        &self.repo
    }

    /// `file://` URL other repositories use to reference this one.
    #[must_use]
    pub fn url(&self) -> String {
        format!("file://{}", self.path().display())
    }

    /// Keep `rel` (and its parent directories) through every later
    /// [`replace_contents`](Self::replace_contents).
    pub fn preserve(&mut self, rel: impl Into<PathBuf>) {
        self.preserved.push(rel.into());
    }

    // -----------------------------------------------------------------------
    // Contents
    // -----------------------------------------------------------------------

    /// Replace the working tree with `snapshot`.
    ///
    /// Deletes everything except `.git` and preserved paths, then copies the
    /// snapshot in. `BUILD.bazel.mv` files land as `BUILD.bazel`; permission
    /// bits are carried over.
    ///
    /// # Errors
    /// Fails on any filesystem error.
    #[instrument(skip_all, fields(snapshot = snapshot.name()))]
    pub fn replace_contents(&self, snapshot: &Snapshot) -> Result<(), MaterializationError> {
        let root = self.path();
        clear_except(root, Path::new(""), &self.preserved).map_err(|e| {
            MaterializationError::io(format!("clear {}", root.display()), e)
        })?;
        copy_tree(snapshot.path(), root).map_err(|e| {
            MaterializationError::io(
                format!("copy snapshot '{}' into {}", snapshot.name(), root.display()),
                e,
            )
        })
    }

    /// Create an empty file at `rel`, with any missing parent directories.
    ///
    /// # Errors
    /// Fails on any filesystem error.
    pub fn create_file(&self, rel: &str) -> Result<PathBuf, MaterializationError> {
        let path = self.path().join(rel);
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, b"")
        };
        write().map_err(|e| MaterializationError::io(format!("create {}", path.display()), e))?;
        Ok(path)
    }

    /// Set the permission bits of `rel` to `mode` (e.g. `0o444`).
    ///
    /// A no-op on platforms without POSIX permissions.
    ///
    /// # Errors
    /// Fails on any filesystem error.
    pub fn set_mode(&self, rel: &str, mode: u32) -> Result<(), MaterializationError> {
        let path = self.path().join(rel);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).map_err(
                |e| MaterializationError::io(format!("chmod {mode:o} {}", path.display()), e),
            )?;
        }
        #[cfg(not(unix))]
        tracing::debug!(path = %path.display(), mode, "skipping chmod on this platform");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Stage the whole tree (including `.gitmodules` and deletions) plus
    /// `extra_paths`, then commit.
    ///
    /// # Errors
    /// Propagates git failures.
    pub fn commit(&self, message: &str, extra_paths: &[&str]) -> Result<GitOid, MaterializationError> {
        self.repo.add_all()?;
        self.repo.add_paths(extra_paths)?;
        let oid = self.repo.commit(message)?;
        tracing::debug!(%oid, message, "committed");
        Ok(oid)
    }

    /// Check out `rev` and bring submodules in line with it.
    ///
    /// # Errors
    /// Propagates git failures.
    pub fn checkout(&self, rev: &str) -> Result<(), MaterializationError> {
        self.repo.checkout(rev)?;
        self.repo.submodule_update()?;
        Ok(())
    }

    /// Create `name` at HEAD and switch to it.
    ///
    /// # Errors
    /// Propagates git failures.
    pub fn checkout_branch(&self, name: &str) -> Result<(), MaterializationError> {
        self.repo.checkout_new_branch(name)?;
        Ok(())
    }

    /// The checked-out branch, `None` when HEAD is detached.
    ///
    /// # Errors
    /// Propagates git failures.
    pub fn current_branch(&self) -> Result<Option<String>, MaterializationError> {
        Ok(self.repo.current_branch()?)
    }

    /// Resolve `rev` to a commit.
    ///
    /// # Errors
    /// Propagates git failures.
    pub fn rev_parse(&self, rev: &str) -> Result<GitOid, MaterializationError> {
        Ok(self.repo.rev_parse(rev)?)
    }

    /// Fast-forward from `origin/main`. Used on submodule checkouts after
    /// their upstream moved.
    ///
    /// # Errors
    /// Propagates git failures.
    pub fn pull(&self) -> Result<(), MaterializationError> {
        self.repo.pull("origin", DEFAULT_BRANCH)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Submodules
    // -----------------------------------------------------------------------

    /// Register `child` as a submodule at `rel` and return a handle to the
    /// nested checkout. The handle's lifetime is tied to this workspace.
    ///
    /// # Errors
    /// Propagates git failures.
    pub fn add_submodule(&self, child: &Self, rel: &str) -> Result<Self, MaterializationError> {
        self.repo.submodule_add(&child.url(), rel)?;
        let nested = CliRepo::at(&self.path().join(rel));
        Ok(Self::with_repo(nested, Storage::Nested))
    }

    /// Handle to an already checked-out submodule at `rel`.
    #[must_use]
    pub fn submodule(&self, rel: &str) -> Self {
        Self::with_repo(CliRepo::at(&self.path().join(rel)), Storage::Nested)
    }

    /// Relocate a tracked path with `git mv` (rewriting `.gitmodules` for
    /// submodules).
    ///
    /// # Errors
    /// Propagates git failures.
    pub fn move_path(&self, from: &str, to: &str) -> Result<(), MaterializationError> {
        self.repo.move_path(from, to)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Recursively delete the workspace.
    ///
    /// Nested workspaces are left to their parent. Already-missing
    /// directories are not an error.
    ///
    /// # Errors
    /// Fails if an existing directory cannot be removed.
    pub fn teardown(self) -> Result<(), MaterializationError> {
        let root = self.path().to_path_buf();
        match self.storage {
            Storage::Nested => Ok(()),
            Storage::Temp(dir) => {
                // Close explicitly so removal errors surface instead of
                // being swallowed by `Drop`.
                match dir.close() {
                    Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(
                        MaterializationError::io(format!("remove {}", root.display()), e),
                    ),
                    _ => Ok(()),
                }
            }
            Storage::Stable => remove_dir_if_present(&root)
                .map_err(|e| MaterializationError::io(format!("remove {}", root.display()), e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Filesystem helpers
// ---------------------------------------------------------------------------

fn prepare_root(stable_dir: Option<&Path>) -> Result<(PathBuf, Storage), MaterializationError> {
    if let Some(dir) = stable_dir {
        remove_dir_if_present(dir)
            .map_err(|e| MaterializationError::io(format!("wipe {}", dir.display()), e))?;
        std::fs::create_dir_all(dir)
            .map_err(|e| MaterializationError::io(format!("create {}", dir.display()), e))?;
        return Ok((dir.to_path_buf(), Storage::Stable));
    }

    let temp = tempfile::Builder::new()
        .prefix("tdc-workspace-")
        .tempdir()
        .map_err(|e| MaterializationError::io("create temp workspace", e))?;
    // Clone into a child directory so the workspace basename is stable
    // across scenarios.
    let root = temp.path().join("workspace");
    std::fs::create_dir_all(&root)
        .map_err(|e| MaterializationError::io(format!("create {}", root.display()), e))?;
    Ok((root, Storage::Temp(temp)))
}

pub(crate) fn remove_dir_if_present(dir: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Delete everything under `root/rel` except `.git` at the top level and
/// `preserved` paths.
fn clear_except(root: &Path, rel: &Path, preserved: &[PathBuf]) -> std::io::Result<()> {
    for entry in std::fs::read_dir(root.join(rel))? {
        let entry = entry?;
        let child = rel.join(entry.file_name());
        if child.starts_with(".git") || preserved.iter().any(|p| p == &child) {
            continue;
        }

        let path = entry.path();
        if entry.file_type()?.is_dir() {
            if preserved.iter().any(|p| p.starts_with(&child)) {
                clear_except(root, &child, preserved)?;
            } else {
                std::fs::remove_dir_all(&path)?;
            }
        } else {
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Recursively copy `src` into `dst`, following symlinks and keeping
/// permission bits.
fn copy_tree(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let name = entry.file_name();
        // `metadata` follows symlinks.
        if std::fs::metadata(&from)?.is_dir() {
            copy_tree(&from, &dst.join(&name))?;
        } else {
            let to = if name == BUILD_FILE_ALIAS {
                dst.join(BUILD_FILE)
            } else {
                dst.join(&name)
            };
            std::fs::copy(&from, &to)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(root: &Path) -> Vec<String> {
        let mut out = Vec::new();
        walk(root, root, &mut out);
        out.sort();
        out
    }

    fn walk(base: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            let rel = path.strip_prefix(base).unwrap().to_string_lossy().into_owned();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                out.push(rel);
            }
        }
    }

    #[test]
    fn copy_tree_renames_build_file_alias() {
        let src = TempDir::new().unwrap();
        std::fs::create_dir_all(src.path().join("java/example")).unwrap();
        std::fs::write(src.path().join("java/example/BUILD.bazel.mv"), "java_test()").unwrap();
        std::fs::write(src.path().join("WORKSPACE"), "").unwrap();

        let dst = TempDir::new().unwrap();
        copy_tree(src.path(), dst.path()).unwrap();
        assert_eq!(tree(dst.path()), vec!["WORKSPACE", "java/example/BUILD.bazel"]);
    }

    #[test]
    fn clear_except_keeps_git_and_preserved_paths() {
        let root = TempDir::new().unwrap();
        for rel in [
            ".git/HEAD",
            ".gitignore",
            "ignored-directory/some-file",
            "ignored-directory/other",
            "java/Example.java",
        ] {
            let path = root.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "").unwrap();
        }

        let preserved = vec![PathBuf::from("ignored-directory/some-file")];
        clear_except(root.path(), Path::new(""), &preserved).unwrap();
        assert_eq!(
            tree(root.path()),
            vec![".git/HEAD", "ignored-directory/some-file"]
        );
    }

    #[test]
    fn teardown_tolerates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let stable = dir.path().join("stable");
        let ws = Workspace::create(Some(&stable)).unwrap();
        std::fs::remove_dir_all(&stable).unwrap();
        ws.teardown().unwrap();
        assert!(!stable.exists());
    }

    #[test]
    fn create_starts_on_main() {
        let ws = Workspace::create(None).unwrap();
        assert_eq!(ws.current_branch().unwrap().as_deref(), Some(DEFAULT_BRANCH));
        assert!(ws.path().ends_with("workspace"));
        let path = ws.path().to_path_buf();
        ws.teardown().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn error_display_includes_context() {
        let err = MaterializationError::io(
            "copy snapshot 'v1/one-test' into /tmp/ws",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(err.to_string().starts_with("failed to copy snapshot 'v1/one-test'"));
    }
}
