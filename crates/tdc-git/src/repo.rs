//! The [`GitRepo`] trait: the boundary between the harness and git.
//!
//! The harness only needs a narrow slice of git: building commits from
//! working-tree contents, moving between revisions, wiring up submodules and
//! answering "where is HEAD". Method groups:
//!
//! | Group      | Methods                                                    |
//! |-----------|------------------------------------------------------------|
//! | Rev-parse  | `rev_parse`, `rev_parse_opt`, `current_branch`             |
//! | Index      | `add_all`, `add_paths`, `commit`, `move_path`              |
//! | Checkout   | `checkout`, `checkout_new_branch`                          |
//! | Submodules | `submodule_add`, `submodule_update`                        |
//! | Remotes    | `fetch`, `pull`, `tag`                                     |
//! | Status     | `status`                                                   |
//! | Export     | `archive_to`                                               |
//! | Config     | `set_config`                                               |

use std::path::Path;

use crate::error::GitError;
use crate::types::{GitOid, StatusEntry};

/// The git interface used by the corpus and the workspace materializer.
///
/// The trait is object-safe so callers can hold `&dyn GitRepo`.
pub trait GitRepo {
    /// Root of the working tree (or of the git dir for bare repositories).
    fn root(&self) -> &Path;

    // -----------------------------------------------------------------------
    // Rev-parse
    // -----------------------------------------------------------------------

    /// Resolve a revision spec (`HEAD`, `HEAD^`, a tag, a branch) to an OID.
    ///
    /// Returns [`GitError::NotFound`] if `spec` does not resolve.
    fn rev_parse(&self, spec: &str) -> Result<GitOid, GitError>;

    /// Like [`rev_parse`](Self::rev_parse) but maps "does not resolve" to `None`.
    fn rev_parse_opt(&self, spec: &str) -> Result<Option<GitOid>, GitError>;

    /// Short name of the checked-out branch, `None` when HEAD is detached.
    fn current_branch(&self) -> Result<Option<String>, GitError>;

    // -----------------------------------------------------------------------
    // Index and commits
    // -----------------------------------------------------------------------

    /// Stage every change in the working tree, including deletions.
    fn add_all(&self) -> Result<(), GitError>;

    /// Stage specific paths (e.g. a submodule gitlink).
    fn add_paths(&self, paths: &[&str]) -> Result<(), GitError>;

    /// Commit the index. Empty commits are allowed so that replaying an
    /// identical snapshot still yields a distinct revision.
    fn commit(&self, message: &str) -> Result<GitOid, GitError>;

    /// Move a tracked path with `git mv`, which also rewrites `.gitmodules`
    /// when the path is a submodule.
    fn move_path(&self, from: &str, to: &str) -> Result<(), GitError>;

    // -----------------------------------------------------------------------
    // Checkout
    // -----------------------------------------------------------------------

    /// Check out a revision (detaching HEAD for tags and OIDs).
    fn checkout(&self, rev: &str) -> Result<(), GitError>;

    /// Create a branch at HEAD and switch to it.
    fn checkout_new_branch(&self, name: &str) -> Result<(), GitError>;

    // -----------------------------------------------------------------------
    // Submodules
    // -----------------------------------------------------------------------

    /// Register `url` as a submodule at `path` and clone it.
    fn submodule_add(&self, url: &str, path: &str) -> Result<(), GitError>;

    /// `git submodule update --init --recursive`.
    fn submodule_update(&self) -> Result<(), GitError>;

    // -----------------------------------------------------------------------
    // Remotes
    // -----------------------------------------------------------------------

    /// Fetch `refspec` from `url` (a path or `file://` URL).
    fn fetch(&self, url: &str, refspec: &str) -> Result<(), GitError>;

    /// Fast-forward the current branch from `remote`/`branch`.
    fn pull(&self, remote: &str, branch: &str) -> Result<(), GitError>;

    /// Create (or move) a lightweight tag.
    fn tag(&self, name: &str, target: &str) -> Result<(), GitError>;

    // -----------------------------------------------------------------------
    // Status, export, config
    // -----------------------------------------------------------------------

    /// Porcelain status, untracked files included, ignored files excluded.
    fn status(&self) -> Result<Vec<StatusEntry>, GitError>;

    /// Extract the tree of `rev` into `dest` (which must exist), preserving
    /// the executable bit recorded in git.
    fn archive_to(&self, rev: &str, dest: &Path) -> Result<(), GitError>;

    /// Write a repository-local config value.
    fn set_config(&self, key: &str, value: &str) -> Result<(), GitError>;
}
