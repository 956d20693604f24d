//! [`GitRepo`] implementation that drives the `git` CLI for mutations and
//! gix for read-only lookups.
//!
//! Mutations (commits, checkouts, submodules) go through the real `git`
//! binary because the determinators under test shell out to the same binary;
//! whatever state we create is exactly what they will observe. Revision and
//! branch lookups go through gix to avoid a process spawn per query.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::GitError;
use crate::repo::GitRepo;
use crate::types::{GitOid, StatusEntry};

/// Committer identity written into every repository the harness creates.
const IDENTITY_NAME: &str = "td-conformance";
const IDENTITY_EMAIL: &str = "td-conformance@localhost";

/// Config passed on the command line to every submodule operation.
///
/// Submodules reference sibling repositories on disk, and git refuses the
/// `file` transport for submodules unless it is explicitly allowed.
const ALLOW_FILE_PROTOCOL: [&str; 2] = ["-c", "protocol.file.allow=always"];

/// A repository on disk, addressed by its root directory.
#[derive(Clone, Debug)]
pub struct CliRepo {
    root: PathBuf,
}

impl CliRepo {
    /// Open an existing repository at `path`.
    ///
    /// # Errors
    /// Returns [`GitError::NotARepository`] if gix cannot open it.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        gix::open(path).map_err(|_| GitError::NotARepository {
            path: path.to_path_buf(),
        })?;
        Ok(Self {
            root: path.to_path_buf(),
        })
    }

    /// Wrap a path without validating it. Used for submodule checkouts whose
    /// `.git` file appears only after `git submodule add` returns.
    #[must_use]
    pub fn at(path: &Path) -> Self {
        Self {
            root: path.to_path_buf(),
        }
    }

    /// `git init` a fresh repository with `branch` as its initial branch and
    /// a fixed committer identity.
    ///
    /// # Errors
    /// Propagates any failing git command.
    pub fn init(path: &Path, branch: &str) -> Result<Self, GitError> {
        std::fs::create_dir_all(path)?;
        let initial = format!("--initial-branch={branch}");
        run_git(path, &["init", "--quiet", &initial])?;
        let repo = Self::at(path);
        repo.configure_identity()?;
        Ok(repo)
    }

    /// `git init --bare`.
    ///
    /// # Errors
    /// Propagates any failing git command.
    pub fn init_bare(path: &Path) -> Result<Self, GitError> {
        std::fs::create_dir_all(path)?;
        run_git(path, &["init", "--quiet", "--bare", "--initial-branch=main"])?;
        Ok(Self::at(path))
    }

    /// Clone `source` (a path or URL) into `dest`.
    ///
    /// With `no_checkout` the working tree stays empty until the first
    /// [`checkout`](GitRepo::checkout), which guarantees the checkout is
    /// pristine.
    ///
    /// # Errors
    /// Propagates any failing git command.
    pub fn clone_from(source: &str, dest: &Path, no_checkout: bool) -> Result<Self, GitError> {
        let parent = dest.parent().unwrap_or(dest);
        std::fs::create_dir_all(parent)?;
        let dest_str = dest.to_string_lossy();
        let mut args = vec!["clone", "--quiet"];
        if no_checkout {
            args.push("--no-checkout");
        }
        args.push(source);
        args.push(&dest_str);
        run_git(parent, &args)?;
        let repo = Self::at(dest);
        repo.configure_identity()?;
        Ok(repo)
    }

    fn configure_identity(&self) -> Result<(), GitError> {
        self.set_config("user.name", IDENTITY_NAME)?;
        self.set_config("user.email", IDENTITY_EMAIL)?;
        self.set_config("commit.gpgsign", "false")?;
        self.set_config("tag.gpgsign", "false")?;
        Ok(())
    }

    /// Run a git command in this repository and return its stdout.
    ///
    /// # Errors
    /// [`GitError::CommandFailed`] on a non-zero exit.
    pub fn git(&self, args: &[&str]) -> Result<String, GitError> {
        run_git(&self.root, args)
    }

    fn open_gix(&self) -> Result<gix::Repository, GitError> {
        gix::open(&self.root).map_err(|e| GitError::BackendError {
            message: format!("failed to open {}: {e}", self.root.display()),
        })
    }
}

impl GitRepo for CliRepo {
    fn root(&self) -> &Path {
        &self.root
    }

    fn rev_parse(&self, spec: &str) -> Result<GitOid, GitError> {
        self.rev_parse_opt(spec)?.ok_or_else(|| GitError::NotFound {
            message: format!("revision '{spec}' in {}", self.root.display()),
        })
    }

    fn rev_parse_opt(&self, spec: &str) -> Result<Option<GitOid>, GitError> {
        let repo = self.open_gix()?;
        // Peel so that annotated tags resolve to the commit they point at.
        let peeled = format!("{spec}^{{commit}}");
        match repo.rev_parse_single(peeled.as_str()) {
            Ok(id) => {
                let oid = GitOid::try_from(id.detach().as_bytes()).map_err(|e| {
                    GitError::InvalidOid {
                        value: e.value,
                        reason: e.reason,
                    }
                })?;
                Ok(Some(oid))
            }
            // Every rev-parse failure means "does not resolve": unknown ref,
            // unborn HEAD, malformed spec.
            Err(_) => Ok(None),
        }
    }

    fn current_branch(&self) -> Result<Option<String>, GitError> {
        let repo = self.open_gix()?;
        let head = repo.head_name().map_err(|e| GitError::BackendError {
            message: format!("failed to read HEAD: {e}"),
        })?;
        Ok(head.map(|name| name.shorten().to_string()))
    }

    fn add_all(&self) -> Result<(), GitError> {
        self.git(&["add", "--all", "--", "."])?;
        Ok(())
    }

    fn add_paths(&self, paths: &[&str]) -> Result<(), GitError> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["add", "--"];
        args.extend_from_slice(paths);
        self.git(&args)?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<GitOid, GitError> {
        self.git(&["commit", "--quiet", "--allow-empty", "--no-verify", "-m", message])?;
        self.rev_parse("HEAD")
    }

    fn move_path(&self, from: &str, to: &str) -> Result<(), GitError> {
        self.git(&["mv", "--", from, to])?;
        Ok(())
    }

    fn checkout(&self, rev: &str) -> Result<(), GitError> {
        self.git(&["checkout", "--quiet", rev])?;
        Ok(())
    }

    fn checkout_new_branch(&self, name: &str) -> Result<(), GitError> {
        self.git(&["checkout", "--quiet", "-b", name])?;
        Ok(())
    }

    fn submodule_add(&self, url: &str, path: &str) -> Result<(), GitError> {
        let mut args = ALLOW_FILE_PROTOCOL.to_vec();
        args.extend_from_slice(&["submodule", "--quiet", "add", "--", url, path]);
        self.git(&args)?;
        Ok(())
    }

    fn submodule_update(&self) -> Result<(), GitError> {
        let mut args = ALLOW_FILE_PROTOCOL.to_vec();
        args.extend_from_slice(&["submodule", "--quiet", "update", "--init", "--recursive"]);
        self.git(&args)?;
        Ok(())
    }

    fn fetch(&self, url: &str, refspec: &str) -> Result<(), GitError> {
        self.git(&["fetch", "--quiet", "--no-tags", url, refspec])?;
        Ok(())
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        let mut args = ALLOW_FILE_PROTOCOL.to_vec();
        args.extend_from_slice(&["pull", "--quiet", "--ff-only", remote, branch]);
        self.git(&args)?;
        Ok(())
    }

    fn tag(&self, name: &str, target: &str) -> Result<(), GitError> {
        self.git(&["tag", "--force", name, target])?;
        Ok(())
    }

    fn status(&self) -> Result<Vec<StatusEntry>, GitError> {
        let out = self.git(&["status", "--porcelain=v1"])?;
        Ok(out.lines().filter_map(StatusEntry::parse).collect())
    }

    fn archive_to(&self, rev: &str, dest: &Path) -> Result<(), GitError> {
        let command = format!("git archive --format=tar {rev} | tar -x -C {}", dest.display());
        debug!(command = %command, "exporting tree");

        let mut archive = Command::new("git")
            .args(["archive", "--format=tar", rev])
            .current_dir(&self.root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let archive_stdout = archive.stdout.take().ok_or_else(|| GitError::BackendError {
            message: "git archive produced no stdout pipe".to_owned(),
        })?;

        let tar = Command::new("tar")
            .args(["-x", "-C"])
            .arg(dest)
            .stdin(archive_stdout)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()?;

        let archive_output = archive.wait_with_output()?;
        if !archive_output.status.success() {
            return Err(GitError::CommandFailed {
                command,
                exit_code: archive_output.status.code(),
                stderr: String::from_utf8_lossy(&archive_output.stderr)
                    .trim()
                    .to_owned(),
            });
        }
        if !tar.status.success() {
            return Err(GitError::CommandFailed {
                command,
                exit_code: tar.status.code(),
                stderr: String::from_utf8_lossy(&tar.stderr).trim().to_owned(),
            });
        }
        Ok(())
    }

    fn set_config(&self, key: &str, value: &str) -> Result<(), GitError> {
        self.git(&["config", key, value])?;
        Ok(())
    }
}

/// Run `git <args>` in `dir`, returning stdout on success.
fn run_git(dir: &Path, args: &[&str]) -> Result<String, GitError> {
    let command = format!("git {}", args.join(" "));
    debug!(command = %command, dir = %dir.display(), "running git");

    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(GitError::CommandFailed {
            command,
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}
