use std::path::Path;

use tempfile::TempDir;

use tdc_git::{CliRepo, GitError, GitRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn setup_repo() -> (TempDir, CliRepo) {
    let dir = TempDir::new().unwrap();
    let repo = CliRepo::init(dir.path(), "main").unwrap();
    (dir, repo)
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn commit_file(repo: &CliRepo, rel: &str, contents: &str, message: &str) -> tdc_git::GitOid {
    write(repo.root(), rel, contents);
    repo.add_all().unwrap();
    repo.commit(message).unwrap()
}

// ===========================================================================
// 1. Init, commit, rev-parse
// ===========================================================================

#[test]
fn init_sets_initial_branch() {
    let (_dir, repo) = setup_repo();
    assert_eq!(repo.current_branch().unwrap().as_deref(), Some("main"));
}

#[test]
fn rev_parse_unborn_head_is_none() {
    let (_dir, repo) = setup_repo();
    assert!(repo.rev_parse_opt("HEAD").unwrap().is_none());
    assert!(matches!(
        repo.rev_parse("HEAD"),
        Err(GitError::NotFound { .. })
    ));
}

#[test]
fn commit_returns_head() {
    let (_dir, repo) = setup_repo();
    let oid = commit_file(&repo, "README.md", "hello\n", "first");
    assert_eq!(repo.rev_parse("HEAD").unwrap(), oid);
}

#[test]
fn relative_revisions_resolve() {
    let (_dir, repo) = setup_repo();
    let first = commit_file(&repo, "a.txt", "1\n", "first");
    let second = commit_file(&repo, "a.txt", "2\n", "second");
    assert_ne!(first, second);
    assert_eq!(repo.rev_parse("HEAD^").unwrap(), first);
}

#[test]
fn empty_commit_is_allowed() {
    let (_dir, repo) = setup_repo();
    let first = commit_file(&repo, "a.txt", "1\n", "first");
    repo.add_all().unwrap();
    let again = repo.commit("nothing changed").unwrap();
    assert_ne!(first, again);
}

#[test]
fn add_all_stages_deletions() {
    let (_dir, repo) = setup_repo();
    commit_file(&repo, "gone.txt", "bye\n", "first");
    std::fs::remove_file(repo.root().join("gone.txt")).unwrap();
    repo.add_all().unwrap();
    repo.commit("delete").unwrap();
    assert!(repo.status().unwrap().is_empty());
}

// ===========================================================================
// 2. Branches and checkout
// ===========================================================================

#[test]
fn checkout_tag_detaches_head() {
    let (_dir, repo) = setup_repo();
    let first = commit_file(&repo, "a.txt", "1\n", "first");
    repo.tag("v1/first", &first.to_string()).unwrap();
    commit_file(&repo, "a.txt", "2\n", "second");

    repo.checkout("v1/first").unwrap();
    assert_eq!(repo.current_branch().unwrap(), None);
    assert_eq!(repo.rev_parse("HEAD").unwrap(), first);
    assert_eq!(repo.rev_parse("v1/first").unwrap(), first);
}

#[test]
fn checkout_new_branch_switches() {
    let (_dir, repo) = setup_repo();
    commit_file(&repo, "a.txt", "1\n", "first");
    repo.checkout_new_branch("two-tests-branch").unwrap();
    assert_eq!(
        repo.current_branch().unwrap().as_deref(),
        Some("two-tests-branch")
    );
}

#[test]
fn checkout_unknown_revision_reports_stderr() {
    let (_dir, repo) = setup_repo();
    commit_file(&repo, "a.txt", "1\n", "first");
    match repo.checkout("does-not-exist") {
        Err(GitError::CommandFailed {
            command, stderr, ..
        }) => {
            assert!(command.contains("checkout"));
            assert!(!stderr.is_empty());
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

// ===========================================================================
// 3. Status
// ===========================================================================

#[test]
fn status_reports_untracked_files() {
    let (_dir, repo) = setup_repo();
    commit_file(&repo, "a.txt", "1\n", "first");
    write(repo.root(), "untracked-file", "");
    let status = repo.status().unwrap();
    assert_eq!(status.len(), 1);
    assert!(status[0].is_untracked());
}

#[test]
fn status_skips_ignored_files() {
    let (_dir, repo) = setup_repo();
    commit_file(&repo, ".gitignore", "ignored-file\n", "ignore");
    write(repo.root(), "ignored-file", "");
    assert!(repo.status().unwrap().is_empty());
}

// ===========================================================================
// 4. Export
// ===========================================================================

#[cfg(unix)]
#[test]
fn archive_preserves_executable_bit() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, repo) = setup_repo();
    write(repo.root(), "sh/test.sh", "#!/bin/sh\nexit 0\n");
    std::fs::set_permissions(
        repo.root().join("sh/test.sh"),
        std::fs::Permissions::from_mode(0o755),
    )
    .unwrap();
    repo.add_all().unwrap();
    let oid = repo.commit("exec").unwrap();

    let out = TempDir::new().unwrap();
    repo.archive_to(&oid.to_string(), out.path()).unwrap();
    let mode = std::fs::metadata(out.path().join("sh/test.sh"))
        .unwrap()
        .permissions()
        .mode();
    assert_ne!(mode & 0o111, 0, "executable bit lost: {mode:o}");
}

// ===========================================================================
// 5. Remotes and submodules
// ===========================================================================

#[test]
fn fetch_and_tag_into_bare_repo() {
    let (_dir, source) = setup_repo();
    let oid = commit_file(&source, "a.txt", "1\n", "first");

    let bare_dir = TempDir::new().unwrap();
    let bare = CliRepo::init_bare(bare_dir.path()).unwrap();
    bare.fetch(&source.root().to_string_lossy(), "main").unwrap();
    bare.tag("v1/snapshot", "FETCH_HEAD").unwrap();
    assert_eq!(bare.rev_parse("v1/snapshot").unwrap(), oid);

    let clone_dir = TempDir::new().unwrap();
    let dest = clone_dir.path().join("clone");
    let clone = CliRepo::clone_from(&bare.root().to_string_lossy(), &dest, true).unwrap();
    clone.checkout("v1/snapshot").unwrap();
    assert!(dest.join("a.txt").exists());
}

#[test]
fn submodule_add_and_move() {
    let (_sub_dir, sub) = setup_repo();
    commit_file(&sub, "README.md", "submodule\n", "initial");

    let (_dir, repo) = setup_repo();
    commit_file(&repo, "README.md", "parent\n", "initial");

    let url = format!("file://{}", sub.root().display());
    repo.submodule_add(&url, "demo-submodule").unwrap();
    repo.add_all().unwrap();
    repo.commit("add submodule").unwrap();
    assert!(repo.root().join("demo-submodule/README.md").exists());
    assert!(repo.root().join(".gitmodules").exists());

    repo.move_path("demo-submodule", "demo-submodule-2").unwrap();
    repo.add_all().unwrap();
    repo.commit("move submodule").unwrap();
    assert!(!repo.root().join("demo-submodule").exists());
    assert!(repo.root().join("demo-submodule-2/README.md").exists());
    let gitmodules = std::fs::read_to_string(repo.root().join(".gitmodules")).unwrap();
    assert!(gitmodules.contains("demo-submodule-2"));
}
