use std::path::Path;

use git2::{Repository, StatusOptions};

/// Branch name and working tree state of the repository containing a
/// directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchStatus {
    pub branch: String,
    pub dirty: bool,
}

/// Source control lookup used by the prompt.
pub trait BranchProbe {
    fn branch_status(&self, dir: &Path) -> Option<BranchStatus>;
}

pub struct GitProbe;

impl BranchProbe for GitProbe {
    fn branch_status(&self, dir: &Path) -> Option<BranchStatus> {
        let repo = Repository::discover(dir).ok()?;
        let head = repo.head().ok()?;
        let branch = head.shorthand()?.trim().to_string();
        // detached heads report "HEAD"
        if branch.is_empty() || branch.eq_ignore_ascii_case("HEAD") {
            return None;
        }

        let mut options = StatusOptions::new();
        options.include_untracked(true).include_ignored(false);
        let dirty = repo
            .statuses(Some(&mut options))
            .map(|statuses| !statuses.is_empty())
            .unwrap_or(false);

        Some(BranchStatus { branch, dirty })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn commit_all(repo: &Repository) {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = git2::Signature::now("test", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
            .unwrap();
    }

    #[test]
    fn test_no_repository() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(GitProbe.branch_status(tmp.path()), None);
    }

    #[test]
    fn test_clean_then_dirty() {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::init(tmp.path()).unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();
        commit_all(&repo);

        let status = GitProbe.branch_status(tmp.path()).unwrap();
        assert!(!status.branch.is_empty());
        assert!(!status.dirty);

        fs::write(tmp.path().join("b.txt"), "b").unwrap();
        let status = GitProbe.branch_status(tmp.path()).unwrap();
        assert!(status.dirty);
    }

    #[test]
    fn test_discovers_from_subdirectory() {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::init(tmp.path()).unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();
        commit_all(&repo);
        let nested = tmp.path().join("src").join("deep");
        fs::create_dir_all(&nested).unwrap();

        assert!(GitProbe.branch_status(&nested).is_some());
    }
}
