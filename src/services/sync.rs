//! Clone-or-update of client library working copies.

use crate::domain::{ClientLibrary, Revision, SyncOutcome, SyncReport};
use crate::error::{GitError, GitResult, SyncError};
use crate::services::git::GitService;
use std::path::Path;

/// Brings every library of the table to its configured revision
#[derive(Debug, Clone)]
pub struct LibrarySynchronizer {
    git: GitService,
}

impl LibrarySynchronizer {
    pub fn new(git: GitService) -> Self {
        Self { git }
    }

    /// Synchronize libraries in table order, stopping at the first failure.
    ///
    /// Libraries handled before the failure keep their new state.
    pub fn sync_all(&self, libraries: &[ClientLibrary]) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();

        for library in libraries {
            tracing::info!(
                "Synchronizing {} ({}) into {}",
                library.name,
                library.revision,
                library.destination.display()
            );

            let outcome = self.sync(library).map_err(|source| SyncError::Library {
                library: library.name.clone(),
                source,
            })?;

            tracing::info!("{}: {}", library.name, outcome.label());
            report.record(library, outcome);
        }

        Ok(report)
    }

    /// Synchronize one library
    pub fn sync(&self, library: &ClientLibrary) -> GitResult<SyncOutcome> {
        let path = library.destination.as_path();

        if library.is_present() {
            self.ensure_clean(path)?;
            match &library.revision {
                Revision::Branch(branch) => {
                    self.git.checkout(path, branch)?;
                    self.git.pull(path)?;
                    Ok(SyncOutcome::Updated)
                }
                Revision::Tag(tag) => {
                    self.git.checkout(path, tag)?;
                    self.verify_tag(path, tag)?;
                    Ok(SyncOutcome::Pinned)
                }
            }
        } else {
            match &library.revision {
                Revision::Branch(branch) => {
                    self.git.clone_repo(&library.url, path, Some(branch))?;
                }
                Revision::Tag(tag) => {
                    self.git.clone_repo(&library.url, path, None)?;
                    self.git.checkout(path, tag)?;
                    self.verify_tag(path, tag)?;
                }
            }
            Ok(SyncOutcome::Cloned)
        }
    }

    /// Refuse to touch a working copy with local modifications
    fn ensure_clean(&self, path: &Path) -> GitResult<()> {
        let status = self.git.status(path)?;
        if !status.is_clean() {
            return Err(GitError::WorkingCopyDirty {
                path: path.to_path_buf(),
                status: status.description(),
            });
        }
        Ok(())
    }

    fn verify_tag(&self, path: &Path, tag: &str) -> GitResult<()> {
        let head = self.git.head_revision(path)?;
        let expected = self.git.tag_revision(path, tag)?;
        if head != expected {
            return Err(GitError::TagMismatch {
                path: path.to_path_buf(),
                tag: tag.to_string(),
                head,
                expected,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::git::test_support::{commit_file, create_test_repo, git};
    use crate::services::process::ProcessService;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn synchronizer() -> (LibrarySynchronizer, GitService) {
        let git = GitService::new(ProcessService::without_logs().quiet());
        (LibrarySynchronizer::new(git.clone()), git)
    }

    fn library(name: &str, upstream: &Path, dest: PathBuf, revision: Revision) -> ClientLibrary {
        ClientLibrary::new(
            name.to_string(),
            upstream.to_string_lossy().into_owned(),
            dest,
            revision,
        )
    }

    #[test]
    fn test_clone_then_fast_forward() {
        let temp = TempDir::new().unwrap();
        let upstream = temp.path().join("upstream");
        create_test_repo(&upstream);

        let (sync, git_service) = synchronizer();
        let lib = library(
            "python",
            &upstream,
            temp.path().join("build/python"),
            Revision::Branch("master".into()),
        );

        assert_eq!(sync.sync(&lib).unwrap(), SyncOutcome::Cloned);

        commit_file(&upstream, "CHANGELOG.md", "v2");
        assert_eq!(sync.sync(&lib).unwrap(), SyncOutcome::Updated);
        assert_eq!(sync.sync(&lib).unwrap(), SyncOutcome::Updated);

        assert_eq!(git_service.current_branch(&lib.destination).unwrap(), "master");
        assert_eq!(
            git_service.head_revision(&lib.destination).unwrap(),
            git_service.head_revision(&upstream).unwrap()
        );
        assert!(lib.destination.join("CHANGELOG.md").exists());
    }

    #[test]
    fn test_detached_copy_returns_to_branch() {
        let temp = TempDir::new().unwrap();
        let upstream = temp.path().join("upstream");
        create_test_repo(&upstream);

        let (sync, git_service) = synchronizer();
        let lib = library(
            "java",
            &upstream,
            temp.path().join("build/java"),
            Revision::Branch("master".into()),
        );
        assert_eq!(sync.sync(&lib).unwrap(), SyncOutcome::Cloned);

        git(&lib.destination, &["checkout", "--detach"]);
        assert_eq!(git_service.current_branch(&lib.destination).unwrap(), "HEAD");
        commit_file(&upstream, "CHANGELOG.md", "v2");

        assert_eq!(sync.sync(&lib).unwrap(), SyncOutcome::Updated);
        assert_eq!(git_service.current_branch(&lib.destination).unwrap(), "master");
        assert_eq!(
            git_service.head_revision(&lib.destination).unwrap(),
            git_service.head_revision(&upstream).unwrap()
        );
        assert!(lib.destination.join("CHANGELOG.md").exists());
    }

    #[test]
    fn test_pinned_tag_never_moves() {
        let temp = TempDir::new().unwrap();
        let upstream = temp.path().join("upstream");
        create_test_repo(&upstream);
        git(&upstream, &["tag", "v1.0.0"]);
        commit_file(&upstream, "NEXT.md", "unreleased");

        let (sync, git_service) = synchronizer();
        let lib = library(
            "node-preview",
            &upstream,
            temp.path().join("build/node-preview"),
            Revision::Tag("v1.0.0".into()),
        );

        assert_eq!(sync.sync(&lib).unwrap(), SyncOutcome::Cloned);
        let tag = git_service.tag_revision(&lib.destination, "v1.0.0").unwrap();
        assert_eq!(git_service.head_revision(&lib.destination).unwrap(), tag);

        // Move off the tag, then rerun
        git(&lib.destination, &["checkout", "master"]);
        assert_eq!(sync.sync(&lib).unwrap(), SyncOutcome::Pinned);
        assert_eq!(sync.sync(&lib).unwrap(), SyncOutcome::Pinned);

        assert_eq!(git_service.head_revision(&lib.destination).unwrap(), tag);
        assert!(!lib.destination.join("NEXT.md").exists());
    }

    #[test]
    fn test_dirty_working_copy_fails_without_losing_changes() {
        let temp = TempDir::new().unwrap();
        let upstream = temp.path().join("upstream");
        create_test_repo(&upstream);

        let (sync, _) = synchronizer();
        let lib = library(
            "ruby",
            &upstream,
            temp.path().join("build/ruby"),
            Revision::Branch("master".into()),
        );
        sync.sync(&lib).unwrap();

        fs::write(lib.destination.join("README.md"), "local edit").unwrap();
        let err = sync.sync(&lib).unwrap_err();

        assert!(matches!(err, GitError::WorkingCopyDirty { .. }));
        assert_eq!(
            fs::read_to_string(lib.destination.join("README.md")).unwrap(),
            "local edit"
        );
    }

    #[test]
    fn test_existing_non_repository_is_rejected() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("build/php");
        fs::create_dir_all(&dest).unwrap();

        let (sync, _) = synchronizer();
        let lib = library(
            "php",
            temp.path(),
            dest,
            Revision::Branch("master".into()),
        );

        assert!(matches!(
            sync.sync(&lib).unwrap_err(),
            GitError::NotARepository(_)
        ));
    }

    #[test]
    fn test_failure_stops_run_and_keeps_earlier_libraries() {
        let temp = TempDir::new().unwrap();
        let upstream = temp.path().join("upstream");
        create_test_repo(&upstream);
        let build = temp.path().join("build");

        let libraries = vec![
            library("java", &upstream, build.join("java"), Revision::Branch("master".into())),
            library("node", &upstream, build.join("node"), Revision::Branch("master".into())),
            library(
                "python",
                &temp.path().join("missing-upstream"),
                build.join("python"),
                Revision::Branch("master".into()),
            ),
            library("php", &upstream, build.join("php"), Revision::Branch("master".into())),
        ];

        let (sync, _) = synchronizer();
        let err = sync.sync_all(&libraries).unwrap_err();

        let SyncError::Library { library, .. } = err;
        assert_eq!(library, "python");
        assert!(build.join("java/README.md").exists());
        assert!(build.join("node/README.md").exists());
        assert!(!build.join("php").exists());
    }

    #[test]
    fn test_sync_all_report() {
        let temp = TempDir::new().unwrap();
        let upstream = temp.path().join("upstream");
        create_test_repo(&upstream);
        git(&upstream, &["tag", "v0.1.0"]);

        let libraries = vec![
            library(
                "node",
                &upstream,
                temp.path().join("build/node"),
                Revision::Branch("master".into()),
            ),
            library(
                "node-preview",
                &upstream,
                temp.path().join("build/node-preview"),
                Revision::Tag("v0.1.0".into()),
            ),
        ];

        let (sync, _) = synchronizer();
        let first = sync.sync_all(&libraries).unwrap();
        assert_eq!(first.outcome("node"), Some(&SyncOutcome::Cloned));
        assert_eq!(first.outcome("node-preview"), Some(&SyncOutcome::Cloned));

        let second = sync.sync_all(&libraries).unwrap();
        assert_eq!(second.outcome("node"), Some(&SyncOutcome::Updated));
        assert_eq!(second.outcome("node-preview"), Some(&SyncOutcome::Pinned));
        assert_eq!(second.len(), 2);
    }
}
