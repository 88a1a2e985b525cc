//! Git service for client library working copies.
//!
//! Uses the git CLI via the process service. All operations are blocking.

use crate::domain::{Stage, WorkingCopyStatus};
use crate::error::{GitError, GitResult, ProcessError};
use crate::services::process::{CommandLine, ProcessService};
use std::path::Path;

/// Git service for clone/checkout/pull of working copies
#[derive(Debug, Clone)]
pub struct GitService {
    process: ProcessService,
    program: String,
}

impl GitService {
    /// Create a new GitService running `git` through the given process service
    pub fn new(process: ProcessService) -> Self {
        Self {
            process,
            program: "git".to_string(),
        }
    }

    /// Run git with `args` inside `dir`, returning stdout
    fn git(&self, dir: &Path, args: &[&str]) -> GitResult<String> {
        let command = CommandLine::new(&self.program).args(args).current_dir(dir);
        let output = self
            .process
            .run(Stage::SyncLibraries, &command)
            .map_err(|e| match e {
                ProcessError::Failed { command, stderr, .. } => {
                    GitError::Operation(format!("`{}` failed: {}", command, stderr))
                }
                other => GitError::Operation(other.to_string()),
            })?;

        Ok(output.stdout_text())
    }

    fn ensure_repository(&self, path: &Path) -> GitResult<()> {
        if !path.join(".git").exists() {
            return Err(GitError::NotARepository(path.to_path_buf()));
        }
        Ok(())
    }

    /// Clone `url` into `destination`, optionally on a given branch
    pub fn clone_repo(&self, url: &str, destination: &Path, branch: Option<&str>) -> GitResult<()> {
        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                GitError::Operation(format!("invalid clone destination: {}", destination.display()))
            })?;
        std::fs::create_dir_all(parent)?;

        let mut args = vec!["clone"];
        if let Some(branch) = branch {
            args.extend(["--branch", branch]);
        }
        args.extend([url, name.as_str()]);

        self.git(parent, &args)?;
        Ok(())
    }

    /// Switch a working copy to a branch or tag
    pub fn checkout(&self, path: &Path, revision: &str) -> GitResult<()> {
        self.ensure_repository(path)?;
        self.git(
            path,
            &["-c", "advice.detachedHead=false", "checkout", revision],
        )?;
        Ok(())
    }

    /// Fast-forward the current branch from its upstream
    pub fn pull(&self, path: &Path) -> GitResult<()> {
        self.ensure_repository(path)?;
        self.git(path, &["pull", "--ff-only"])?;
        Ok(())
    }

    /// Get the status of a working copy
    pub fn status(&self, path: &Path) -> GitResult<WorkingCopyStatus> {
        self.ensure_repository(path)?;
        let output = self.git(path, &["status", "--porcelain"])?;
        Ok(WorkingCopyStatus::from_porcelain(&output))
    }

    /// Get the current branch of a working copy ("HEAD" when detached)
    pub fn current_branch(&self, path: &Path) -> GitResult<String> {
        self.ensure_repository(path)?;
        self.git(path, &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Commit currently checked out
    pub fn head_revision(&self, path: &Path) -> GitResult<String> {
        self.ensure_repository(path)?;
        self.git(path, &["rev-parse", "HEAD"])
    }

    /// Commit a tag points to
    pub fn tag_revision(&self, path: &Path, tag: &str) -> GitResult<String> {
        self.ensure_repository(path)?;
        self.git(path, &["rev-parse", &format!("refs/tags/{}^{{commit}}", tag)])
    }
}
