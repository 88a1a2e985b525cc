//! Project entity representing the overall repository context.

use crate::config::ProjectConfig;
use crate::domain::SpecArtifact;
use std::path::PathBuf;

/// Represents the repository the tools operate on
#[derive(Debug, Clone)]
pub struct Project {
    /// Repository root path
    pub root_path: PathBuf,
    /// Directory receiving spec artifacts (absolute path)
    pub defs_directory: PathBuf,
    /// Directory holding client library working copies (absolute path)
    pub build_directory: PathBuf,
    /// Directory for external command logs (absolute path)
    pub logs_directory: PathBuf,
    /// Loaded configuration
    pub config: ProjectConfig,
}

impl Project {
    /// Create a new Project from a root path and configuration
    pub fn new(root_path: PathBuf, config: ProjectConfig) -> Self {
        let defs_directory = root_path.join(&config.paths.defs);
        let build_directory = root_path.join(&config.paths.build);
        let logs_directory = root_path.join(&config.logs.directory);

        Self {
            root_path,
            defs_directory,
            build_directory,
            logs_directory,
            config,
        }
    }

    /// Discover the project root by walking up from current directory
    pub fn discover(start_path: Option<PathBuf>) -> Option<PathBuf> {
        let start = start_path
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let mut current = start.as_path();
        loop {
            // Check for .git directory or file (worktree)
            let git_path = current.join(".git");
            if git_path.exists() {
                return Some(current.to_path_buf());
            }

            // Move up to parent
            match current.parent() {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }

    /// Path of an artifact inside `defs/`
    pub fn artifact_path(&self, artifact: SpecArtifact) -> PathBuf {
        self.defs_directory.join(artifact.defs_file())
    }

    /// Path of the main REST API spec
    pub fn rest_spec_path(&self) -> PathBuf {
        self.artifact_path(SpecArtifact::Rest)
    }
}
