//! Client library working copies and their synchronization state.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Revision a working copy follows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Revision {
    /// Track the tip of a branch
    Branch(String),
    /// Stay on a fixed tag
    Tag(String),
}

impl Revision {
    pub fn is_pinned(&self) -> bool {
        matches!(self, Self::Tag(_))
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Branch(name) => write!(f, "branch {}", name),
            Self::Tag(name) => write!(f, "tag {}", name),
        }
    }
}

/// A client library repository cloned under the build directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientLibrary {
    /// Table name (e.g. "python", "node-preview")
    pub name: String,
    /// Clone URL
    pub url: String,
    /// Working copy location
    pub destination: PathBuf,
    pub revision: Revision,
}

impl ClientLibrary {
    pub fn new(name: String, url: String, destination: PathBuf, revision: Revision) -> Self {
        Self {
            name,
            url,
            destination,
            revision,
        }
    }

    /// Whether a working copy is already on disk
    pub fn is_present(&self) -> bool {
        self.destination.exists()
    }
}

/// Working tree status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkingCopyStatus {
    /// No uncommitted changes
    Clean,
    /// Has uncommitted changes
    Dirty {
        modified: u32,
        staged: u32,
        untracked: u32,
    },
}

impl WorkingCopyStatus {
    /// Parse `git status --porcelain` output
    pub fn from_porcelain(output: &str) -> Self {
        if output.trim().is_empty() {
            return Self::Clean;
        }

        let mut modified = 0u32;
        let mut staged = 0u32;
        let mut untracked = 0u32;

        for line in output.lines() {
            let mut chars = line.chars();
            let (Some(index), Some(worktree)) = (chars.next(), chars.next()) else {
                continue;
            };

            match (index, worktree) {
                ('?', '?') => untracked += 1,
                (i, w) if i != ' ' && w != ' ' => {
                    staged += 1;
                    modified += 1;
                }
                (i, _) if i != ' ' => staged += 1,
                (_, w) if w != ' ' => modified += 1,
                _ => {}
            }
        }

        Self::Dirty {
            modified,
            staged,
            untracked,
        }
    }

    /// Check if the working copy is clean
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// Check if the working copy is dirty
    pub fn is_dirty(&self) -> bool {
        matches!(self, Self::Dirty { .. })
    }

    /// Get status description
    pub fn description(&self) -> String {
        match self {
            Self::Clean => "Clean".to_string(),
            Self::Dirty {
                modified,
                staged,
                untracked,
            } => {
                let mut parts = Vec::new();
                if *modified > 0 {
                    parts.push(format!("{}M", modified));
                }
                if *staged > 0 {
                    parts.push(format!("{}S", staged));
                }
                if *untracked > 0 {
                    parts.push(format!("{}?", untracked));
                }
                parts.join(" ")
            }
        }
    }
}

impl std::fmt::Display for WorkingCopyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// What synchronization did to one library
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Freshly cloned
    Cloned,
    /// Existing copy switched to its branch and fast-forwarded
    Updated,
    /// Existing copy re-checked-out at its tag
    Pinned,
}

impl SyncOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cloned => "cloned",
            Self::Updated => "updated",
            Self::Pinned => "pinned",
        }
    }
}

/// Per-library results of one synchronization run, in table order
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub entries: Vec<(String, SyncOutcome)>,
}

impl SyncReport {
    pub fn record(&mut self, library: &ClientLibrary, outcome: SyncOutcome) {
        self.entries.push((library.name.clone(), outcome));
    }

    pub fn outcome(&self, name: &str) -> Option<&SyncOutcome> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
