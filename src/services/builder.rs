//! Runs the external spec builder and places its output under `defs/`.

use crate::domain::{OpenApiDir, SpecArtifact, Stage};
use crate::error::{BuildError, BuildResult};
use crate::services::process::{CommandLine, ProcessService};
use std::fs;
use std::path::{Path, PathBuf};

/// Invokes `build.py` and copies the generated specs
#[derive(Debug, Clone)]
pub struct SpecBuilder {
    process: ProcessService,
    python: String,
}

impl SpecBuilder {
    pub fn new(process: ProcessService, python: impl Into<String>) -> Self {
        Self {
            process,
            python: python.into(),
        }
    }

    /// Build the specs and copy `artifacts` into `defs_dir`.
    ///
    /// Nothing is copied when the build fails. Returns the written paths.
    pub fn build(
        &self,
        openapi_dir: &OpenApiDir,
        defs_dir: &Path,
        artifacts: &[SpecArtifact],
    ) -> BuildResult<Vec<PathBuf>> {
        let command = CommandLine::new(&self.python)
            .arg(openapi_dir.build_script())
            .current_dir(openapi_dir.path());

        self.process.run(Stage::BuildSpec, &command)?;

        copy_artifacts(openapi_dir, defs_dir, artifacts)
    }
}

/// Copy generated artifacts over any existing files in `defs_dir`.
///
/// Every source is checked before the first copy.
pub fn copy_artifacts(
    openapi_dir: &OpenApiDir,
    defs_dir: &Path,
    artifacts: &[SpecArtifact],
) -> BuildResult<Vec<PathBuf>> {
    for artifact in artifacts {
        let source = openapi_dir.artifact(*artifact);
        let metadata =
            fs::metadata(&source).map_err(|_| BuildError::MissingArtifact(source.clone()))?;
        if metadata.len() == 0 {
            return Err(BuildError::EmptyArtifact(source));
        }
    }

    fs::create_dir_all(defs_dir)?;

    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let source = openapi_dir.artifact(*artifact);
        let destination = defs_dir.join(artifact.defs_file());
        fs::copy(&source, &destination)?;
        tracing::info!("Copied {} -> {}", source.display(), destination.display());
        written.push(destination);
    }

    Ok(written)
}
