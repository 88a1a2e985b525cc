//! Installs the spec builder's Python dependencies.

use crate::domain::{OpenApiDir, Stage};
use crate::error::{BuildError, BuildResult};
use crate::services::process::{CommandLine, CommandOutput, ProcessService};

/// Runs `pip install -r requirements.txt` for the spec builder
#[derive(Debug, Clone)]
pub struct DependencyInstaller {
    process: ProcessService,
    python: String,
}

impl DependencyInstaller {
    pub fn new(process: ProcessService, python: impl Into<String>) -> Self {
        Self {
            process,
            python: python.into(),
        }
    }

    /// Install the declared requirements into the current Python environment
    pub fn install(&self, openapi_dir: &OpenApiDir) -> BuildResult<CommandOutput> {
        let manifest = openapi_dir.requirements();
        if !manifest.is_file() {
            return Err(BuildError::MissingManifest(manifest));
        }

        tracing::info!("Installing requirements from {}", manifest.display());

        let command = CommandLine::new(&self.python)
            .args(["-m", "pip", "install", "-r"])
            .arg(&manifest)
            .current_dir(openapi_dir.path());

        Ok(self.process.run(Stage::Setup, &command)?)
    }
}
