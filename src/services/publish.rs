//! Uploads the REST API spec to the documentation host.

use crate::config::PublishConfig;
use crate::domain::Stage;
use crate::error::PublishError;
use crate::services::process::{CommandLine, CommandOutput, ProcessService};
use std::path::Path;

/// Drives the documentation host's CLI (`rdme openapi`)
#[derive(Debug, Clone)]
pub struct Publisher {
    process: ProcessService,
    config: PublishConfig,
}

impl Publisher {
    pub fn new(process: ProcessService, config: PublishConfig) -> Self {
        Self { process, config }
    }

    /// Publish with the credential taken from the configured environment variable
    pub fn publish(&self, spec_path: &Path) -> Result<CommandOutput, PublishError> {
        let key = std::env::var(&self.config.api_key_env).ok();
        self.publish_with_key(spec_path, key.as_deref())
    }

    /// Publish `spec_path` to the configured document.
    ///
    /// Credential, document id and spec file are all checked before the CLI runs.
    pub fn publish_with_key(
        &self,
        spec_path: &Path,
        api_key: Option<&str>,
    ) -> Result<CommandOutput, PublishError> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| PublishError::MissingCredential(self.config.api_key_env.clone()))?;

        let document_id = self.config.document_id.trim();
        if document_id.is_empty() {
            return Err(PublishError::MissingDocumentId);
        }

        if !spec_path.is_file() {
            return Err(PublishError::SpecNotFound(spec_path.to_path_buf()));
        }

        tracing::info!("Publishing {} to document {}", spec_path.display(), document_id);

        let command = CommandLine::new(&self.config.command)
            .arg("openapi")
            .arg(spec_path)
            .secret_arg("--key=", api_key)
            .arg(format!("--id={}", document_id));

        Ok(self.process.run(Stage::Publish, &command)?)
    }
}
