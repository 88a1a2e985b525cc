//! Pipeline stages.

use serde::{Deserialize, Serialize};

/// A step of the build-and-publish workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Setup,
    BuildSpec,
    SyncLibraries,
    AddSamples,
    ConvertJson,
    PostmanConvert,
    PostmanUpload,
    Publish,
}

impl Stage {
    /// Identifier used in log file names
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::BuildSpec => "build-spec",
            Self::SyncLibraries => "sync-libraries",
            Self::AddSamples => "add-samples",
            Self::ConvertJson => "convert-json",
            Self::PostmanConvert => "postman-convert",
            Self::PostmanUpload => "postman-upload",
            Self::Publish => "publish",
        }
    }

    /// Get the display name for this stage
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Setup => "Installing spec builder dependencies",
            Self::BuildSpec => "Building OpenAPI specs",
            Self::SyncLibraries => "Synchronizing client libraries",
            Self::AddSamples => "Adding code samples",
            Self::ConvertJson => "Converting specs to JSON",
            Self::PostmanConvert => "Converting spec to Postman collection",
            Self::PostmanUpload => "Updating Postman collection",
            Self::Publish => "Publishing spec",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
