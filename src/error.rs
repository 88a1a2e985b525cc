//! Unified error types for oas-tools.

use std::path::PathBuf;
use thiserror::Error;

/// Message shown when the spec builder location was not supplied.
pub const OPENAPI_DIR_MISSING: &str = "OPENAPI_DIR is not set. Export \
OPENAPI_DIR=<path to your checkout of the OpenAPI spec builder> \
(see the \"Setup\" section of README.md).";

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Synchronization error: {0}")]
    Sync(#[from] SyncError),

    #[error("Sample error: {0}")]
    Sample(#[from] SampleError),

    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("Postman error: {0}")]
    Postman(#[from] PostmanError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{}", OPENAPI_DIR_MISSING)]
    OpenApiDirMissing,

    #[error("OPENAPI_DIR does not point to a directory: {0}")]
    OpenApiDirNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("IO error resolving configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// External command errors
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with status {code}: {stderr}")]
    Failed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Failed to write command log {path}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Dependency installation and spec build errors
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Requirements manifest not found: {0}")]
    MissingManifest(PathBuf),

    #[error("Build output not found: {0}")]
    MissingArtifact(PathBuf),

    #[error("Build output is empty: {0}")]
    EmptyArtifact(PathBuf),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Git working copy errors
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("Working copy has uncommitted changes: {path} ({status})")]
    WorkingCopyDirty { path: PathBuf, status: String },

    #[error("Working copy {path} is at {head}, expected tag {tag} ({expected})")]
    TagMismatch {
        path: PathBuf,
        tag: String,
        head: String,
        expected: String,
    },

    #[error("Git operation failed: {0}")]
    Operation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client library synchronization errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to synchronize {library}: {source}")]
    Library {
        library: String,
        #[source]
        source: GitError,
    },
}

/// Code sample enrichment errors
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("Spec file not found: {0}")]
    SpecNotFound(PathBuf),

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Unexpected layout in {path}: {reason}")]
    Layout { path: PathBuf, reason: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// YAML to JSON and OpenAPI to Postman conversion errors
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Spec file not found: {0}")]
    SpecNotFound(PathBuf),

    #[error("Invalid OpenAPI document: {0}")]
    InvalidSpec(String),

    #[error("Unresolvable reference: {0}")]
    Reference(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Postman API errors
#[derive(Debug, Error)]
pub enum PostmanError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<&'static str>),

    #[error("Collection file not found: {0}")]
    CollectionNotFound(PathBuf),

    #[error("Invalid JSON in {path}: {source}")]
    InvalidCollection {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Documentation host publishing errors
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Missing publishing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("No target document configured (publish.document_id)")]
    MissingDocumentId,

    #[error("Spec file not found: {0}")]
    SpecNotFound(PathBuf),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for external commands
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

/// Result type alias for Git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type alias for build operations
pub type BuildResult<T> = std::result::Result<T, BuildError>;

/// Result type alias for sample enrichment
pub type SampleResult<T> = std::result::Result<T, SampleError>;

/// Result type alias for conversions
pub type ConvertResult<T> = std::result::Result<T, ConvertError>;
