//! Spec artifacts and the location of the external spec builder.

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Output documents of the external spec builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecArtifact {
    /// Public REST API spec
    Rest,
    /// App components spec
    AppComponents,
    /// SDK-oriented spec
    Sdk,
}

impl SpecArtifact {
    /// Artifacts copied on every build
    pub const REQUIRED: [SpecArtifact; 2] = [SpecArtifact::Rest, SpecArtifact::AppComponents];

    /// Artifacts for a build, optionally including the SDK spec
    pub fn for_build(include_sdk: bool) -> Vec<SpecArtifact> {
        let mut artifacts = Self::REQUIRED.to_vec();
        if include_sdk {
            artifacts.push(SpecArtifact::Sdk);
        }
        artifacts
    }

    /// Path of the generated file relative to the builder checkout
    pub fn dist_path(&self) -> PathBuf {
        let file = match self {
            Self::Rest => "public_asana_oas.yaml",
            Self::AppComponents => "public_app_components_oas.yaml",
            Self::Sdk => "public_asana_sdk_oas.yaml",
        };
        Path::new("dist").join(file)
    }

    /// File name inside `defs/`
    pub fn defs_file(&self) -> &'static str {
        match self {
            Self::Rest => "asana_oas.yaml",
            Self::AppComponents => "app_components_oas.yaml",
            Self::Sdk => "asana_sdk_oas.yaml",
        }
    }
}

impl std::fmt::Display for SpecArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.defs_file())
    }
}

/// Validated checkout of the external spec builder (`OPENAPI_DIR`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenApiDir(PathBuf);

impl OpenApiDir {
    /// Validate the configured location.
    ///
    /// Only the path itself is inspected; nothing is read or spawned.
    pub fn resolve(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => return Err(ConfigError::OpenApiDirMissing),
        };

        Self::resolve_in(path, &std::env::current_dir()?)
    }

    /// Validate `path`, taking a relative path against `base`.
    ///
    /// Commands run inside the checkout, so the stored path is always absolute.
    fn resolve_in(path: PathBuf, base: &Path) -> Result<Self, ConfigError> {
        let absolute = base.join(&path);
        if !absolute.is_dir() {
            return Err(ConfigError::OpenApiDirNotFound(path));
        }

        Ok(Self(absolute))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Python requirement manifest of the builder
    pub fn requirements(&self) -> PathBuf {
        self.0.join("requirements.txt")
    }

    /// Build entry point of the builder
    pub fn build_script(&self) -> PathBuf {
        self.0.join("build.py")
    }

    /// Generated location of an artifact
    pub fn artifact(&self, artifact: SpecArtifact) -> PathBuf {
        self.0.join(artifact.dist_path())
    }
}
