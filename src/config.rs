//! Configuration management for oas-tools.
//!
//! Supports layered configuration: defaults → project → user → env

use crate::domain::{ClientLibrary, Revision};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-repository configuration file
pub const PROJECT_CONFIG_FILE: &str = ".oas-tools.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub python: PythonConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub postman: PostmanConfig,
    #[serde(default = "default_libraries")]
    pub libraries: Vec<LibraryConfig>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            python: PythonConfig::default(),
            build: BuildConfig::default(),
            git: GitConfig::default(),
            logs: LogsConfig::default(),
            publish: PublishConfig::default(),
            postman: PostmanConfig::default(),
            libraries: default_libraries(),
        }
    }
}

impl ProjectConfig {
    /// Load configuration with hierarchy: defaults → project → user → env
    pub fn load(project_root: Option<&Path>) -> Result<Self, ConfigError> {
        use config::{Config, Environment, File};

        let mut builder = Config::builder();

        // 1. Start with defaults
        builder = builder.add_source(
            config::File::from_str(
                include_str!("../default_config.toml"),
                config::FileFormat::Toml,
            )
            .required(false),
        );

        // 2. Project-specific config (.oas-tools.toml in project root)
        if let Some(root) = project_root {
            let project_config = root.join(PROJECT_CONFIG_FILE);
            if project_config.exists() {
                builder = builder.add_source(File::from(project_config).required(false));
            }
        }

        // 3. User config (~/.config/oas-tools/config.toml)
        if let Some(config_dir) = directories::ProjectDirs::from("com", "asana", "oas-tools") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(File::from(user_config).required(false));
            }
        }

        // 4. Environment variables (OAS_TOOLS__*)
        builder = builder.add_source(
            Environment::with_prefix("OAS_TOOLS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve the library table against the build directory.
    ///
    /// Every entry must carry a unique name and at most one of `branch`/`tag`.
    pub fn client_libraries(&self, build_dir: &Path) -> Result<Vec<ClientLibrary>, ConfigError> {
        let mut libraries: Vec<ClientLibrary> = Vec::with_capacity(self.libraries.len());

        for entry in &self.libraries {
            if entry.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "library with url {} has no name",
                    entry.url
                )));
            }
            if libraries.iter().any(|l| l.name == entry.name) {
                return Err(ConfigError::Invalid(format!(
                    "library {} is declared twice",
                    entry.name
                )));
            }

            let revision = match (&entry.branch, &entry.tag) {
                (Some(_), Some(_)) => {
                    return Err(ConfigError::Invalid(format!(
                        "library {} sets both branch and tag",
                        entry.name
                    )))
                }
                (Some(branch), None) => Revision::Branch(branch.clone()),
                (None, Some(tag)) => Revision::Tag(tag.clone()),
                (None, None) => Revision::Branch(self.git.default_branch.clone()),
            };

            let path = entry
                .path
                .clone()
                .unwrap_or_else(|| PathBuf::from(&entry.name));

            libraries.push(ClientLibrary::new(
                entry.name.clone(),
                entry.url.clone(),
                build_dir.join(path),
                revision,
            ));
        }

        Ok(libraries)
    }
}

/// Repository layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory receiving the spec artifacts (relative to project root)
    #[serde(default = "default_defs_directory")]
    pub defs: PathBuf,
    /// Directory holding client library working copies (relative to project root)
    #[serde(default = "default_build_directory")]
    pub build: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            defs: default_defs_directory(),
            build: default_build_directory(),
        }
    }
}

fn default_defs_directory() -> PathBuf {
    PathBuf::from("defs")
}

fn default_build_directory() -> PathBuf {
    PathBuf::from("build")
}

/// Python toolchain used to drive the spec builder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PythonConfig {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
        }
    }
}

fn default_interpreter() -> String {
    "python3".to_string()
}

/// Spec build options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Also copy the SDK-flavored spec
    #[serde(default)]
    pub include_sdk_spec: bool,
}

/// Git-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Branch tracked by libraries that name neither branch nor tag
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            default_branch: default_branch(),
        }
    }
}

fn default_branch() -> String {
    "master".to_string()
}

/// External command log persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    /// Directory for per-stage command logs (relative to project root)
    #[serde(default = "default_logs_directory")]
    pub directory: PathBuf,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            directory: default_logs_directory(),
        }
    }
}

fn default_logs_directory() -> PathBuf {
    PathBuf::from("build/logs")
}

/// Documentation host publishing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Third-party publishing CLI
    #[serde(default = "default_publish_command")]
    pub command: String,
    /// Target document identifier on the documentation host
    #[serde(default)]
    pub document_id: String,
    /// Environment variable holding the publishing credential
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            command: default_publish_command(),
            document_id: String::new(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_publish_command() -> String {
    "rdme".to_string()
}

fn default_api_key_env() -> String {
    "README_API_KEY".to_string()
}

/// Postman collection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostmanConfig {
    #[serde(default = "default_postman_api")]
    pub api_base_url: String,
    /// Collection file name used when POSTMAN_COLLECTION_FILE is unset
    #[serde(default = "default_collection_file")]
    pub default_collection_file: String,
}

impl Default for PostmanConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_postman_api(),
            default_collection_file: default_collection_file(),
        }
    }
}

fn default_postman_api() -> String {
    "https://api.getpostman.com".to_string()
}

fn default_collection_file() -> String {
    "asana_postman_collection.json".to_string()
}

/// One entry of the client library table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    pub name: String,
    pub url: String,
    /// Destination relative to the build directory; defaults to `name`
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

impl LibraryConfig {
    fn tracking(name: &str, repo: &str) -> Self {
        Self {
            name: name.to_string(),
            url: format!("https://github.com/Asana/{}.git", repo),
            path: Some(PathBuf::from(name)),
            branch: None,
            tag: None,
        }
    }

    fn pinned(name: &str, repo: &str, tag: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            ..Self::tracking(name, repo)
        }
    }
}

fn default_libraries() -> Vec<LibraryConfig> {
    vec![
        LibraryConfig::tracking("java", "java-asana"),
        LibraryConfig::tracking("node", "node-asana"),
        LibraryConfig::tracking("python", "python-asana"),
        LibraryConfig::tracking("php", "php-asana"),
        LibraryConfig::tracking("ruby", "ruby-asana"),
        LibraryConfig::pinned("node-preview", "node-asana", "v3.0.0"),
        LibraryConfig::pinned("python-preview", "python-asana", "v5.0.0"),
    ]
}
