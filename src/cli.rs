//! Command-line interface.

use crate::app::App;
use crate::domain::{OpenApiDir, Project};
use crate::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Build, enrich and publish the Asana OpenAPI specs.
#[derive(Debug, Parser)]
#[command(name = "oas-tools")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository root (defaults to the enclosing git repository).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Checkout of the OpenAPI spec builder.
    #[arg(long, env = "OPENAPI_DIR", global = true)]
    pub openapi_dir: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install the spec builder's Python dependencies.
    Setup,
    /// Build the specs and copy them into defs/.
    BuildSpec {
        /// Also copy the SDK spec.
        #[arg(long)]
        with_sdk: bool,
    },
    /// Clone or update the client library working copies.
    SyncLibraries,
    /// Add client library code samples to defs/asana_oas.yaml.
    AddSamples,
    /// Run build-spec, sync-libraries and add-samples.
    Build {
        /// Also copy the SDK spec.
        #[arg(long)]
        with_sdk: bool,
    },
    /// Write JSON copies of the specs.
    ConvertJson,
    /// Postman collection commands.
    #[command(subcommand)]
    Postman(PostmanCommand),
    /// Upload defs/asana_oas.yaml to the documentation host.
    Publish,
}

/// Postman subcommands.
#[derive(Debug, Subcommand)]
pub enum PostmanCommand {
    /// Convert defs/asana_oas.yaml into a Postman collection.
    Convert,
    /// Replace the remote collection with the local file.
    Upload,
}

impl Cli {
    /// Effective repository root
    pub fn project_root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| {
            Project::discover(None)
                .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
        })
    }
}

/// Run the parsed command line to completion.
///
/// Commands driving the spec builder resolve `OPENAPI_DIR` before anything else.
pub async fn execute(cli: Cli) -> Result<()> {
    let root = cli.project_root();
    tracing::debug!("Project root: {}", root.display());

    match cli.command {
        Commands::Setup => {
            let dir = OpenApiDir::resolve(cli.openapi_dir)?;
            App::new(root)?.setup(&dir)
        }
        Commands::BuildSpec { with_sdk } => {
            let dir = OpenApiDir::resolve(cli.openapi_dir)?;
            App::new(root)?.build_spec(&dir, with_sdk).map(drop)
        }
        Commands::Build { with_sdk } => {
            let dir = OpenApiDir::resolve(cli.openapi_dir)?;
            App::new(root)?.build(&dir, with_sdk)
        }
        Commands::SyncLibraries => App::new(root)?.sync_libraries().map(drop),
        Commands::AddSamples => App::new(root)?.add_samples().map(drop),
        Commands::ConvertJson => App::new(root)?.convert_json().map(drop),
        Commands::Postman(PostmanCommand::Convert) => App::new(root)?.postman_convert().map(drop),
        Commands::Postman(PostmanCommand::Upload) => App::new(root)?.postman_upload().await,
        Commands::Publish => App::new(root)?.publish(),
    }
}
