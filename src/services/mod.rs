//! Infrastructure services for oas-tools.
//!
//! This module contains:
//! - ProcessService: External command execution and logging
//! - GitService: Git working copy operations
//! - DependencyInstaller / SpecBuilder: The external spec builder
//! - LibrarySynchronizer: Client library working copies
//! - SampleEnricher: Code samples in the REST spec
//! - convert / postman: JSON and Postman renditions of the specs
//! - PostmanClient: Postman API uploads
//! - Publisher: Documentation host uploads

pub mod builder;
pub mod convert;
pub mod git;
mod installer;
pub mod postman;
pub mod postman_api;
pub mod process;
mod publish;
pub mod samples;
mod sync;

pub use builder::SpecBuilder;
pub use git::GitService;
pub use installer::DependencyInstaller;
pub use postman::PostmanConverter;
pub use postman_api::{PostmanClient, UploadTarget};
pub use process::{CommandLine, CommandOutput, ProcessOutput, ProcessService};
pub use publish::Publisher;
pub use samples::SampleEnricher;
pub use sync::LibrarySynchronizer;
