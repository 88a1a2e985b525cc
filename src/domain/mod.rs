//! Domain entities for oas-tools.
//!
//! This module contains the core entities:
//! - SpecArtifact / OpenApiDir: Spec builder outputs and their source checkout
//! - ClientLibrary: A client library working copy
//! - CodeSample: Per-language usage examples
//! - Stage: Steps of the workflow
//! - Project: The overall repository context

mod artifact;
mod library;
mod project;
mod sample;
mod stage;

pub use artifact::{OpenApiDir, SpecArtifact};
pub use library::{ClientLibrary, Revision, SyncOutcome, SyncReport, WorkingCopyStatus};
pub use project::Project;
pub use sample::{camel_case, preview_resource_name, CodeSample, Language};
pub use stage::Stage;
