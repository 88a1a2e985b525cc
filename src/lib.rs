//! oas-tools: build, enrich and publish the Asana OpenAPI specs
//!
//! Drives the external spec builder, keeps client library working copies in
//! sync, injects their code samples into the REST spec, and pushes the result
//! to the documentation host and Postman.

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;

pub use app::App;
pub use cli::{Cli, Commands};
pub use config::ProjectConfig;
pub use error::{AppError, Result};
