//! # Testgen Core
//!
//! Core logic for the test case generator.
//!
//! This crate owns everything between "a document arrived" and "test cases are ready":
//! - Configuration resolved once at startup from the environment
//! - Upload validation and storage under the uploads directory
//! - Running the external generator process with bounded concurrency
//! - Publishing generated documents into the generated directory
//!
//! **No API concerns**: HTTP routing, multipart parsing, and the presentation client belong in
//! `api-rest`, `api-shared`, and `testgen-client`.

pub mod config;
pub mod constants;
pub mod error;
pub mod generator;
pub mod service;
pub mod validation;

pub use config::{CoreConfig, GeneratorConfig};
pub use error::{CoreError, CoreResult};
pub use generator::{GenerationError, GenerationOutput, Generator, ProcessGenerator};
pub use service::{GenerationReport, GenerationService, PublishedArtifact, Upload, public_url};
pub use testgen_files::{FileMetadata, FilesError};
