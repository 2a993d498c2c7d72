//! Test case generator file storage
//!
//! This crate owns the two server-local directories the service writes to:
//!
//! - the **uploads** directory, holding requirement documents exactly as they were received
//! - the **generated** directory, holding documents produced by the generator and served
//!   read-only over HTTP
//!
//! ## Storage Model
//!
//! Both directories are flat and managed through a [`FilesService`] bound to one root:
//!
//! ```text
//! uploads/
//! ├── 20240101T120000123-1a2b3c4d-requirements.docx
//! └── 20240101T120000456-9f8e7d6c-requirements.docx
//! generated/
//! └── requirements-cases.docx
//! ```
//!
//! - Uploads are never overwritten: every stored name carries a UTC timestamp and a random
//!   suffix, and the file is opened with `create_new`
//! - Generated documents keep the name chosen by the generator
//! - Stored names only contain `[A-Za-z0-9._-]`, so they are safe to use in URLs
//!
//! ## Example Usage
//!
//! ```no_run
//! use testgen_files::FilesService;
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), testgen_files::FilesError> {
//! let uploads = FilesService::ensure(Path::new("uploads")).await?;
//! let stored = uploads
//!     .store("requirements.docx", None, b"PK\x03\x04")
//!     .await?;
//! println!("stored at {}", stored.path.display());
//! # Ok(())
//! # }
//! ```

mod constants;
mod files;

pub use constants::{FALLBACK_FILENAME, STORED_NAME_TIMESTAMP_FORMAT};
pub use files::{sanitise_filename, FileMetadata, FilesService};

/// Errors that can occur during file operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root directory does not exist or is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// Path validation failed (potential directory traversal or unsafe path)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Source file for an import does not exist
    #[error("File not found: {0}")]
    NotFound(String),

    /// A stored name collided with an existing file
    #[error("File {0} already exists in storage")]
    FileAlreadyExists(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
