//! Constants used throughout the test case generator core crate.
//!
//! Defaults for every configuration value live here so the binaries, the tests and the
//! documentation agree on them.

use std::time::Duration;

/// Media type of an Office Open XML word-processing document (`.docx`).
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Filename extension accepted by the presentation client.
pub const DOCX_EXTENSION: &str = ".docx";

/// Name of the multipart form field carrying the uploaded document.
pub const FILE_FIELD_NAME: &str = "file";

/// URL prefix under which generated documents are served.
pub const GENERATED_ROUTE_PREFIX: &str = "/generated";

/// Port used when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 5000;

/// Default directory for uploaded documents.
pub const DEFAULT_UPLOADS_DIR: &str = "uploads";

/// Default directory for generated documents.
pub const DEFAULT_GENERATED_DIR: &str = "generated";

/// Default generator executable.
pub const DEFAULT_GENERATOR_PROGRAM: &str = "python3";

/// Default leading arguments passed to the generator, before the document path.
pub const DEFAULT_GENERATOR_ARGS: &str = "testcase_generator.py";

/// Default number of generator processes allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT_GENERATIONS: usize = 4;

/// Default request body limit for uploads (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Upper bound accepted for `TESTGEN_GENERATION_TIMEOUT_SECS`.
pub const MAX_GENERATION_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Environment variable selecting the listening port.
pub const ENV_PORT: &str = "PORT";
/// Environment variable for the uploads directory.
pub const ENV_UPLOADS_DIR: &str = "TESTGEN_UPLOADS_DIR";
/// Environment variable for the generated documents directory.
pub const ENV_GENERATED_DIR: &str = "TESTGEN_GENERATED_DIR";
/// Environment variable for the generator executable.
pub const ENV_GENERATOR_PROGRAM: &str = "TESTGEN_GENERATOR_PROGRAM";
/// Environment variable for the generator's leading arguments.
pub const ENV_GENERATOR_ARGS: &str = "TESTGEN_GENERATOR_ARGS";
/// Environment variable for the generator working directory.
pub const ENV_GENERATOR_WORKDIR: &str = "TESTGEN_GENERATOR_WORKDIR";
/// Environment variable bounding concurrent generator processes.
pub const ENV_MAX_CONCURRENT_GENERATIONS: &str = "TESTGEN_MAX_CONCURRENT_GENERATIONS";
/// Environment variable for the optional generation timeout, in seconds.
pub const ENV_GENERATION_TIMEOUT_SECS: &str = "TESTGEN_GENERATION_TIMEOUT_SECS";
/// Environment variable for the upload body limit, in bytes.
pub const ENV_MAX_UPLOAD_BYTES: &str = "TESTGEN_MAX_UPLOAD_BYTES";
