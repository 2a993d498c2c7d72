//! Generation service.
//!
//! Ties one upload to one generator run: validate, store, run under an admission permit, then
//! publish whatever document the generator produced so it can be downloaded.

use crate::config::CoreConfig;
use crate::constants::GENERATED_ROUTE_PREFIX;
use crate::generator::{Generator, ProcessGenerator};
use crate::validation::validate_upload_media_type;
use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use testgen_files::{FileMetadata, FilesService};
use tokio::sync::Semaphore;

/// A document received from a client.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Filename as sent by the client
    pub file_name: String,
    /// Declared media type, if the client sent one
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// A generated document made available under [`GENERATED_ROUTE_PREFIX`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedArtifact {
    /// Name inside the generated directory
    pub file_name: String,
    /// Relative URL, e.g. `/generated/req-cases.docx`
    pub url: String,
    /// Absolute path inside the generated directory
    pub path: PathBuf,
}

/// Outcome of a successful generation.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub test_cases: String,
    pub artifact: Option<PublishedArtifact>,
    pub upload: FileMetadata,
}

/// Upload-and-generate operations - no HTTP concerns
#[derive(Clone)]
pub struct GenerationService {
    cfg: Arc<CoreConfig>,
    generator: Arc<dyn Generator>,
    uploads: FilesService,
    generated: FilesService,
    permits: Arc<Semaphore>,
}

impl GenerationService {
    /// Creates a service running the configured generator process.
    ///
    /// Creates the uploads and generated directories if they do not exist.
    ///
    /// # Errors
    ///
    /// Same as [`GenerationService::with_generator`].
    pub async fn new(cfg: Arc<CoreConfig>) -> CoreResult<Self> {
        let generator = Arc::new(ProcessGenerator::new(cfg.generator().clone()));
        Self::with_generator(cfg, generator).await
    }

    /// Creates a service around any [`Generator`].
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Files` if either directory cannot be created, and
    /// `CoreError::InvalidConfig` if the two directories are the same or one contains the
    /// other once canonicalised.
    pub async fn with_generator(
        cfg: Arc<CoreConfig>,
        generator: Arc<dyn Generator>,
    ) -> CoreResult<Self> {
        let uploads = FilesService::ensure(cfg.uploads_dir()).await?;
        let generated = FilesService::ensure(cfg.generated_dir()).await?;
        check_separate(uploads.root_directory(), generated.root_directory())?;
        let permits = Arc::new(Semaphore::new(cfg.max_concurrent_generations()));

        Ok(Self {
            cfg,
            generator,
            uploads,
            generated,
            permits,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Canonical path of the directory served under [`GENERATED_ROUTE_PREFIX`].
    pub fn generated_dir(&self) -> &Path {
        self.generated.root_directory()
    }

    /// Canonical path of the uploads directory.
    pub fn uploads_dir(&self) -> &Path {
        self.uploads.root_directory()
    }

    /// Number of generator runs that could start right now.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Generates test cases for one uploaded document.
    ///
    /// The media type is checked before anything is written. The generator runs exactly once;
    /// if all permits are taken this waits for one.
    ///
    /// # Errors
    ///
    /// Returns a `CoreError` if:
    /// - the declared media type is not `.docx` (`UnsupportedFileType`),
    /// - the upload cannot be stored or the generated document cannot be published (`Files`),
    /// - the generator fails to start, exits non-zero, times out, or prints malformed
    ///   output (`Generation`).
    pub async fn generate(&self, upload: Upload) -> CoreResult<GenerationReport> {
        validate_upload_media_type(upload.media_type.as_deref())?;

        let stored = self
            .uploads
            .store(
                &upload.file_name,
                upload.media_type.as_deref(),
                &upload.bytes,
            )
            .await?;

        tracing::info!(
            original = %stored.original_filename,
            stored = %stored.stored_name,
            size_bytes = stored.size_bytes,
            sha256 = %stored.sha256,
            "upload stored"
        );

        let queued = Instant::now();
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| CoreError::AdmissionClosed)?;
        tracing::debug!(
            waited_ms = queued.elapsed().as_millis() as u64,
            "generation permit acquired"
        );

        // The permit covers publishing too: generators may reuse one output path
        let output = self.generator.generate(&stored.path).await?;
        let artifact = match output
            .word_file_path
            .filter(|path| !path.as_os_str().is_empty())
        {
            Some(reported) => Some(self.publish(&reported).await?),
            None => None,
        };

        Ok(GenerationReport {
            test_cases: output.test_cases,
            artifact,
            upload: stored,
        })
    }

    /// Accepts a cleanup request.
    ///
    /// Nothing is removed: uploads and generated documents have no expiry policy.
    pub fn cleanup(&self) {
        tracing::info!(
            uploads = %self.uploads.root_directory().display(),
            generated = %self.generated.root_directory().display(),
            "cleanup requested; files retained"
        );
    }

    async fn publish(&self, reported: &Path) -> CoreResult<PublishedArtifact> {
        let source = match self.cfg.generator().working_dir() {
            Some(dir) if reported.is_relative() => dir.join(reported),
            _ => reported.to_path_buf(),
        };

        let imported = self.generated.import(&source).await?;

        tracing::info!(
            source = %source.display(),
            published = %imported.stored_name,
            size_bytes = imported.size_bytes,
            "generated document published"
        );

        Ok(PublishedArtifact {
            url: public_url(&imported.stored_name),
            file_name: imported.stored_name,
            path: imported.path,
        })
    }
}

/// Relative URL of a document in the generated directory.
pub fn public_url(stored_name: &str) -> String {
    format!("{GENERATED_ROUTE_PREFIX}/{stored_name}")
}

/// Uploads must never be reachable under [`GENERATED_ROUTE_PREFIX`], and published
/// documents must not land among uploads.
fn check_separate(uploads: &Path, generated: &Path) -> CoreResult<()> {
    if uploads.starts_with(generated) || generated.starts_with(uploads) {
        return Err(CoreError::InvalidConfig(format!(
            "uploads directory {} and generated directory {} must not overlap",
            uploads.display(),
            generated.display()
        )));
    }
    Ok(())
}
