//! Directory-scoped file storage service implementation
//!
//! This module provides the [`FilesService`] type. One instance is bound to one directory
//! (uploads or generated artifacts) and every operation stays inside that directory.
//!
//! # Naming
//!
//! - Uploaded documents are stored as `<timestamp>-<suffix>-<sanitised original name>`,
//!   where the timestamp uses [`STORED_NAME_TIMESTAMP_FORMAT`] in UTC and the suffix is
//!   random hex. Files are opened with `create_new`, so a collision surfaces as
//!   [`FilesError::FileAlreadyExists`] instead of clobbering another request's upload.
//! - Imported documents (generator output) keep their sanitised file name while it is free.
//!   A taken name gets the upload-style `<timestamp>-<suffix>-` prefix, so an import never
//!   replaces an earlier one. Importing a file that already lives in the directory is a
//!   no-op copy.
//!
//! # Security Model
//!
//! - The root is canonicalised at construction time
//! - Caller-supplied names are reduced to their final path component and restricted to
//!   `[A-Za-z0-9._-]` with no leading dots
//! - [`FilesService::resolve`] refuses any name that is not already in that form

use crate::constants::RANDOM_SUFFIX_LEN;
use crate::{FilesError, FALLBACK_FILENAME, STORED_NAME_TIMESTAMP_FORMAT};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Longest sanitised filename kept before the timestamp prefix is added.
const MAX_SANITISED_LEN: usize = 200;

/// Metadata for a stored file
///
/// Returned by [`FilesService::store`] and [`FilesService::import`]. The digest is only used
/// for log correlation; nothing is deduplicated by content.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FileMetadata {
    /// Filename as supplied by the caller (upload form or generator output path)
    pub original_filename: String,

    /// Name of the file inside the service's root directory
    pub stored_name: String,

    /// Absolute path of the stored file
    pub path: PathBuf,

    /// Size of the file in bytes
    pub size_bytes: u64,

    /// Media type declared by the uploader, if any
    ///
    /// This is recorded as received and never derived from the content.
    pub media_type: Option<String>,

    /// Hexadecimal SHA-256 digest of the content
    pub sha256: String,

    /// UTC timestamp when the file was stored
    pub stored_at: DateTime<Utc>,
}

/// Service for managing files within one directory
#[derive(Debug, Clone)]
pub struct FilesService {
    /// Canonicalised directory all operations are scoped to
    root_directory: PathBuf,
}

impl FilesService {
    /// Creates a new `FilesService` for an existing directory
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if:
    /// - the directory does not exist or is not a directory
    /// - path canonicalisation fails
    pub fn new(root_directory: &Path) -> Result<Self, FilesError> {
        if !root_directory.exists() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Directory does not exist: {}",
                root_directory.display()
            )));
        }

        if !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        let root_directory = root_directory.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        Ok(Self { root_directory })
    }

    /// Creates the directory (and parents) if needed, then binds a service to it
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if the directory cannot be created or validated.
    pub async fn ensure(root_directory: &Path) -> Result<Self, FilesError> {
        tokio::fs::create_dir_all(root_directory)
            .await
            .map_err(|e| {
                io_context(
                    e,
                    format!("Failed to create directory {}", root_directory.display()),
                )
            })?;
        Self::new(root_directory)
    }

    /// Stores uploaded bytes under a fresh, collision-free name
    ///
    /// # Arguments
    ///
    /// * `original_filename` - Filename supplied by the uploader; only its sanitised final
    ///   component is kept
    /// * `media_type` - Declared media type, recorded as-is
    /// * `bytes` - File content
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the generated name already exists (`FileAlreadyExists`)
    /// - the file cannot be created or written (I/O)
    pub async fn store(
        &self,
        original_filename: &str,
        media_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<FileMetadata, FilesError> {
        let stored_at = Utc::now();
        let stored_name = unique_name(original_filename, stored_at);
        let path = self.root_directory.join(&stored_name);

        let file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(FilesError::FileAlreadyExists(stored_name));
            }
            Err(e) => {
                return Err(io_context(
                    e,
                    format!("Failed to create file {}", path.display()),
                ))
            }
        };
        write_or_remove(file, &path, bytes).await?;

        tracing::debug!(
            stored_name = %stored_name,
            size_bytes = bytes.len(),
            "stored file"
        );

        Ok(FileMetadata {
            original_filename: original_filename.to_string(),
            stored_name,
            path,
            size_bytes: bytes.len() as u64,
            media_type: media_type.map(str::to_string),
            sha256: sha256_hex(bytes),
            stored_at,
        })
    }

    /// Copies a file produced elsewhere into this directory
    ///
    /// The sanitised source name is kept while no file with that name exists. Once it is
    /// taken, the copy gets the same `<timestamp>-<suffix>-` prefix as uploads, so earlier
    /// imports are never overwritten. The content is written to a hidden temporary file
    /// first and only then linked or renamed into place. If `source` already is a file in
    /// this directory, nothing is copied.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - `source` has no file name component (`InvalidPath`)
    /// - `source` does not exist (`NotFound`) or is not a regular file (`InvalidPath`)
    /// - reading, writing or moving the copy fails (I/O)
    pub async fn import(&self, source: &Path) -> Result<FileMetadata, FilesError> {
        let original_filename = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                FilesError::InvalidPath(format!("Path has no file name: {}", source.display()))
            })?
            .to_string();

        let canonical_source = match tokio::fs::canonicalize(source).await {
            Ok(path) => path,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FilesError::NotFound(original_filename));
            }
            Err(e) => {
                return Err(io_context(
                    e,
                    format!("Failed to resolve {}", source.display()),
                ))
            }
        };

        let source_metadata = tokio::fs::metadata(&canonical_source)
            .await
            .map_err(|e| io_context(e, format!("Failed to stat {}", source.display())))?;
        if !source_metadata.is_file() {
            return Err(FilesError::InvalidPath(format!(
                "Not a regular file: {}",
                source.display()
            )));
        }

        let bytes = tokio::fs::read(&canonical_source).await.map_err(|e| {
            io_context(e, format!("Failed to read {}", canonical_source.display()))
        })?;
        let stored_at = Utc::now();

        let in_root = canonical_source.parent() == Some(self.root_directory.as_path());
        let (stored_name, path) = match canonical_source.file_name().and_then(|n| n.to_str()) {
            Some(name) if in_root && sanitise_filename(name) == name => {
                (name.to_string(), canonical_source.clone())
            }
            _ => self.place(&original_filename, stored_at, &bytes).await?,
        };

        tracing::debug!(
            source = %canonical_source.display(),
            stored_name = %stored_name,
            size_bytes = bytes.len(),
            "imported file"
        );

        Ok(FileMetadata {
            original_filename,
            stored_name,
            path,
            size_bytes: bytes.len() as u64,
            media_type: None,
            sha256: sha256_hex(&bytes),
            stored_at,
        })
    }

    /// Writes `bytes` to a temporary file, then claims the sanitised name or a unique one
    async fn place(
        &self,
        original_filename: &str,
        stored_at: DateTime<Utc>,
        bytes: &[u8],
    ) -> Result<(String, PathBuf), FilesError> {
        let preferred = sanitise_filename(original_filename);
        let temp_path = self.root_directory.join(format!(
            ".{}.{}.tmp",
            preferred,
            uuid::Uuid::new_v4().simple()
        ));

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await
            .map_err(|e| {
                io_context(e, format!("Failed to create file {}", temp_path.display()))
            })?;
        write_or_remove(file, &temp_path, bytes).await?;

        // hard_link fails instead of replacing, so the first import keeps the plain name
        let preferred_path = self.root_directory.join(&preferred);
        let claimed = match tokio::fs::hard_link(&temp_path, &preferred_path).await {
            Ok(()) => Ok((preferred, preferred_path)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let stored_name = unique_name(original_filename, stored_at);
                let path = self.root_directory.join(&stored_name);
                match tokio::fs::rename(&temp_path, &path).await {
                    Ok(()) => return Ok((stored_name, path)),
                    Err(e) => Err(io_context(
                        e,
                        format!("Failed to move file to {}", path.display()),
                    )),
                }
            }
            Err(e) => Err(io_context(
                e,
                format!("Failed to link file to {}", preferred_path.display()),
            )),
        };

        if let Err(e) = tokio::fs::remove_file(&temp_path).await {
            tracing::warn!(path = %temp_path.display(), "failed to remove temporary file: {}", e);
        }
        claimed
    }

    /// Maps a stored name back to its absolute path
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidPath` if the name is not in stored-name form (path
    /// separators, leading dots, or characters outside `[A-Za-z0-9._-]`).
    pub fn resolve(&self, stored_name: &str) -> Result<PathBuf, FilesError> {
        if stored_name.is_empty() || sanitise_filename(stored_name) != stored_name {
            return Err(FilesError::InvalidPath(format!(
                "Not a stored file name: {stored_name}"
            )));
        }
        Ok(self.root_directory.join(stored_name))
    }

    /// Reads a stored file back
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if the name is invalid, missing (`NotFound`), or unreadable.
    pub async fn read(&self, stored_name: &str) -> Result<Vec<u8>, FilesError> {
        let path = self.resolve(stored_name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(FilesError::NotFound(stored_name.to_string()))
            }
            Err(e) => Err(io_context(
                e,
                format!("Failed to read file from {}", path.display()),
            )),
        }
    }

    /// Returns the canonicalised root directory
    #[must_use]
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }
}

/// Reduces an arbitrary filename to a safe, URL-friendly stored name
///
/// Keeps only the final path component, replaces every character outside
/// `[A-Za-z0-9._-]` with `_`, strips leading dots, and keeps at most the last 200
/// characters so the extension survives. Falls back to [`FALLBACK_FILENAME`] when nothing
/// is left.
pub fn sanitise_filename(name: &str) -> String {
    let base = name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // ASCII only from here on, so byte slicing is safe
    let tail = if cleaned.len() > MAX_SANITISED_LEN {
        &cleaned[cleaned.len() - MAX_SANITISED_LEN..]
    } else {
        cleaned.as_str()
    };

    let trimmed = tail.trim_start_matches('.');
    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

fn unique_name(original_filename: &str, stored_at: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        stored_at.format(STORED_NAME_TIMESTAMP_FORMAT),
        &suffix[..RANDOM_SUFFIX_LEN],
        sanitise_filename(original_filename)
    )
}

/// Writes and flushes `bytes`, removing the file at `path` if either step fails
async fn write_or_remove<W>(mut writer: W, path: &Path, bytes: &[u8]) -> Result<(), FilesError>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(bytes).await?;
        writer.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(writer);
        if let Err(remove_err) = tokio::fs::remove_file(path).await {
            tracing::warn!(
                path = %path.display(),
                "failed to remove partially written file: {}",
                remove_err
            );
        }
        return Err(io_context(
            e,
            format!("Failed to write file {}", path.display()),
        ));
    }
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn io_context(e: std::io::Error, context: String) -> FilesError {
    FilesError::Io(std::io::Error::new(e.kind(), format!("{context}: {e}")))
}
