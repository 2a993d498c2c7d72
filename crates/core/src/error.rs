use crate::generator::GenerationError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("no file uploaded")]
    MissingFile,
    #[error("unsupported file type: {}", .0.as_deref().unwrap_or("<none>"))]
    UnsupportedFileType(Option<String>),
    #[error("file storage error: {0}")]
    Files(#[from] testgen_files::FilesError),
    #[error("test case generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("generation capacity is no longer available")]
    AdmissionClosed,
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
