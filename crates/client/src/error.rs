/// Failures surfaced to the user as a single message.
///
/// The `Display` text is exactly what the form shows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("Please select a valid .docx file")]
    InvalidFile,
    #[error("Please select a file first")]
    NoFileSelected,
    #[error("Generation already in progress")]
    Busy,
    /// Error message returned by the server
    #[error("{0}")]
    Server(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}
