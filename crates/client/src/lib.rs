//! # Testgen Client
//!
//! Presentation client for the test case generator.
//!
//! [`UploadForm`] holds the form state (selected file, busy flag, error, result) and
//! [`Transport`] sends the document. [`submit`] drives one generation through both, so the
//! form can never be left busy after a failure.

mod error;
pub mod state;
pub mod transport;

pub use error::ClientError;
pub use state::{ClientState, GenerationResult, SelectedFile, UploadForm};
pub use transport::{HttpTransport, Transport};

/// Runs one generation for the selected file.
///
/// # Errors
///
/// Returns the same `ClientError` the form now displays: no file selected, already busy, or
/// the transport failure.
pub async fn submit<T>(form: &mut UploadForm, transport: &T) -> Result<(), ClientError>
where
    T: Transport + ?Sized,
{
    let file = form.begin_generation()?;
    let outcome = transport.generate(&file).await;
    let failure = outcome.as_ref().err().cloned();
    form.finish_generation(outcome);

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
