//! Upload form state machine.
//!
//! ```text
//! Idle --select--> FileSelected --begin--> Generating --ok--> ResultReady
//!                       ^                      |
//!                       +-------- error -------+
//! ```
//!
//! The error message is orthogonal to the state: it is set by a rejected action or a failed
//! generation and cleared by the next successful selection or a new generation.

use crate::ClientError;
use testgen_core::validation::has_docx_extension;

pub const LABEL_IDLE: &str = "Generate Test Cases";
pub const LABEL_BUSY: &str = "Generating...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Idle,
    FileSelected,
    Generating,
    ResultReady,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    /// Shown verbatim
    pub test_cases: String,
    /// Relative download URL, when the server produced a document
    pub download_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploadForm {
    state: ClientState,
    file: Option<SelectedFile>,
    error: Option<String>,
    result: Option<GenerationResult>,
}

impl Default for UploadForm {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadForm {
    pub fn new() -> Self {
        Self {
            state: ClientState::Idle,
            file: None,
            error: None,
            result: None,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.state == ClientState::Generating
    }

    /// Selects a document.
    ///
    /// Only names ending in `.docx` are accepted. A valid selection clears any error and any
    /// previous result.
    ///
    /// # Errors
    ///
    /// - `ClientError::InvalidFile` if the name does not end in `.docx`; the state is unchanged.
    /// - `ClientError::Busy` while a generation is in flight.
    pub fn select_file(
        &mut self,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<(), ClientError> {
        if self.is_busy() {
            return Err(ClientError::Busy);
        }

        let name = name.into();
        if !has_docx_extension(&name) {
            return Err(self.reject(ClientError::InvalidFile));
        }

        self.file = Some(SelectedFile { name, bytes });
        self.error = None;
        self.result = None;
        self.state = ClientState::FileSelected;
        Ok(())
    }

    /// Moves to `Generating` and returns the file to send.
    ///
    /// # Errors
    ///
    /// - `ClientError::NoFileSelected` if nothing is selected; no request should be made.
    /// - `ClientError::Busy` if a generation is already in flight.
    pub fn begin_generation(&mut self) -> Result<SelectedFile, ClientError> {
        if self.is_busy() {
            return Err(ClientError::Busy);
        }

        let Some(file) = self.file.clone() else {
            return Err(self.reject(ClientError::NoFileSelected));
        };

        self.error = None;
        self.result = None;
        self.state = ClientState::Generating;
        Ok(file)
    }

    /// Records the outcome of the request started by [`Self::begin_generation`].
    ///
    /// Failure always leaves the form in `FileSelected` so the user can retry.
    pub fn finish_generation(&mut self, outcome: Result<GenerationResult, ClientError>) {
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.error = None;
                self.state = ClientState::ResultReady;
            }
            Err(err) => {
                self.error = Some(err.to_string());
                self.state = if self.file.is_some() {
                    ClientState::FileSelected
                } else {
                    ClientState::Idle
                };
            }
        }
    }

    pub fn trigger_label(&self) -> &'static str {
        if self.is_busy() {
            LABEL_BUSY
        } else {
            LABEL_IDLE
        }
    }

    pub fn trigger_enabled(&self) -> bool {
        !self.is_busy()
    }

    /// Plain-text rendering of the form, as the command line shows it.
    pub fn render(&self) -> String {
        let mut out = String::new();

        if let Some(file) = &self.file {
            out.push_str(&format!("Selected: {}\n", file.name));
        }

        if self.trigger_enabled() {
            out.push_str(&format!("[{}]\n", self.trigger_label()));
        } else {
            out.push_str(&format!("[{}] (disabled)\n", self.trigger_label()));
        }

        if let Some(error) = &self.error {
            out.push_str(&format!("Error: {error}\n"));
        }

        if let Some(result) = &self.result {
            out.push_str("Generated Test Cases:\n");
            out.push_str(&result.test_cases);
            if !result.test_cases.ends_with('\n') {
                out.push('\n');
            }
            if let Some(url) = &result.download_url {
                out.push_str(&format!("Download: {url}\n"));
            }
        }

        out
    }

    fn reject(&mut self, err: ClientError) -> ClientError {
        self.error = Some(err.to_string());
        err
    }
}
