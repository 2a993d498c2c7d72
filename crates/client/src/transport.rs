//! Talking to the generation server.

use crate::state::{GenerationResult, SelectedFile};
use crate::ClientError;
use api_shared::{ErrorRes, GenerateTestCasesRes};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use testgen_core::constants::{DOCX_MIME_TYPE, FILE_FIELD_NAME};

/// Fallback message when a failed response carries no usable `error` field.
pub const GENERIC_FAILURE: &str = "Failed to generate test cases";

const GENERATE_PATH: &str = "/api/generate-test-cases";

#[async_trait]
pub trait Transport: Send + Sync {
    /// Uploads one document and waits for its test cases.
    async fn generate(&self, file: &SelectedFile) -> Result<GenerationResult, ClientError>;
}

/// [`Transport`] over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a server-relative URL such as `/generated/req-cases.docx`.
    pub fn resolve(&self, url: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(url)
            .map_err(|e| ClientError::InvalidUrl(format!("{url}: {e}")))
    }

    /// Downloads a generated document.
    ///
    /// # Errors
    ///
    /// - `ClientError::Network` if the request fails,
    /// - `ClientError::Server` on a non-success status.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let target = self.resolve(url)?;
        tracing::debug!(%target, "downloading generated document");

        let response = self.client.get(target).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Server(format!("Download failed ({status})")));
        }

        let bytes = response.bytes().await.map_err(network)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn generate(&self, file: &SelectedFile) -> Result<GenerationResult, ClientError> {
        let target = self.resolve(GENERATE_PATH)?;

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(DOCX_MIME_TYPE)
            .map_err(network)?;
        let form = Form::new().part(FILE_FIELD_NAME, part);

        tracing::debug!(%target, file = %file.name, size_bytes = file.bytes.len(), "uploading document");

        let response = self
            .client
            .post(target)
            .multipart(form)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorRes>()
                .await
                .ok()
                .map(|body| body.error)
                .filter(|error| !error.is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            tracing::warn!(%status, %message, "generation failed");
            return Err(ClientError::Server(message));
        }

        let body: GenerateTestCasesRes = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        Ok(GenerationResult {
            test_cases: body.test_cases,
            download_url: body.word_file_path,
        })
    }
}

fn network(err: reqwest::Error) -> ClientError {
    ClientError::Network(err.to_string())
}
