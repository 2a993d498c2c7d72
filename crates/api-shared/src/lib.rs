//! # API Shared
//!
//! Wire types shared by the REST server and its clients.
//!
//! Contains:
//! - Request/response bodies for the generation API
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` to serve these shapes and by `testgen-client` to read them.

pub mod health;

pub use health::HealthService;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Successful response from `POST /api/generate-test-cases`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTestCasesRes {
    /// Generated test cases, exactly as the generator produced them
    #[schema(example = "TC1: Verify login with valid credentials\nTC2: ...")]
    pub test_cases: String,
    /// Download URL of the generated document, e.g. `/generated/req-cases.docx`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "/generated/req-cases.docx")]
    pub word_file_path: Option<String>,
}

/// Error body returned with every non-2xx JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    #[schema(example = "No file uploaded")]
    pub error: String,
}

impl ErrorRes {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}
