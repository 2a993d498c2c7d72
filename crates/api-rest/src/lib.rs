//! # API REST
//!
//! REST API for the test case generator.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (multipart parsing, JSON errors, CORS, static downloads)
//!
//! Uses `api-shared` for wire types and `testgen-core` for everything else.

#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;

pub use config::ServerConfig;
pub use error::ApiError;

use api_shared::{ErrorRes, GenerateTestCasesRes, HealthRes, HealthService};
use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use testgen_core::constants::{FILE_FIELD_NAME, GENERATED_ROUTE_PREFIX};
use testgen_core::{CoreError, GenerationService, Upload};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Application state for the REST API server
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GenerationService>,
}

impl AppState {
    pub fn new(service: GenerationService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, generate_test_cases, cleanup),
    components(schemas(GenerateTestCasesRes, ErrorRes, HealthRes))
)]
pub struct ApiDoc;

/// Builds the full application router.
///
/// `max_upload_bytes` caps request bodies; larger uploads are answered with `413`.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let generated = ServeDir::new(state.service.generated_dir());

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/generate-test-cases", post(generate_test_cases))
        .route("/api/cleanup", delete(cleanup))
        .nest_service(GENERATED_ROUTE_PREFIX, generated)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Browser page for uploading a document and viewing the result
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/api/generate-test-cases",
    request_body(content_type = "multipart/form-data", description = "A `.docx` document in the `file` field"),
    responses(
        (status = 200, description = "Test cases generated", body = GenerateTestCasesRes),
        (status = 400, description = "No file, or not a .docx document", body = ErrorRes),
        (status = 413, description = "Upload too large"),
        (status = 500, description = "The generator failed", body = ErrorRes)
    )
)]
/// Generate test cases from an uploaded requirements document
///
/// Stores the upload, runs the generator once on it, and returns the generated test cases
/// verbatim. When the generator also produced a document, `wordFilePath` is the URL it can be
/// downloaded from.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - no `file` part with a filename was sent,
/// - the part's content type is not the `.docx` media type.
///
/// Returns `500 Internal Server Error` if the generator cannot be started, exits non-zero,
/// prints unparseable output, or its document cannot be published.
#[axum::debug_handler]
async fn generate_test_cases(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateTestCasesRes>, ApiError> {
    let mut multipart = multipart?;
    let upload = read_upload(&mut multipart)
        .await?
        .ok_or(CoreError::MissingFile)?;

    let report = state.service.generate(upload).await?;

    Ok(Json(GenerateTestCasesRes {
        test_cases: report.test_cases,
        word_file_path: report.artifact.map(|artifact| artifact.url),
    }))
}

/// Takes the first `file` part that carries a filename. Other parts are skipped.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<Upload>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD_NAME) {
            continue;
        }
        let Some(file_name) = field.file_name().filter(|n| !n.is_empty()).map(str::to_string)
        else {
            continue;
        };
        let media_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        return Ok(Some(Upload {
            file_name,
            media_type,
            bytes: bytes.to_vec(),
        }));
    }

    Ok(None)
}

#[utoipa::path(
    delete,
    path = "/api/cleanup",
    responses(
        (status = 200, description = "Cleanup acknowledged", body = String)
    )
)]
/// Acknowledge a cleanup request
///
/// Always succeeds. Uploaded and generated files are kept.
#[axum::debug_handler]
async fn cleanup(State(state): State<AppState>) -> (StatusCode, &'static str) {
    state.service.cleanup();
    (StatusCode::OK, "Cleanup completed")
}

#[cfg(test)]
mod tests;
