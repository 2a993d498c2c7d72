use super::*;
use crate::error::{
    GENERATION_FAILED, GENERATION_OUTPUT_INVALID, GENERATOR_START_FAILED, NO_FILE_UPLOADED,
    UNSUPPORTED_FILE_TYPE,
};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use testgen_core::constants::DOCX_MIME_TYPE;
use testgen_core::{CoreConfig, GenerationError, GenerationOutput, Generator, GeneratorConfig};
use tower::ServiceExt;

const BOUNDARY: &str = "testgen-test-boundary";

type Respond =
    Box<dyn Fn(&Path) -> Result<GenerationOutput, GenerationError> + Send + Sync + 'static>;

struct FakeGenerator {
    calls: AtomicUsize,
    respond: Respond,
}

impl FakeGenerator {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(&self, document: &Path) -> Result<GenerationOutput, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)(document)
    }
}

struct Harness {
    temp: TempDir,
    app: Router,
    generator: Arc<FakeGenerator>,
}

impl Harness {
    async fn new(respond: Respond) -> Self {
        Self::with_limit(respond, 1024 * 1024).await
    }

    async fn with_limit(respond: Respond, max_upload_bytes: usize) -> Self {
        let temp = TempDir::new().unwrap();
        let generator = Arc::new(FakeGenerator {
            calls: AtomicUsize::new(0),
            respond,
        });
        let cfg = core_config(&temp, "unused", vec![]);
        let service = GenerationService::with_generator(cfg, generator.clone())
            .await
            .unwrap();
        let app = router(AppState::new(service), max_upload_bytes);

        Self {
            temp,
            app,
            generator,
        }
    }

    fn uploads(&self) -> usize {
        fs::read_dir(self.temp.path().join("uploads"))
            .unwrap()
            .count()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        send(&self.app, request).await
    }
}

fn core_config(temp: &TempDir, program: &str, args: Vec<String>) -> Arc<CoreConfig> {
    Arc::new(
        CoreConfig::new(
            temp.path().join("uploads"),
            temp.path().join("generated"),
            GeneratorConfig::new(program, args).unwrap(),
            2,
        )
        .unwrap(),
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

struct Part<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    content_type: Option<&'a str>,
    bytes: &'a [u8],
}

fn docx_part<'a>(filename: &'a str, bytes: &'a [u8]) -> Part<'a> {
    Part {
        name: "file",
        filename: Some(filename),
        content_type: Some(DOCX_MIME_TYPE),
        bytes,
    }
}

fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(filename) = part.filename {
            disposition.push_str(&format!("; filename=\"{filename}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/generate-test-cases")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn echo_content() -> Respond {
    Box::new(|path: &Path| {
        Ok(GenerationOutput {
            test_cases: String::from_utf8_lossy(&fs::read(path).unwrap()).into_owned(),
            word_file_path: None,
        })
    })
}

fn fixed(test_cases: &'static str) -> Respond {
    Box::new(move |_: &Path| {
        Ok(GenerationOutput {
            test_cases: test_cases.to_string(),
            word_file_path: None,
        })
    })
}

fn failing(make: fn() -> GenerationError) -> Respond {
    Box::new(move |_: &Path| Err(make()))
}

fn spawn_failure() -> GenerationError {
    GenerationError::Spawn {
        program: "python3".into(),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    }
}

fn exit_failure() -> GenerationError {
    GenerationError::NonZeroExit {
        code: Some(1),
        stderr: "{\"error\": \"boom\"}".into(),
    }
}

fn malformed_output() -> GenerationError {
    match testgen_core::generator::parse_output(b"done!") {
        Err(err) => err,
        Ok(output) => panic!("unexpectedly parsed {output:?}"),
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let harness = Harness::new(fixed("TC1")).await;

    let (status, body) = harness.send(get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["ok"], json!(true));
}

#[tokio::test]
async fn index_serves_client_page() {
    let harness = Harness::new(fixed("TC1")).await;

    let (status, body) = harness.send(get("/")).await;
    let page = String::from_utf8(body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Generate Test Cases"));
    assert!(page.contains("/api/generate-test-cases"));
}

#[tokio::test]
async fn openapi_document_lists_generation_endpoint() {
    let harness = Harness::new(fixed("TC1")).await;

    let (status, body) = harness.send(get("/api-docs/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    let doc = json_body(&body);
    assert!(doc["paths"]["/api/generate-test-cases"]["post"].is_object());
    assert!(doc["paths"]["/api/cleanup"]["delete"].is_object());
}

#[tokio::test]
async fn returns_test_cases_verbatim() {
    let test_cases = "  TC1: Verify login\n\n\tTC2: Verify logout \u{e9}  \n";
    let harness = Harness::new(fixed(test_cases)).await;

    let (status, body) = harness
        .send(multipart_request(&[docx_part("req.docx", b"PK\x03\x04")]))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({ "testCases": test_cases }));
    assert_eq!(harness.generator.calls(), 1);
    assert_eq!(harness.uploads(), 1);
}

#[tokio::test]
async fn missing_file_is_rejected() {
    let harness = Harness::new(fixed("TC1")).await;

    let (status, body) = harness
        .send(multipart_request(&[Part {
            name: "note",
            filename: None,
            content_type: None,
            bytes: b"hello",
        }]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body), json!({ "error": NO_FILE_UPLOADED }));
    assert_eq!(harness.generator.calls(), 0);
    assert_eq!(harness.uploads(), 0);
}

#[tokio::test]
async fn file_part_without_filename_counts_as_missing() {
    let harness = Harness::new(fixed("TC1")).await;

    let (status, body) = harness
        .send(multipart_request(&[Part {
            name: "file",
            filename: None,
            content_type: Some(DOCX_MIME_TYPE),
            bytes: b"PK",
        }]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"], NO_FILE_UPLOADED);
    assert_eq!(harness.generator.calls(), 0);
}

#[tokio::test]
async fn non_multipart_request_counts_as_missing_file() {
    let harness = Harness::new(fixed("TC1")).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/generate-test-cases")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = harness.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["error"], NO_FILE_UPLOADED);
}

#[tokio::test]
async fn other_fields_are_ignored() {
    let harness = Harness::new(echo_content()).await;

    let (status, body) = harness
        .send(multipart_request(&[
            Part {
                name: "comment",
                filename: None,
                content_type: None,
                bytes: b"ignored",
            },
            docx_part("req.docx", b"the document"),
        ]))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["testCases"], "the document");
}

#[tokio::test]
async fn wrong_media_type_is_rejected_before_storage() {
    let harness = Harness::new(fixed("TC1")).await;

    let (status, body) = harness
        .send(multipart_request(&[Part {
            name: "file",
            filename: Some("req.pdf"),
            content_type: Some("application/pdf"),
            bytes: b"%PDF-1.7",
        }]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body), json!({ "error": UNSUPPORTED_FILE_TYPE }));
    assert_eq!(harness.generator.calls(), 0);
    assert_eq!(harness.uploads(), 0);
}

#[tokio::test]
async fn generator_failures_map_to_distinct_messages() {
    let cases: Vec<(Respond, &str)> = vec![
        (failing(spawn_failure), GENERATOR_START_FAILED),
        (failing(exit_failure), GENERATION_FAILED),
        (failing(malformed_output), GENERATION_OUTPUT_INVALID),
    ];

    for (respond, expected) in cases {
        let harness = Harness::new(respond).await;

        let (status, body) = harness
            .send(multipart_request(&[docx_part("req.docx", b"PK")]))
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(&body), json!({ "error": expected }));
        assert_eq!(harness.generator.calls(), 1);
    }
}

#[tokio::test]
async fn generated_document_is_published_and_downloadable() {
    let out = TempDir::new().unwrap();
    let artifact = out.path().join("req-cases.docx");
    let artifact_bytes = b"PK\x03\x04 generated test cases".to_vec();
    fs::write(&artifact, &artifact_bytes).unwrap();

    let reported = artifact.clone();
    let harness = Harness::new(Box::new(move |_: &Path| {
        Ok(GenerationOutput {
            test_cases: "TC1: ...".into(),
            word_file_path: Some(reported.clone()),
        })
    }))
    .await;

    let (status, body) = harness
        .send(multipart_request(&[docx_part("req.docx", b"PK")]))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_body(&body),
        json!({ "testCases": "TC1: ...", "wordFilePath": "/generated/req-cases.docx" })
    );

    let (status, downloaded) = harness.send(get("/generated/req-cases.docx")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(downloaded, artifact_bytes);
}

#[tokio::test]
async fn earlier_download_survives_a_later_request() {
    let out = TempDir::new().unwrap();
    let artifact = out.path().join("Generated_Test_Cases.docx");

    let reported = artifact.clone();
    let harness = Harness::new(Box::new(move |document: &Path| {
        fs::write(&reported, fs::read(document).unwrap()).unwrap();
        Ok(GenerationOutput {
            test_cases: "TC1".into(),
            word_file_path: Some(reported.clone()),
        })
    }))
    .await;

    let mut urls = Vec::new();
    for content in [&b"document A"[..], &b"document B"[..]] {
        let (status, body) = harness
            .send(multipart_request(&[docx_part("req.docx", content)]))
            .await;
        assert_eq!(status, StatusCode::OK);
        urls.push(json_body(&body)["wordFilePath"].as_str().unwrap().to_string());
    }

    assert_eq!(urls[0], "/generated/Generated_Test_Cases.docx");
    assert_ne!(urls[0], urls[1]);
    let (_, a) = harness.send(get(&urls[0])).await;
    let (_, b) = harness.send(get(&urls[1])).await;
    assert_eq!(a, b"document A");
    assert_eq!(b, b"document B");
}

#[tokio::test]
async fn missing_generated_document_is_a_server_error() {
    let harness = Harness::new(Box::new(|_: &Path| {
        Ok(GenerationOutput {
            test_cases: "TC1".into(),
            word_file_path: Some(PathBuf::from("/nonexistent/req-cases.docx")),
        })
    }))
    .await;

    let (status, body) = harness
        .send(multipart_request(&[docx_part("req.docx", b"PK")]))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json_body(&body)["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn unknown_download_is_not_found() {
    let harness = Harness::new(fixed("TC1")).await;

    let (status, _) = harness.send(get("/generated/nothing-here.docx")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cleanup_always_succeeds() {
    let harness = Harness::new(fixed("TC1")).await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/cleanup")
        .body(Body::empty())
        .unwrap();
    let (status, body) = harness.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Cleanup completed");
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let harness = Harness::with_limit(fixed("TC1"), 256).await;
    let big = vec![b'x'; 4096];

    let (status, _) = harness
        .send(multipart_request(&[docx_part("req.docx", &big)]))
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(harness.generator.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_get_their_own_results() {
    let harness = Harness::new(echo_content()).await;

    let ((status_a, body_a), (status_b, body_b)) = tokio::join!(
        harness.send(multipart_request(&[docx_part("req.docx", b"first")])),
        harness.send(multipart_request(&[docx_part("req.docx", b"second")])),
    );

    assert_eq!(status_a, StatusCode::OK);
    assert_eq!(status_b, StatusCode::OK);
    assert_eq!(json_body(&body_a)["testCases"], "first");
    assert_eq!(json_body(&body_b)["testCases"], "second");
    assert_eq!(harness.uploads(), 2);
}

#[cfg(unix)]
#[tokio::test]
async fn end_to_end_with_generator_process() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    fs::create_dir_all(&out).unwrap();
    let script = temp.path().join("generator.sh");
    fs::write(
        &script,
        format!(
            "cp \"$1\" \"{out}/req-cases.docx\"\n\
             printf '{{\"testCases\":\"TC1: ...\",\"wordFilePath\":\"%s\"}}' \"{out}/req-cases.docx\"\n",
            out = out.display()
        ),
    )
    .unwrap();

    let cfg = core_config(&temp, "sh", vec![script.to_string_lossy().into_owned()]);
    let service = GenerationService::new(cfg).await.unwrap();
    let app = router(AppState::new(service), 1024 * 1024);
    let document = b"PK\x03\x04 requirements".to_vec();

    let (status, body) = send(&app, multipart_request(&[docx_part("req.docx", &document)])).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_body(&body),
        json!({ "testCases": "TC1: ...", "wordFilePath": "/generated/req-cases.docx" })
    );

    let (status, downloaded) = send(&app, get("/generated/req-cases.docx")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(downloaded, document);
}

#[cfg(unix)]
#[tokio::test]
async fn end_to_end_non_zero_exit_with_partial_output() {
    let temp = TempDir::new().unwrap();
    let script = temp.path().join("generator.sh");
    fs::write(
        &script,
        "echo '{\"testCases\":\"partial\"}'\necho 'Traceback' >&2\nexit 1\n",
    )
    .unwrap();

    let cfg = core_config(&temp, "sh", vec![script.to_string_lossy().into_owned()]);
    let service = GenerationService::new(cfg).await.unwrap();
    let app = router(AppState::new(service), 1024 * 1024);

    let (status, body) = send(&app, multipart_request(&[docx_part("req.docx", b"PK")])).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body), json!({ "error": GENERATION_FAILED }));
}
