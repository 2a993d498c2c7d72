use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, ServerConfig};
use testgen_core::{CoreConfig, GenerationService};

/// Main entry point for the test case generator server
///
/// Serves the upload page, the generation API, generated documents and the OpenAPI docs on a
/// single port.
///
/// # Environment Variables
/// - `PORT`: listening port (default: 5000)
/// - `TESTGEN_UPLOADS_DIR`: where uploaded documents are stored (default: "uploads")
/// - `TESTGEN_GENERATED_DIR`: where generated documents are served from (default: "generated")
/// - `TESTGEN_GENERATOR_PROGRAM` / `TESTGEN_GENERATOR_ARGS`: the generator command
///   (default: "python3 testcase_generator.py")
/// - `TESTGEN_GENERATOR_WORKDIR`: generator working directory
/// - `TESTGEN_MAX_CONCURRENT_GENERATIONS`: generator processes allowed at once (default: 4)
/// - `TESTGEN_GENERATION_TIMEOUT_SECS`: optional generator timeout
/// - `TESTGEN_MAX_UPLOAD_BYTES`: request body limit (default: 20 MiB)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - any configuration value is invalid,
/// - the uploads or generated directory cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("testgen_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("testgen_core=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Arc::new(CoreConfig::from_env()?);
    let server = ServerConfig::from_env()?;

    let service = GenerationService::new(cfg.clone()).await?;
    tracing::info!(
        uploads = %service.uploads_dir().display(),
        generated = %service.generated_dir().display(),
        program = cfg.generator().program(),
        max_concurrent = cfg.max_concurrent_generations(),
        "generation service ready"
    );

    let app = api_rest::router(AppState::new(service), server.max_upload_bytes());

    let addr = server.bind_addr();
    tracing::info!("++ Starting test case generator on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
