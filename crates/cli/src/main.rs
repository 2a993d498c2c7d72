use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use testgen_client::{HttpTransport, UploadForm};
use testgen_core::config::{max_upload_bytes_from_env_value, port_from_env_value};
use testgen_core::constants::{DOCX_MIME_TYPE, ENV_MAX_UPLOAD_BYTES, ENV_PORT};
use testgen_core::{CoreConfig, GenerationService, Upload};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "testgen")]
#[command(about = "Generate test cases from a requirements document")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a document to a running server and print the generated test cases
    Generate {
        /// Requirements document (.docx)
        file: PathBuf,
        /// Server base URL
        #[arg(long, default_value = "http://localhost:5000")]
        server: String,
        /// Save the generated Word document here
        #[arg(long)]
        download: Option<PathBuf>,
    },
    /// Run the generator locally, without a server, and print the result as JSON
    Run {
        /// Requirements document (.docx)
        file: PathBuf,
    },
    /// Print the configuration resolved from the environment
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            file,
            server,
            download,
        } => generate(&file, &server, download.as_deref()).await,
        Commands::Run { file } => run(&file).await,
        Commands::Config => print_config(),
    }
}

async fn generate(file: &Path, server: &str, download: Option<&Path>) -> anyhow::Result<()> {
    let transport = HttpTransport::new(server)?;
    let mut form = UploadForm::new();

    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    form.select_file(file_name(file), bytes)?;

    eprintln!("{}...", form.trigger_label());
    testgen_client::submit(&mut form, &transport).await?;

    let Some(result) = form.result() else {
        anyhow::bail!("server returned no result");
    };

    print!("{}", result.test_cases);
    if !result.test_cases.ends_with('\n') {
        println!();
    }

    if let Some(url) = &result.download_url {
        let resolved = transport.resolve(url)?;
        eprintln!("Download: {resolved}");

        if let Some(target) = download {
            let document = transport.download(url).await?;
            tokio::fs::write(target, &document)
                .await
                .with_context(|| format!("failed to write {}", target.display()))?;
            eprintln!("Saved {} bytes to {}", document.len(), target.display());
        }
    } else if download.is_some() {
        eprintln!("No Word document was generated; nothing to download");
    }

    Ok(())
}

async fn run(file: &Path) -> anyhow::Result<()> {
    let name = file_name(file);
    if !testgen_core::validation::has_docx_extension(&name) {
        anyhow::bail!("Please select a valid .docx file");
    }

    let cfg = Arc::new(CoreConfig::from_env()?);
    let service = GenerationService::new(cfg).await?;

    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let report = service
        .generate(Upload {
            file_name: name,
            media_type: Some(DOCX_MIME_TYPE.to_string()),
            bytes,
        })
        .await?;

    let mut out = serde_json::json!({ "testCases": report.test_cases });
    if let Some(artifact) = report.artifact {
        out["wordFilePath"] = serde_json::Value::String(artifact.path.display().to_string());
    }
    println!("{}", serde_json::to_string_pretty(&out)?);

    Ok(())
}

fn print_config() -> anyhow::Result<()> {
    let cfg = CoreConfig::from_env()?;
    let port = port_from_env_value(std::env::var(ENV_PORT).ok())?;
    let max_upload_bytes =
        max_upload_bytes_from_env_value(std::env::var(ENV_MAX_UPLOAD_BYTES).ok())?;
    let generator = cfg.generator();

    println!("port: {port}");
    println!("max upload bytes: {max_upload_bytes}");
    println!("uploads dir: {}", cfg.uploads_dir().display());
    println!("generated dir: {}", cfg.generated_dir().display());
    println!("generator program: {}", generator.program());
    println!("generator args: {}", generator.args().join(" "));
    println!(
        "generator working dir: {}",
        generator
            .working_dir()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "(current directory)".into())
    );
    println!(
        "generation timeout: {}",
        generator
            .timeout()
            .map(|t| format!("{}s", t.as_secs()))
            .unwrap_or_else(|| "none".into())
    );
    println!(
        "max concurrent generations: {}",
        cfg.max_concurrent_generations()
    );

    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
