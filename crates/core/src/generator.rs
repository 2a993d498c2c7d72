//! The external generator boundary.
//!
//! Test cases are produced by an external process. This module turns one run of that process
//! into `generate(path) -> Result<GenerationOutput, GenerationError>`:
//!
//! - the stored document path is the last positional argument
//! - exit status 0 plus a JSON object on stdout is success
//! - any non-zero exit is a failure, whatever was printed before it
//! - stderr is diagnostics only: logged, never returned to callers
//!
//! The [`Generator`] trait is the seam the service depends on; [`ProcessGenerator`] is the
//! production implementation.

use crate::config::GeneratorConfig;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// What a successful generator run reported on stdout.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct GenerationOutput {
    /// Generated test cases, carried through byte-for-byte.
    #[serde(rename = "testCases")]
    pub test_cases: String,

    /// Document written by the generator, as the generator named it.
    #[serde(rename = "wordFilePath", default)]
    pub word_file_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("failed to start generator `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to collect generator output: {0}")]
    Wait(#[source] std::io::Error),
    #[error("generator exited unsuccessfully ({})", exit_description(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },
    #[error("generator output is not valid JSON ({stdout_len} bytes): {source}")]
    MalformedOutput {
        #[source]
        source: serde_json::Error,
        stdout_len: usize,
    },
    #[error("generator did not finish within {}s", .after.as_secs())]
    TimedOut { after: Duration },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Produces test cases for a stored document.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, document: &Path) -> Result<GenerationOutput, GenerationError>;
}

/// Runs the configured program once per document.
#[derive(Debug, Clone)]
pub struct ProcessGenerator {
    config: GeneratorConfig,
}

impl ProcessGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    fn command(&self, document: &Path) -> Command {
        let mut command = Command::new(self.config.program());
        command
            .args(self.config.args())
            .arg(document)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A dropped request (timeout or client disconnect) takes its generator with it
            .kill_on_drop(true);
        if let Some(dir) = self.config.working_dir() {
            command.current_dir(dir);
        }
        command
    }
}

#[async_trait]
impl Generator for ProcessGenerator {
    async fn generate(&self, document: &Path) -> Result<GenerationOutput, GenerationError> {
        let started = Instant::now();

        let child = self
            .command(document)
            .spawn()
            .map_err(|source| GenerationError::Spawn {
                program: self.config.program().to_string(),
                source,
            })?;

        tracing::debug!(
            program = self.config.program(),
            document = %document.display(),
            pid = ?child.id(),
            "generator started"
        );

        // Dropping the future on timeout drops the child, which kills it.
        let output = match self.config.timeout() {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| GenerationError::TimedOut { after: limit })?,
            None => child.wait_with_output().await,
        }
        .map_err(GenerationError::Wait)?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if !output.status.success() {
            tracing::warn!(
                code = ?output.status.code(),
                elapsed_ms,
                stdout_len = output.stdout.len(),
                stderr = %stderr.trim_end(),
                "generator failed"
            );
            return Err(GenerationError::NonZeroExit {
                code: output.status.code(),
                stderr,
            });
        }

        if !stderr.trim().is_empty() {
            tracing::debug!(stderr = %stderr.trim_end(), "generator diagnostics");
        }

        let parsed = parse_output(&output.stdout).inspect_err(|e| {
            tracing::warn!(error = %e, elapsed_ms, "generator produced malformed output");
        })?;

        tracing::info!(
            elapsed_ms,
            test_cases_len = parsed.test_cases.len(),
            word_file_path = ?parsed.word_file_path,
            "generator finished"
        );

        Ok(parsed)
    }
}

/// Parses generator stdout.
///
/// The whole output is tried first. Generators that print progress to stdout before the
/// result are tolerated by falling back to the last non-empty line. Bytes are parsed as they
/// are, so invalid UTF-8 inside the JSON is rejected rather than replaced.
///
/// # Errors
///
/// Returns `GenerationError::MalformedOutput` if neither is a JSON object with a string
/// `testCases` field.
pub fn parse_output(stdout: &[u8]) -> Result<GenerationOutput, GenerationError> {
    let trimmed = stdout.trim_ascii();

    match serde_json::from_slice::<GenerationOutput>(trimmed) {
        Ok(parsed) => Ok(parsed),
        Err(whole_err) => trimmed
            .split(|&byte| byte == b'\n')
            .map(|line| line.trim_ascii())
            .rev()
            .find(|line| !line.is_empty())
            .and_then(|last| serde_json::from_slice::<GenerationOutput>(last).ok())
            .ok_or_else(|| GenerationError::MalformedOutput {
                source: whole_err,
                stdout_len: stdout.len(),
            }),
    }
}
