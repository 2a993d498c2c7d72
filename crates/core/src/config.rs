//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Request handling never reads process-wide environment variables;
//! the binaries call [`CoreConfig::from_env`] once and share the result behind an `Arc`.
//!
//! The `*_from_env_value` helpers take the raw `Option<String>` so they can be tested without
//! mutating the process environment.

use crate::constants::{
    DEFAULT_GENERATED_DIR, DEFAULT_GENERATOR_ARGS, DEFAULT_GENERATOR_PROGRAM,
    DEFAULT_MAX_CONCURRENT_GENERATIONS, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT,
    DEFAULT_UPLOADS_DIR, ENV_GENERATED_DIR, ENV_GENERATION_TIMEOUT_SECS, ENV_GENERATOR_ARGS,
    ENV_GENERATOR_PROGRAM, ENV_GENERATOR_WORKDIR, ENV_MAX_CONCURRENT_GENERATIONS,
    ENV_MAX_UPLOAD_BYTES, ENV_UPLOADS_DIR, MAX_GENERATION_TIMEOUT,
};
use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How to launch the external generator process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl GeneratorConfig {
    /// Create a new `GeneratorConfig`.
    ///
    /// `args` are passed before the document path, so `python3` with
    /// `["testcase_generator.py"]` runs `python3 testcase_generator.py <path>`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> CoreResult<Self> {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(CoreError::InvalidConfig(
                "generator program cannot be empty".into(),
            ));
        }

        Ok(Self {
            program,
            args,
            working_dir: None,
            timeout: None,
        })
    }

    /// Run the generator from `dir`. Relative document paths it reports are resolved here too.
    #[must_use]
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// Kill the generator if it runs longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    uploads_dir: PathBuf,
    generated_dir: PathBuf,
    generator: GeneratorConfig,
    max_concurrent_generations: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidConfig` if:
    /// - `max_concurrent_generations` is zero,
    /// - the uploads and generated directories are the same path (uploads would become
    ///   publicly downloadable). Overlap through `.`, `..` or symlinks, and nesting, are
    ///   caught once the directories exist, by [`crate::GenerationService::with_generator`].
    pub fn new(
        uploads_dir: PathBuf,
        generated_dir: PathBuf,
        generator: GeneratorConfig,
        max_concurrent_generations: usize,
    ) -> CoreResult<Self> {
        if max_concurrent_generations == 0 {
            return Err(CoreError::InvalidConfig(
                "max_concurrent_generations must be at least 1".into(),
            ));
        }

        if uploads_dir == generated_dir {
            return Err(CoreError::InvalidConfig(format!(
                "uploads and generated directories must differ (both are {})",
                uploads_dir.display()
            )));
        }

        Ok(Self {
            uploads_dir,
            generated_dir,
            generator,
            max_concurrent_generations,
        })
    }

    /// Resolve the configuration from the process environment.
    ///
    /// Call this once at startup; see the module docs.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let uploads_dir = non_empty(lookup(ENV_UPLOADS_DIR))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOADS_DIR));
        let generated_dir = non_empty(lookup(ENV_GENERATED_DIR))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GENERATED_DIR));

        let program = non_empty(lookup(ENV_GENERATOR_PROGRAM))
            .unwrap_or_else(|| DEFAULT_GENERATOR_PROGRAM.into());
        let args = generator_args_from_env_value(lookup(ENV_GENERATOR_ARGS));

        let mut generator = GeneratorConfig::new(program, args)?;
        if let Some(dir) = non_empty(lookup(ENV_GENERATOR_WORKDIR)) {
            generator = generator.with_working_dir(PathBuf::from(dir));
        }
        if let Some(timeout) = timeout_from_env_value(lookup(ENV_GENERATION_TIMEOUT_SECS))? {
            generator = generator.with_timeout(timeout);
        }

        let max_concurrent_generations = positive_usize_from_env_value(
            ENV_MAX_CONCURRENT_GENERATIONS,
            lookup(ENV_MAX_CONCURRENT_GENERATIONS),
            DEFAULT_MAX_CONCURRENT_GENERATIONS,
        )?;

        Self::new(
            uploads_dir,
            generated_dir,
            generator,
            max_concurrent_generations,
        )
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn generated_dir(&self) -> &Path {
        &self.generated_dir
    }

    pub fn generator(&self) -> &GeneratorConfig {
        &self.generator
    }

    pub fn max_concurrent_generations(&self) -> usize {
        self.max_concurrent_generations
    }
}

/// Parse the listening port, defaulting to [`DEFAULT_PORT`] when unset or blank.
pub fn port_from_env_value(value: Option<String>) -> CoreResult<u16> {
    match non_empty(value) {
        None => Ok(DEFAULT_PORT),
        Some(raw) => raw
            .trim()
            .parse::<u16>()
            .map_err(|_| CoreError::InvalidConfig(format!("invalid port: {raw}"))),
    }
}

/// Parse the upload body limit, defaulting to [`DEFAULT_MAX_UPLOAD_BYTES`].
pub fn max_upload_bytes_from_env_value(value: Option<String>) -> CoreResult<usize> {
    positive_usize_from_env_value(ENV_MAX_UPLOAD_BYTES, value, DEFAULT_MAX_UPLOAD_BYTES)
}

/// Parse an optional timeout in whole seconds. Unset or blank means no timeout.
pub fn timeout_from_env_value(value: Option<String>) -> CoreResult<Option<Duration>> {
    let Some(raw) = non_empty(value) else {
        return Ok(None);
    };

    let secs = raw.trim().parse::<u64>().map_err(|_| {
        CoreError::InvalidConfig(format!(
            "{ENV_GENERATION_TIMEOUT_SECS} must be a whole number of seconds, got {raw}"
        ))
    })?;

    let timeout = Duration::from_secs(secs);
    if secs == 0 || timeout > MAX_GENERATION_TIMEOUT {
        return Err(CoreError::InvalidConfig(format!(
            "{ENV_GENERATION_TIMEOUT_SECS} must be between 1 and {}",
            MAX_GENERATION_TIMEOUT.as_secs()
        )));
    }

    Ok(Some(timeout))
}

/// Split the generator's leading arguments on whitespace.
///
/// Unset falls back to [`DEFAULT_GENERATOR_ARGS`]; an explicitly empty value means no
/// leading arguments. Quoting is not supported.
pub fn generator_args_from_env_value(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_else(|| DEFAULT_GENERATOR_ARGS.into())
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn positive_usize_from_env_value(
    name: &str,
    value: Option<String>,
    default: usize,
) -> CoreResult<usize> {
    match non_empty(value) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(CoreError::InvalidConfig(format!(
                "{name} must be a positive integer, got {raw}"
            ))),
        },
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = CoreConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(cfg.uploads_dir(), Path::new(DEFAULT_UPLOADS_DIR));
        assert_eq!(cfg.generated_dir(), Path::new(DEFAULT_GENERATED_DIR));
        assert_eq!(cfg.generator().program(), DEFAULT_GENERATOR_PROGRAM);
        assert_eq!(cfg.generator().args(), ["testcase_generator.py"]);
        assert_eq!(cfg.generator().working_dir(), None);
        assert_eq!(cfg.generator().timeout(), None);
        assert_eq!(
            cfg.max_concurrent_generations(),
            DEFAULT_MAX_CONCURRENT_GENERATIONS
        );
    }

    #[test]
    fn overrides_from_environment() {
        let cfg = CoreConfig::from_lookup(lookup_from(&[
            (ENV_UPLOADS_DIR, "/srv/in"),
            (ENV_GENERATED_DIR, "/srv/out"),
            (ENV_GENERATOR_PROGRAM, "/usr/bin/env"),
            (ENV_GENERATOR_ARGS, "python3  -u gen.py"),
            (ENV_GENERATOR_WORKDIR, "/srv/gen"),
            (ENV_GENERATION_TIMEOUT_SECS, "90"),
            (ENV_MAX_CONCURRENT_GENERATIONS, "2"),
        ]))
        .unwrap();

        assert_eq!(cfg.uploads_dir(), Path::new("/srv/in"));
        assert_eq!(cfg.generated_dir(), Path::new("/srv/out"));
        assert_eq!(cfg.generator().program(), "/usr/bin/env");
        assert_eq!(cfg.generator().args(), ["python3", "-u", "gen.py"]);
        assert_eq!(cfg.generator().working_dir(), Some(Path::new("/srv/gen")));
        assert_eq!(cfg.generator().timeout(), Some(Duration::from_secs(90)));
        assert_eq!(cfg.max_concurrent_generations(), 2);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = CoreConfig::from_lookup(lookup_from(&[
            (ENV_UPLOADS_DIR, "  "),
            (ENV_GENERATOR_PROGRAM, ""),
            (ENV_GENERATION_TIMEOUT_SECS, ""),
        ]))
        .unwrap();

        assert_eq!(cfg.uploads_dir(), Path::new(DEFAULT_UPLOADS_DIR));
        assert_eq!(cfg.generator().program(), DEFAULT_GENERATOR_PROGRAM);
        assert_eq!(cfg.generator().timeout(), None);
    }

    #[test]
    fn empty_generator_args_means_none() {
        assert!(generator_args_from_env_value(Some(String::new())).is_empty());
        assert_eq!(
            generator_args_from_env_value(None),
            vec!["testcase_generator.py".to_string()]
        );
    }

    #[test]
    fn zero_concurrency_rejected() {
        let err = CoreConfig::from_lookup(lookup_from(&[(ENV_MAX_CONCURRENT_GENERATIONS, "0")]))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));

        let err = CoreConfig::from_lookup(lookup_from(&[(ENV_MAX_CONCURRENT_GENERATIONS, "many")]))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }

    #[test]
    fn same_directories_rejected() {
        let generator = GeneratorConfig::new("python3", vec![]).unwrap();
        let err = CoreConfig::new("files".into(), "files".into(), generator, 1).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }

    #[test]
    fn empty_program_rejected() {
        assert!(matches!(
            GeneratorConfig::new("  ", vec![]),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn timeout_parsing() {
        assert_eq!(timeout_from_env_value(None).unwrap(), None);
        assert_eq!(
            timeout_from_env_value(Some("5".into())).unwrap(),
            Some(Duration::from_secs(5))
        );
        assert!(timeout_from_env_value(Some("0".into())).is_err());
        assert!(timeout_from_env_value(Some("-3".into())).is_err());
        assert!(timeout_from_env_value(Some("999999999".into())).is_err());
    }

    #[test]
    fn port_parsing() {
        assert_eq!(port_from_env_value(None).unwrap(), DEFAULT_PORT);
        assert_eq!(port_from_env_value(Some("8080".into())).unwrap(), 8080);
        assert!(port_from_env_value(Some("70000".into())).is_err());
        assert!(port_from_env_value(Some("http".into())).is_err());
    }

    #[test]
    fn upload_limit_parsing() {
        assert_eq!(
            max_upload_bytes_from_env_value(None).unwrap(),
            DEFAULT_MAX_UPLOAD_BYTES
        );
        assert_eq!(
            max_upload_bytes_from_env_value(Some("1024".into())).unwrap(),
            1024
        );
        assert!(max_upload_bytes_from_env_value(Some("0".into())).is_err());
    }
}
