//! Tracing subscriber setup
//!
//! The library itself only emits `tracing` events and spans; applications
//! decide where they go. These helpers install a `tracing-subscriber` fmt
//! subscriber filtered to this crate.
//!
//! ```rust,ignore
//! use unillm::telemetry::{init_subscriber, OutputFormat, SubscriberConfig};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config)?;
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use crate::error::LlmError;

pub const ENV_LOG_LEVEL: &str = "UNILLM_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "UNILLM_LOG_FORMAT";
pub const ENV_LOG_FILE: &str = "UNILLM_LOG_FILE";

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    Json,
    JsonCompact,
}

impl FromStr for OutputFormat {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" => Ok(Self::JsonCompact),
            _ => Err(LlmError::ConfigurationError(format!(
                "Invalid log format: {s}. Valid options: text, json, json-compact"
            ))),
        }
    }
}

fn parse_level(s: &str) -> Result<tracing::Level, LlmError> {
    match s.to_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        _ => Err(LlmError::ConfigurationError(format!(
            "Invalid log level: {s}. Valid options: trace, debug, info, warn, error"
        ))),
    }
}

/// Configuration for the tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Write to stdout.
    pub enable_console: bool,
    /// Also (or only) write to this file, through a non-blocking writer.
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            enable_console: true,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            ..Self::default()
        }
    }

    /// Build a configuration from `UNILLM_*` variables looked up through `var`.
    pub fn from_vars<F>(var: F) -> Result<Self, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();
        if let Some(level) = var(ENV_LOG_LEVEL) {
            builder = builder.log_level_str(&level)?;
        }
        if let Some(format) = var(ENV_LOG_FORMAT) {
            builder = builder.output_format(format.parse()?);
        }
        if let Some(file) = var(ENV_LOG_FILE).filter(|f| !f.is_empty()) {
            builder = builder.log_file(PathBuf::from(file));
        }
        Ok(builder.build())
    }
}

/// Builder for [`SubscriberConfig`]
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    enable_console: Option<bool>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn log_level_str(mut self, level: &str) -> Result<Self, LlmError> {
        self.log_level = Some(parse_level(level)?);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn enable_console(mut self, enable: bool) -> Self {
        self.enable_console = Some(enable);
        self
    }

    pub fn log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            enable_console: self.enable_console.unwrap_or(true),
            log_file: self.log_file,
        }
    }
}

fn try_init_with<W>(config: &SubscriberConfig, writer: W) -> Result<(), LlmError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    // A subscriber installed earlier (by the application or a test) is kept.
    if tracing::dispatcher::has_been_set() {
        tracing::debug!("global subscriber already set, keeping it");
        return Ok(());
    }
    let level = config.log_level.as_str().to_lowercase();
    let filter = format!("unillm={level}");
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true);
    let result = match config.output_format {
        OutputFormat::Json => builder
            .with_thread_ids(true)
            .with_thread_names(true)
            .json()
            .try_init(),
        OutputFormat::JsonCompact => builder
            .with_thread_ids(true)
            .with_thread_names(true)
            .json()
            .compact()
            .try_init(),
        OutputFormat::Text => builder.try_init(),
    };
    result.map_err(|e| LlmError::ConfigurationError(format!("Failed to initialize tracing: {e}")))
}

fn file_writer(path: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), LlmError> {
    let file_name = path.file_name().ok_or_else(|| {
        LlmError::ConfigurationError(format!("Invalid log file path: {}", path.display()))
    })?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

/// Install a global subscriber for `config`.
///
/// Returns the file writer's guard when `log_file` is set; keep it alive for
/// as long as logs should be flushed. Calling this when a subscriber is
/// already installed is not an error.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, LlmError> {
    match (&config.log_file, config.enable_console) {
        (Some(path), true) => {
            let (file, guard) = file_writer(path)?;
            try_init_with(&config, file.and(std::io::stdout))?;
            Ok(Some(guard))
        }
        (Some(path), false) => {
            let (file, guard) = file_writer(path)?;
            try_init_with(&config, file)?;
            Ok(Some(guard))
        }
        (None, true) => try_init_with(&config, std::io::stdout).map(|_| None),
        (None, false) => try_init_with(&config, std::io::sink).map(|_| None),
    }
}

pub fn init_default() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(SubscriberConfig::default())
}

pub fn init_debug() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(SubscriberConfig::debug())
}

/// Initialize from `UNILLM_LOG_LEVEL`, `UNILLM_LOG_FORMAT` and `UNILLM_LOG_FILE`.
pub fn init_from_env() -> Result<Option<WorkerGuard>, LlmError> {
    init_subscriber(SubscriberConfig::from_vars(|k| std::env::var(k).ok())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn config_from_vars() {
        let config = SubscriberConfig::from_vars(vars(&[
            (ENV_LOG_LEVEL, "DEBUG"),
            (ENV_LOG_FORMAT, "json-compact"),
            (ENV_LOG_FILE, "/tmp/unillm.log"),
        ]))
        .unwrap();
        assert_eq!(config.log_level, tracing::Level::DEBUG);
        assert_eq!(config.output_format, OutputFormat::JsonCompact);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/unillm.log")));
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        let err = SubscriberConfig::from_vars(vars(&[(ENV_LOG_LEVEL, "loud")])).unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));
        let err = SubscriberConfig::from_vars(vars(&[(ENV_LOG_FORMAT, "xml")])).unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));
    }

    #[test]
    fn init_twice_is_fine() {
        let _ = init_default();
        assert!(tracing::dispatcher::has_been_set());
        assert!(init_debug().is_ok());
        assert!(init_default().is_ok());
    }
}
