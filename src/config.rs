//! # Configuration
//!
//! Layered application configuration: built-in defaults, an optional TOML
//! file, `GSA_ADAPTER__*` environment variables and finally command line
//! overrides. The resulting [`Config`] is immutable and shared behind an
//! `Arc` for the lifetime of the process.

use crate::gsa::xml::{is_supported_encoding, is_valid_date_format};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Environment variable prefix, e.g. `GSA_ADAPTER__GSA__MAX_PAGE_SIZE=50`
pub const ENV_PREFIX: &str = "GSA_ADAPTER";

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub gsa: GsaConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub graceful_shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8088,
            graceful_shutdown_timeout_secs: 5,
        }
    }
}

/// Settings of the GSA protocol endpoint itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GsaConfig {
    /// Whether the GSA route is served at all
    pub enabled: bool,
    /// Path prefix the adapter answers under
    pub path_prefix: String,
    /// Sort applied when the request carries none, and as tiebreaker otherwise
    pub default_sort: String,
    pub default_page_size: usize,
    pub min_page_size: usize,
    pub max_page_size: usize,
    /// Language used when neither `ulang` nor `Accept-Language` yield one
    pub default_lang: String,
    /// Namespace prefix of document metadata fields
    pub meta_prefix: String,
    /// Index field used for `date:` sorts
    pub timestamp_field: String,
    /// Output encoding when the request carries no `oe` parameter
    pub default_encoding: String,
    /// chrono format string used for date values
    pub date_format: String,
    /// Metadata fields emitted as `<MT>` elements; empty emits all
    pub response_fields: Vec<String>,
}

impl Default for GsaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path_prefix: "/gsa".to_string(),
            default_sort: "score.desc".to_string(),
            default_page_size: 10,
            min_page_size: 1,
            max_page_size: 100,
            default_lang: "en".to_string(),
            meta_prefix: "meta_".to_string(),
            timestamp_field: "timestamp".to_string(),
            default_encoding: "UTF-8".to_string(),
            date_format: "%Y-%m-%dT%H:%M:%S%.3fZ".to_string(),
            response_fields: Vec::new(),
        }
    }
}

/// Search engine connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub base_url: String,
    pub search_path: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            search_path: "/api/v1/documents".to_string(),
            timeout_secs: 30,
            user_agent: format!("gsa-compat-adapter/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, `RUST_LOG` takes precedence
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Command line overrides, applied on top of file and environment values
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub engine_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub disable_gsa: bool,
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("gsa.response_fields"),
            )
            .build()?
            .try_deserialize()?;

        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Apply command line overrides
    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(engine_url) = overrides.engine_url {
            self.engine.base_url = engine_url;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
        if overrides.disable_gsa {
            self.gsa.enabled = false;
        }
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::invalid_input("server.port", "must be non-zero"));
        }

        self.gsa.validate()?;

        if url::Url::parse(&self.engine.base_url).is_err() {
            return Err(Error::invalid_input(
                "engine.base_url",
                format!("not a valid URL: {}", self.engine.base_url),
            ));
        }
        if !self.engine.search_path.starts_with('/') {
            return Err(Error::invalid_input("engine.search_path", "must start with '/'"));
        }
        if self.engine.timeout_secs == 0 {
            return Err(Error::invalid_input("engine.timeout_secs", "must be non-zero"));
        }

        Ok(())
    }
}

impl GsaConfig {
    fn validate(&self) -> Result<()> {
        let prefix = &self.path_prefix;
        if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
            return Err(Error::invalid_input(
                "gsa.path_prefix",
                format!("must look like '/gsa', got '{prefix}'"),
            ));
        }

        if self.min_page_size == 0 {
            return Err(Error::invalid_input("gsa.min_page_size", "must be at least 1"));
        }
        if self.min_page_size > self.max_page_size {
            return Err(Error::invalid_input(
                "gsa.min_page_size",
                format!(
                    "{} exceeds max_page_size {}",
                    self.min_page_size, self.max_page_size
                ),
            ));
        }
        if !(self.min_page_size..=self.max_page_size).contains(&self.default_page_size) {
            return Err(Error::invalid_input(
                "gsa.default_page_size",
                format!(
                    "{} outside [{}, {}]",
                    self.default_page_size, self.min_page_size, self.max_page_size
                ),
            ));
        }

        for (field, value) in [
            ("gsa.default_sort", &self.default_sort),
            ("gsa.default_lang", &self.default_lang),
            ("gsa.timestamp_field", &self.timestamp_field),
            ("gsa.date_format", &self.date_format),
        ] {
            if value.trim().is_empty() {
                return Err(Error::invalid_input(field, "cannot be empty"));
            }
        }

        if !is_valid_date_format(&self.date_format) {
            return Err(Error::invalid_input(
                "gsa.date_format",
                format!("not a valid strftime pattern: '{}'", self.date_format),
            ));
        }

        if !is_supported_encoding(&self.default_encoding) {
            return Err(Error::UnsupportedEncoding {
                encoding: self.default_encoding.clone(),
            });
        }

        Ok(())
    }
}
