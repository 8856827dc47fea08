//! GSA compatibility adapter
//!
//! Answers legacy Google Search Appliance XML requests under a configurable
//! path prefix by querying a JSON search API.
//!
//! ```bash
//! gsa-compat-adapter --config adapter.toml --port 8088 \
//!   --engine-url http://search.internal:8080
//! ```

use anyhow::Context;
use clap::Parser;
use gsa_compat_adapter::{Config, ConfigOverrides, HttpSearchEngine, LogFormat, Server};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// GSA XML protocol compatibility adapter
#[derive(Parser, Debug)]
#[command(name = "gsa-compat-adapter", version)]
#[command(about = "Serve the Google Search Appliance XML protocol on top of a search engine")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "GSA_ADAPTER_CONFIG")]
    config: Option<PathBuf>,

    /// Listen host
    #[arg(long)]
    host: Option<String>,

    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Base URL of the search engine
    #[arg(long)]
    engine_url: Option<String>,

    /// Log filter directive, overridden by RUST_LOG
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Serve only /health, answer 404 on the GSA prefix
    #[arg(long)]
    disable_gsa: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            engine_url: self.engine_url.clone(),
            log_level: self.log_level.clone(),
            log_format: self.log_format,
            disable_gsa: self.disable_gsa,
        }
    }
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) => EnvFilter::try_new(directives),
        Err(_) => EnvFilter::try_new(format!("{},tower_http=debug", config.logging.level)),
    }
    .context("invalid log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match config.logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    }
    .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref())
        .context("failed to load configuration")?
        .with_overrides(args.overrides());

    init_tracing(&config)?;
    config.validate().context("invalid configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        engine = %config.engine.base_url,
        "Starting GSA compatibility adapter"
    );

    let engine = HttpSearchEngine::new(&config).context("failed to create search engine client")?;
    let server = Server::new(config, Arc::new(engine));
    server.run().await.context("server error")?;

    Ok(())
}
