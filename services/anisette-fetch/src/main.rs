//! anisette-fetch
//!
//! One-shot acquisition of anisette data:
//! 1. Loads optional TOML config, overlaid by ALTSERVER_ANISETTE_* env vars
//! 2. Walks the candidate providers in order until one answers
//! 3. Prints the anisette headers as a JSON object on stdout
//!
//! Logs go to stderr as JSON so stdout stays machine-readable.

mod config;

use std::sync::Arc;

use anisette::{AnisetteFetcher, CredentialRecord, EndpointResolver, HttpTransport};
use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let (config_path, explicit) = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), explicit, "loading configuration");

    let config = Config::load(&config_path, explicit)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let output = run(&config).await?;
    println!("{output}");
    Ok(())
}

/// Acquire anisette data per `config` and render it as pretty JSON.
async fn run(config: &Config) -> Result<String> {
    let fetcher = build_fetcher(config)?;
    let candidates = fetcher.resolver().resolve();
    info!(
        candidates = candidates.len(),
        timeout_secs = config.anisette.timeout_secs,
        user_agent = %config.anisette.user_agent,
        "acquiring anisette data"
    );

    let record = fetcher
        .fetch_from(&candidates)
        .await
        .context("failed to acquire anisette data")?;

    render_headers(&record)
}

fn build_fetcher(config: &Config) -> Result<AnisetteFetcher> {
    let transport = HttpTransport::new(
        reqwest::Client::new(),
        &config.anisette.user_agent,
        config.timeout(),
    )
    .context("failed to build HTTP transport")?;

    Ok(AnisetteFetcher::new(
        EndpointResolver::new(config.overrides()),
        Arc::new(transport),
    ))
}

fn render_headers(record: &CredentialRecord) -> Result<String> {
    let headers: serde_json::Map<String, serde_json::Value> = record
        .headers()
        .into_iter()
        .map(|(name, value)| (name.to_string(), serde_json::Value::String(value)))
        .collect();
    serde_json::to_string_pretty(&headers).context("failed to serialize anisette headers")
}
