//! cnrates Server Binary
//!
//! Serves `GET /api/exchange-rates`, or probes the upstreams once.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cnrates_fx::{Aggregator, RateCache, RateCacheConfig};
use cnrates_server::{probe, router, AppState, ServerConfig};

/// USD/CNY and USD/CNH exchange rate service
#[derive(Parser, Debug)]
#[command(name = "cnrates")]
#[command(about = "Onshore and offshore renminbi exchange rate service")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Fetch every upstream once and print the results
    Probe,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ServerConfig::from_env()?;
    init_logging(&config.log_level);

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let client = reqwest::Client::builder().build()?;
    let aggregator = Aggregator::from_config(client, &config.upstream);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, aggregator).await,
        Command::Probe => {
            let report = probe::run(&aggregator).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_healthy() {
                anyhow::bail!("No exchange rate could be fetched");
            }
            Ok(())
        }
    }
}

fn init_logging(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string()),
    );

    if std::env::var("LOG_FORMAT").as_deref() == Ok("pretty") {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    }
}

async fn serve(config: ServerConfig, aggregator: Aggregator) -> anyhow::Result<()> {
    info!(legacy = ?config.legacy, "Legacy exchange API settings loaded (unused)");

    let cache = Arc::new(RateCache::with_config(
        Arc::new(aggregator),
        RateCacheConfig {
            ttl: config.cache_ttl,
        },
    ));
    let app = router(AppState::new(cache));

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(
        addr = %listener.local_addr()?,
        cache_ttl_secs = config.cache_ttl.num_seconds(),
        "cnrates server running"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C");
            }
            info!("Shutdown signal received");
        })
        .await?;

    info!("cnrates server shutdown complete");
    Ok(())
}
