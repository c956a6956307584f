// =============================================================================
// Aurora Signals: Main Entry Point
// =============================================================================
//
// Usage:
//   aurora-signals [serve]                 start the HTTP service
//   aurora-signals analyze <request.json>  run one analysis, print JSON
// =============================================================================

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use aurora_signals::analysis::{AnalysisEngine, AnalysisRequest};
use aurora_signals::api;
use aurora_signals::app_state::AppState;
use aurora_signals::runtime_config::RuntimeConfig;

const DEFAULT_CONFIG_PATH: &str = "runtime_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path =
        std::env::var("AURORA_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());

    let config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("serve") => serve(config, config_path).await,
        Some("analyze") => {
            let Some(path) = args.get(1) else {
                bail!("usage: aurora-signals analyze <request.json>");
            };
            analyze_file(&config, path)
        }
        Some(other) => bail!("unknown command '{other}' (expected 'serve' or 'analyze')"),
    }
}

// =============================================================================
// One-shot analysis
// =============================================================================

fn analyze_file(config: &RuntimeConfig, path: &str) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read analysis request from {path}"))?;
    let request: AnalysisRequest = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse analysis request from {path}"))?;

    let (candles, ctx, params) = match request.resolve(config) {
        Ok(parts) => parts,
        Err(problems) => bail!("invalid analysis request: {}", problems.join("; ")),
    };

    let result = AnalysisEngine::analyze(&candles, &ctx, &params);
    let json = serde_json::to_string_pretty(&result).context("failed to serialise result")?;
    println!("{json}");
    Ok(())
}

// =============================================================================
// HTTP service
// =============================================================================

async fn serve(config: RuntimeConfig, config_path: String) -> anyhow::Result<()> {
    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Aurora Signals: Starting Up                       ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let bind_addr = config.listen_addr.clone();
    info!(
        listen_addr = %bind_addr,
        default_exchange = %config.default_exchange,
        slow_ema = config.analysis.slow_ema_period,
        "Service configuration"
    );

    let admin_token = std::env::var("AURORA_ADMIN_TOKEN").ok();
    if admin_token.as_deref().map_or(true, str::is_empty) {
        warn!("AURORA_ADMIN_TOKEN is not set, config endpoints will reject every request");
    }

    let state = Arc::new(AppState::new(config, &config_path).with_admin_token(admin_token));
    let app = api::router(state.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server to {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            warn!("Shutdown signal received, stopping gracefully");
        })
        .await
        .context("API server failed")?;

    info!(
        analyses_served = state.analyses_served(),
        "Aurora Signals shut down complete."
    );
    Ok(())
}
