use anyhow::Context;
use clap::Parser;
use media_gateway::config::Args;
use media_gateway::rate_limit::sweeper;
use media_gateway::state::AppState;
use media_gateway::{app, metrics};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // parse cli arguments
    let args = Args::parse();
    init_tracing(&args.log_level);
    metrics::register();

    let state = Arc::new(AppState::from_args(&args).context("invalid configuration")?);

    if args.sweep_interval_secs > 0 {
        let limiter = Arc::clone(&state.limiter);
        let every = Duration::from_secs(args.sweep_interval_secs);
        tokio::spawn(async move {
            sweeper(limiter, every).await;
        });
    }

    match state.media.total_size().await {
        Ok(size) => tracing::info!(path = %args.media_path.display(), size, "media file found"),
        Err(err) => tracing::warn!(error = %err, "media file is not readable yet"),
    }

    let app = app(Arc::clone(&state), &args.route);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("Media gateway running on http://{addr}{}", args.route);
    tracing::info!(
        "Rate limit: {} requests per {} ms ({})",
        args.rate_limit,
        args.rate_window_ms,
        args.enforcement.as_str()
    );
    tracing::info!("Chunk size: {} bytes", args.chunk_size);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server error")?;
    Ok(())
}

// RUST_LOG wins over --log-level
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
