//! Focus Streak - A state-managed HTTP server for a work/break focus timer
//!
//! This is the main entry point for the focus-streak application.

use std::sync::Arc;
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use focus_streak::{
    api::create_router,
    clock::{SessionClock, TokioScheduler},
    config::Config,
    state::AppState,
    streak::{RestCounterService, StreakSync},
    tasks::{drain_completion_worker, spawn_completion_worker},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("focus_streak={},tower_http=info", config.log_level()))
        .init();

    info!("Starting focus-streak server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, work={}s, break={}s, counter={}",
        config.host, config.port, config.work_seconds, config.break_seconds, config.counter_url
    );

    let counter = RestCounterService::new(
        config.counter_url.clone(),
        config.counter_api_key.clone(),
        config.request_timeout(),
    )
    .context("Failed to build counter service client")?;

    let identity = config.identity();
    if identity.is_none() {
        info!("No access token configured, streak will stay at zero");
    }
    let streak = Arc::new(StreakSync::new(Arc::new(counter), identity));

    // Start the completion worker and wire its callback into the clock
    let (on_complete, completion_worker) = spawn_completion_worker(Arc::clone(&streak));
    let clock = SessionClock::new(
        config.durations(),
        Arc::new(TokioScheduler::current()),
        on_complete,
    );

    // Initial streak fetch
    let initial_streak = Arc::clone(&streak);
    tokio::spawn(async move {
        initial_streak.load().await;
    });

    // Create application state and HTTP router
    let state = Arc::new(AppState::new(clock.clone(), streak, config.port, config.host.clone()));
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /timer          - Current timer snapshot");
    info!("  POST /timer/start    - Start the countdown");
    info!("  POST /timer/pause    - Pause the countdown");
    info!("  POST /timer/toggle   - Toggle running/paused");
    info!("  POST /timer/reset    - Reset the current phase");
    info!("  GET  /streak         - Cached daily streak");
    info!("  POST /streak/reload  - Reload streak from the counter");
    info!("  GET  /status         - Timer, streak and server status");
    info!("  GET  /health         - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // Shutting the clock down drops its completion callback, which closes the
    // queue; the worker then finishes completions that were already queued
    clock.shutdown();
    drain_completion_worker(completion_worker, config.request_timeout()).await;

    info!("Server shutdown complete");
    Ok(())
}
