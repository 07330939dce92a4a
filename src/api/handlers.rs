//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{extract::State, response::Json};
use tracing::info;

use crate::state::{AppState, SessionState};
use super::responses::{HealthResponse, StatusResponse, StreakResponse, TimerResponse};

fn timer_response(state: &AppState, snapshot: SessionState) -> TimerResponse {
    let total_seconds = state.clock.durations().for_phase(snapshot.phase);
    TimerResponse::new(snapshot, total_seconds)
}

fn streak_response(state: &AppState) -> StreakResponse {
    StreakResponse::new(state.streak.status(), state.streak.setup_url())
}

/// Handle GET /timer - Return the current timer snapshot
pub async fn timer_handler(State(state): State<Arc<AppState>>) -> Json<TimerResponse> {
    Json(timer_response(&state, state.clock.state()))
}

/// Handle POST /timer/start - Start or resume the countdown
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Json<TimerResponse> {
    let snapshot = state.clock.start();
    state.record_action("start");
    info!("Start endpoint called");
    Json(timer_response(&state, snapshot))
}

/// Handle POST /timer/pause - Pause the countdown
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Json<TimerResponse> {
    let snapshot = state.clock.pause();
    state.record_action("pause");
    info!("Pause endpoint called");
    Json(timer_response(&state, snapshot))
}

/// Handle POST /timer/toggle - Flip between running and paused
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> Json<TimerResponse> {
    let snapshot = state.clock.toggle();
    state.record_action("toggle");
    info!("Toggle endpoint called - running={}", snapshot.running);
    Json(timer_response(&state, snapshot))
}

/// Handle POST /timer/reset - Stop and refill the current phase
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Json<TimerResponse> {
    let snapshot = state.clock.reset();
    state.record_action("reset");
    info!("Reset endpoint called");
    Json(timer_response(&state, snapshot))
}

/// Handle GET /streak - Return the cached streak
pub async fn streak_handler(State(state): State<Arc<AppState>>) -> Json<StreakResponse> {
    Json(streak_response(&state))
}

/// Handle POST /streak/reload - Fetch the streak from the remote counter again
pub async fn reload_streak_handler(State(state): State<Arc<AppState>>) -> Json<StreakResponse> {
    state.record_action("reload-streak");
    let status = state.streak.load().await;
    info!("Streak reload endpoint called - streak={}", status.current_streak());
    Json(StreakResponse::new(status, state.streak.setup_url()))
}

/// Handle GET /status - Return timer, streak and server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer: timer_response(&state, state.clock.state()),
        streak: streak_response(&state),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
