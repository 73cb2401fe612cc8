//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{
    error::{PomodoroError, Result},
    state::{
        app_state::{BREAK_MINUTE_CHOICES, THEME_CHOICES, WORK_MINUTE_CHOICES},
        AppState, Snapshot,
    },
};
use super::responses::{
    ApiResponse, HealthResponse, SettingsChoices, SettingsRequest, StatusResponse,
};

type HandlerResult<T> = std::result::Result<Json<T>, (StatusCode, Json<ApiResponse>)>;

/// Map a state operation onto an HTTP reply
fn respond(action: &str, result: Result<Snapshot>) -> HandlerResult<ApiResponse> {
    match result {
        Ok(snapshot) => {
            info!("{} endpoint called - {} {} left", action, snapshot.phase.as_str(), snapshot.remaining);
            Ok(Json(ApiResponse::ok(format!("{} applied", action), snapshot)))
        }
        Err(e @ (PomodoroError::InvalidChoice { .. } | PomodoroError::InvalidDuration { .. })) => {
            warn!("Rejected {}: {}", action, e);
            Err((StatusCode::UNPROCESSABLE_ENTITY, Json(ApiResponse::error(e.to_string()))))
        }
        Err(e) => {
            error!("Failed to {}: {}", action, e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::error(e.to_string()))))
        }
    }
}

/// Handle POST /start - Start the countdown
pub async fn start_handler(State(state): State<Arc<AppState>>) -> HandlerResult<ApiResponse> {
    respond("start", state.start())
}

/// Handle POST /pause - Pause the countdown
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> HandlerResult<ApiResponse> {
    respond("pause", state.pause())
}

/// Handle POST /toggle - Play/pause button
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> HandlerResult<ApiResponse> {
    respond("toggle", state.toggle())
}

/// Handle POST /reset - Back to a full work phase
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> HandlerResult<ApiResponse> {
    respond("reset", state.reset())
}

/// Handle PUT /settings - Settings panel
pub async fn settings_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SettingsRequest>,
) -> HandlerResult<ApiResponse> {
    respond(
        "settings",
        state.apply_settings(request.work_minutes, request.break_minutes, request.theme),
    )
}

/// Handle POST /theme/toggle - Header theme button
pub async fn theme_toggle_handler(State(state): State<Arc<AppState>>) -> HandlerResult<ApiResponse> {
    respond("theme toggle", state.toggle_theme())
}

/// Handle GET /status - Return the current widget status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> HandlerResult<StatusResponse> {
    let timer = match state.snapshot() {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to get timer state: {}", e);
            return Err((StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::error(e.to_string()))));
        }
    };

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        choices: SettingsChoices {
            work_minutes: WORK_MINUTE_CHOICES.to_vec(),
            break_minutes: BREAK_MINUTE_CHOICES.to_vec(),
            themes: THEME_CHOICES.to_vec(),
        },
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
