//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::domain::{RouteState, StatusSnapshot};
use crate::poller::ExternalEvent;

use super::dto::{FastOnlyDto, RouteStateDto};
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status_text))
        .route("/status.json", get(status_json))
        .route("/routes", get(list_routes))
        .route("/events/network-available", post(network_available))
        .route("/events/refresh", post(refresh))
        .route("/fast-only/toggle", post(toggle_fast_only))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Latest combined status as plain text.
async fn status_text(State(state): State<AppState>) -> String {
    state.poller.status().text
}

/// Latest combined status with its kind tag.
async fn status_json(State(state): State<AppState>) -> Json<StatusSnapshot> {
    Json(state.poller.status())
}

/// Cached per-route states for the active filter mode, in configured
/// order. Routes the poller has not reached yet show as loading.
async fn list_routes(State(state): State<AppState>) -> Json<Vec<RouteStateDto>> {
    let fast_only = state.poller.fast_only();
    let states = state
        .routes
        .iter()
        .map(|route| {
            let key = (route.id.clone(), fast_only);
            let cached = state
                .cache
                .get(&key)
                .unwrap_or_else(|| RouteState::loading(route.title()));
            RouteStateDto::new(route.id.as_str(), cached)
        })
        .collect();
    Json(states)
}

/// Entry point for the platform's connectivity-restored notification.
async fn network_available(State(state): State<AppState>) -> StatusCode {
    state.poller.notify(ExternalEvent::NetworkAvailable);
    StatusCode::ACCEPTED
}

/// Manual refresh request from a display consumer.
async fn refresh(State(state): State<AppState>) -> StatusCode {
    state.poller.notify(ExternalEvent::RefreshRequested);
    StatusCode::ACCEPTED
}

/// Flip the fast-only filter and report the new mode.
async fn toggle_fast_only(State(state): State<AppState>) -> Json<FastOnlyDto> {
    let fast_only = !state.poller.fast_only();
    state.poller.notify(ExternalEvent::FastOnlyToggled(fast_only));
    Json(FastOnlyDto { fast_only })
}
