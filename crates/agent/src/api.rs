//! REST handlers.
//!
//! Live-device commands (mute, volume) are best effort: a failed tool
//! invocation is logged and the response still reports success. Pinned-apps
//! writes are not: a failed write is a 500.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, Method};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use xeneon_protocol::{
    clamp_volume, routes, HdrRequest, HdrResponse, MuteRequest, MuteResponse, PingResponse,
    PinnedAppsResponse, SessionsResponse, VolumeRequest, VolumeResponse,
};

use crate::audio::Enumeration;
use crate::error::ApiError;
use crate::state::AppState;

pub type SharedState = Arc<AppState>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(routes::PING, get(ping))
        .route(routes::HDR, axum::routing::post(set_hdr))
        .route(routes::SESSIONS, get(list_sessions))
        .route(routes::MUTE, axum::routing::post(set_mute))
        .route(routes::VOLUME, axum::routing::post(set_volume))
        .route(routes::PINNED_APPS, get(get_pinned_apps).post(set_pinned_apps))
        .route(routes::HEALTH, get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

/// Any origin may call the agent, including pages served from a public
/// origin reaching into the private network (answers PNA preflights).
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_private_network(true)
}

async fn health() -> impl IntoResponse {
    "OK"
}

pub async fn ping(State(state): State<SharedState>) -> Json<PingResponse> {
    Json(PingResponse {
        status: "online".to_string(),
        hostname: state.hostname.clone(),
    })
}

pub async fn set_hdr(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<HdrResponse>, ApiError> {
    let request: HdrRequest = if is_blank(&body) {
        HdrRequest::default()
    } else {
        parse_body(&body)?
    };

    let message = state.hdr.set(request.mode()).await.inspect_err(|e| {
        warn!(
            component = "api",
            event = "hdr.failed",
            error = %e,
            "HDR request failed"
        );
    })?;

    Ok(Json(HdrResponse {
        success: true,
        message,
    }))
}

pub async fn list_sessions(State(state): State<SharedState>) -> Json<SessionsResponse> {
    let sessions = match state.mixer.sessions().await {
        Enumeration::Ok(sessions) => sessions,
        Enumeration::Degraded(reason) => {
            info!(
                component = "api",
                event = "sessions.degraded",
                reason = %reason,
                "Serving empty session list"
            );
            Vec::new()
        }
    };

    Json(SessionsResponse {
        success: true,
        sessions,
    })
}

pub async fn set_mute(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<MuteResponse>, ApiError> {
    let request: MuteRequest = parse_body(&body)?;

    if let Err(e) = state.mixer.set_mute(&request.app_name, request.mute).await {
        warn!(
            component = "api",
            event = "audio.mute.failed",
            app = %request.app_name,
            mute = request.mute,
            error = %e,
            "Failed to change mute state"
        );
    }

    Ok(Json(MuteResponse {
        success: true,
        app: request.app_name,
        muted: request.mute,
    }))
}

pub async fn set_volume(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<VolumeResponse>, ApiError> {
    let request: VolumeRequest = parse_body(&body)?;
    let level = clamp_volume(request.level);

    if let Err(e) = state.mixer.set_volume(&request.app_name, level).await {
        warn!(
            component = "api",
            event = "audio.volume.failed",
            app = %request.app_name,
            volume = level,
            error = %e,
            "Failed to set volume"
        );
    }

    Ok(Json(VolumeResponse {
        success: true,
        app: request.app_name,
        level,
    }))
}

pub async fn get_pinned_apps(State(state): State<SharedState>) -> Json<PinnedAppsResponse> {
    Json(PinnedAppsResponse {
        success: true,
        apps: state.store.read(),
    })
}

pub async fn set_pinned_apps(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<PinnedAppsResponse>, ApiError> {
    let value: Value = parse_body(&body)?;
    let apps = pinned_apps_from(&value)?;

    let store = state.store.clone();
    let to_write = apps.clone();
    tokio::task::spawn_blocking(move || store.write(&to_write))
        .await
        .map_err(|e| ApiError::Internal(format!("pinned apps write task failed: {e}")))??;

    info!(
        component = "api",
        event = "config.pinned_apps.saved",
        count = apps.len(),
        "Pinned apps saved"
    );

    Ok(Json(PinnedAppsResponse {
        success: true,
        apps,
    }))
}

/// `{"apps": [...]}` with string elements only. Anything else is rejected,
/// never coerced.
fn pinned_apps_from(value: &Value) -> Result<Vec<String>, ApiError> {
    let Some(items) = value.get("apps").and_then(Value::as_array) else {
        return Err(ApiError::BadRequest(
            "Invalid format. 'apps' must be an array.".to_string(),
        ));
    };

    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                ApiError::BadRequest("Invalid format. 'apps' must contain only strings.".into())
            })
        })
        .collect()
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))
}

fn is_blank(body: &Bytes) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}
