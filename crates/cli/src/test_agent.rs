//! In-process stand-in for the agent, for client tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::task::JoinHandle;

use xeneon_protocol::{
    routes, AudioSession, ErrorResponse, HdrRequest, HdrResponse, MuteRequest, MuteResponse,
    PingResponse, PinnedAppsRequest, PinnedAppsResponse, SessionsResponse, VolumeRequest,
    VolumeResponse,
};

#[derive(Default)]
pub(crate) struct FakeAgentState {
    pub sessions: Vec<AudioSession>,
    pub pinned: Vec<String>,
    pub failure: Option<(u16, String)>,
    /// Held before answering a sessions request, like a slow mixer tool.
    pub sessions_delay: Duration,
    pub calls: Vec<String>,
}

type Shared = Arc<Mutex<FakeAgentState>>;

pub(crate) struct TestAgent {
    addr: SocketAddr,
    state: Shared,
    task: JoinHandle<()>,
}

pub(crate) fn session(name: &str, volume: f64) -> AudioSession {
    let mut s = AudioSession {
        name: name.to_string(),
        device_name: "Speakers".to_string(),
        volume_percent: String::new(),
        muted: false,
        process_id: "100".to_string(),
    };
    s.set_volume_level(volume);
    s
}

impl TestAgent {
    pub async fn spawn(names: &[&str]) -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeAgentState {
            sessions: names.iter().map(|n| session(n, 50.0)).collect(),
            ..Default::default()
        }));

        let app = Router::new()
            .route(routes::PING, get(ping))
            .route(routes::SESSIONS, get(sessions))
            .route(routes::PINNED_APPS, get(pinned).post(save_pinned))
            .route(routes::MUTE, post(mute))
            .route(routes::VOLUME, post(volume))
            .route(routes::HDR, post(hdr))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test agent");
        let addr = listener.local_addr().expect("local addr");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state, task }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn state(&self) -> MutexGuard<'_, FakeAgentState> {
        self.state.lock().expect("fake agent lock")
    }

    pub fn fail_with(&self, status: u16, message: &str) {
        self.state().failure = Some((status, message.to_string()));
    }

    pub fn recover(&self) {
        self.state().failure = None;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }
}

impl Drop for TestAgent {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn lock(state: &Shared) -> MutexGuard<'_, FakeAgentState> {
    state.lock().expect("fake agent lock")
}

fn failure(state: &FakeAgentState) -> Option<Response> {
    state.failure.as_ref().map(|(status, message)| {
        let code = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (code, Json(ErrorResponse::new(message.clone()))).into_response()
    })
}

async fn ping(State(state): State<Shared>) -> Response {
    let s = lock(&state);
    failure(&s).unwrap_or_else(|| {
        Json(PingResponse {
            status: "online".into(),
            hostname: "TEST-PC".into(),
        })
        .into_response()
    })
}

async fn sessions(State(state): State<Shared>) -> Response {
    let delay = lock(&state).sessions_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let s = lock(&state);
    failure(&s).unwrap_or_else(|| {
        Json(SessionsResponse {
            success: true,
            sessions: s.sessions.clone(),
        })
        .into_response()
    })
}

async fn pinned(State(state): State<Shared>) -> Response {
    let s = lock(&state);
    failure(&s).unwrap_or_else(|| {
        Json(PinnedAppsResponse {
            success: true,
            apps: s.pinned.clone(),
        })
        .into_response()
    })
}

async fn save_pinned(State(state): State<Shared>, Json(req): Json<PinnedAppsRequest>) -> Response {
    let mut s = lock(&state);
    if let Some(resp) = failure(&s) {
        return resp;
    }
    s.calls.push(format!("pin {}", req.apps.join(",")));
    s.pinned = req.apps.clone();
    Json(PinnedAppsResponse {
        success: true,
        apps: req.apps,
    })
    .into_response()
}

async fn mute(State(state): State<Shared>, Json(req): Json<MuteRequest>) -> Response {
    let mut s = lock(&state);
    if let Some(resp) = failure(&s) {
        return resp;
    }
    s.calls.push(format!("mute {} {}", req.app_name, req.mute));
    if let Some(session) = s.sessions.iter_mut().find(|x| x.name == req.app_name) {
        session.muted = req.mute;
    }
    Json(MuteResponse {
        success: true,
        app: req.app_name,
        muted: req.mute,
    })
    .into_response()
}

// Records the request but leaves the reported volume alone, so tests can
// observe an authoritative value that differs from the optimistic one.
async fn volume(State(state): State<Shared>, Json(req): Json<VolumeRequest>) -> Response {
    let mut s = lock(&state);
    if let Some(resp) = failure(&s) {
        return resp;
    }
    s.calls.push(format!("volume {} {}", req.app_name, req.level));
    Json(VolumeResponse {
        success: true,
        app: req.app_name,
        level: req.level,
    })
    .into_response()
}

async fn hdr(State(state): State<Shared>, Json(req): Json<HdrRequest>) -> Response {
    let mut s = lock(&state);
    if let Some(resp) = failure(&s) {
        return resp;
    }
    let mode = req.mode();
    s.calls.push(format!("hdr {}", mode.as_str()));
    Json(HdrResponse {
        success: true,
        message: format!("HDR {} requested", mode.as_str()),
    })
    .into_response()
}
