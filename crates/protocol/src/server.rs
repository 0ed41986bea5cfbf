//! Agent → Client response bodies

use serde::{Deserialize, Serialize};

use crate::types::AudioSession;

/// `GET /api/ping`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: String,
    pub hostname: String,
}

/// `POST /api/system/hdr`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HdrResponse {
    pub success: bool,
    pub message: String,
}

/// `GET /api/audio/sessions`. Always `success: true`; an empty list covers
/// every enumeration failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub success: bool,
    #[serde(default)]
    pub sessions: Vec<AudioSession>,
}

/// `POST /api/audio/mute`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuteResponse {
    pub success: bool,
    pub app: String,
    pub muted: bool,
}

/// `POST /api/audio/volume`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeResponse {
    pub success: bool,
    pub app: String,
    pub level: f64,
}

/// `GET`/`POST /api/config/pinned-apps`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinnedAppsResponse {
    pub success: bool,
    #[serde(default)]
    pub apps: Vec<String>,
}

/// Body of every 4xx/5xx the agent returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}
