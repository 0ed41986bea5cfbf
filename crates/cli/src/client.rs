//! HTTP client for the agent API.

use std::time::Duration;

use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use xeneon_protocol::{
    routes, DEFAULT_TOOL_TIMEOUT_SECS, AudioSession, ErrorResponse, HdrMode, HdrRequest, HdrResponse, MuteRequest,
    MuteResponse, PingResponse, PinnedAppsRequest, PinnedAppsResponse, SessionsResponse,
    VolumeRequest, VolumeResponse,
};

pub const DEFAULT_AGENT_URL: &str = "http://localhost:4000";
/// Longer than the agent's own tool bound, so a slow but healthy agent is
/// never reported offline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS + 5);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid agent URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("agent unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("agent returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("agent reported failure on {0}")]
    Rejected(&'static str),
}

#[derive(Debug, Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    base: String,
}

impl AgentClient {
    pub fn new(base: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base: &str, timeout: Duration) -> Result<Self, ClientError> {
        let parsed = Url::parse(base).map_err(|e| ClientError::InvalidUrl {
            url: base.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl {
                url: base.to_string(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    // Paths are appended, so a base behind a reverse-proxy prefix keeps it.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self.http.get(self.url(path)).send().await?;
        decode(resp).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let resp = self.http.post(self.url(path)).json(body).send().await?;
        decode(resp).await
    }

    pub async fn ping(&self) -> Result<PingResponse, ClientError> {
        self.get(routes::PING).await
    }

    pub async fn sessions(&self) -> Result<Vec<AudioSession>, ClientError> {
        let resp: SessionsResponse = self.get(routes::SESSIONS).await?;
        if !resp.success {
            return Err(ClientError::Rejected(routes::SESSIONS));
        }
        Ok(resp.sessions)
    }

    pub async fn pinned_apps(&self) -> Result<Vec<String>, ClientError> {
        let resp: PinnedAppsResponse = self.get(routes::PINNED_APPS).await?;
        if !resp.success {
            return Err(ClientError::Rejected(routes::PINNED_APPS));
        }
        Ok(resp.apps)
    }

    pub async fn set_pinned_apps(&self, apps: &[String]) -> Result<Vec<String>, ClientError> {
        let resp: PinnedAppsResponse = self
            .post(
                routes::PINNED_APPS,
                &PinnedAppsRequest {
                    apps: apps.to_vec(),
                },
            )
            .await?;
        if !resp.success {
            return Err(ClientError::Rejected(routes::PINNED_APPS));
        }
        Ok(resp.apps)
    }

    pub async fn mute(&self, app_name: &str, mute: bool) -> Result<MuteResponse, ClientError> {
        self.post(
            routes::MUTE,
            &MuteRequest {
                app_name: app_name.to_string(),
                mute,
            },
        )
        .await
    }

    pub async fn set_volume(&self, app_name: &str, level: f64) -> Result<VolumeResponse, ClientError> {
        self.post(
            routes::VOLUME,
            &VolumeRequest {
                app_name: app_name.to_string(),
                level,
            },
        )
        .await
    }

    pub async fn hdr(&self, mode: HdrMode) -> Result<String, ClientError> {
        let resp: HdrResponse = self.post(routes::HDR, &HdrRequest::from(mode)).await?;
        if !resp.success {
            return Err(ClientError::Rejected(routes::HDR));
        }
        Ok(resp.message)
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json::<T>().await?);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.error)
        .unwrap_or(text);
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}
