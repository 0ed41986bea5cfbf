//! Xeneon Control Protocol
//!
//! Shared types for communication between the agent and its clients.
//! These types are serialized as JSON over plain HTTP.

pub mod client;
pub mod server;
pub mod types;

pub use client::{HdrRequest, MuteRequest, PinnedAppsRequest, VolumeRequest};
pub use server::{
    ErrorResponse, HdrResponse, MuteResponse, PingResponse, PinnedAppsResponse, SessionsResponse,
    VolumeResponse,
};
pub use types::*;

/// Default upper bound, in seconds, on one agent-side tool invocation. A
/// sessions request can take this long before the agent answers with an
/// empty list, so client request timeouts must exceed it.
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 10;

/// Route paths served by the agent.
pub mod routes {
    pub const PING: &str = "/api/ping";
    pub const HDR: &str = "/api/system/hdr";
    pub const SESSIONS: &str = "/api/audio/sessions";
    pub const MUTE: &str = "/api/audio/mute";
    pub const VOLUME: &str = "/api/audio/volume";
    pub const PINNED_APPS: &str = "/api/config/pinned-apps";
    pub const HEALTH: &str = "/health";
}
