//! Application state

use std::sync::Arc;

use crate::audio::AudioMixer;
use crate::hdr::HdrControl;
use crate::store::PinnedAppsStore;

/// Shared by every handler. Holds no live session data; sessions are
/// enumerated fresh per request.
pub struct AppState {
    pub mixer: Arc<dyn AudioMixer>,
    pub hdr: Arc<dyn HdrControl>,
    pub store: PinnedAppsStore,
    pub hostname: String,
}

impl AppState {
    pub fn new(
        mixer: Arc<dyn AudioMixer>,
        hdr: Arc<dyn HdrControl>,
        store: PinnedAppsStore,
        hostname: String,
    ) -> Self {
        Self {
            mixer,
            hdr,
            store,
            hostname,
        }
    }
}

/// `COMPUTERNAME` (set on Windows) > OS hostname > `"Unknown PC"`.
pub fn resolve_hostname() -> String {
    std::env::var("COMPUTERNAME")
        .ok()
        .filter(|name| !name.trim().is_empty())
        .or_else(|| {
            hostname::get()
                .ok()
                .map(|name| name.to_string_lossy().into_owned())
                .filter(|name| !name.is_empty())
        })
        .unwrap_or_else(|| "Unknown PC".to_string())
}
