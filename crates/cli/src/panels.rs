//! Embedded dashboard panels: home automation and server monitoring.
//!
//! Panels are referenced by URL only. Both must be served over HTTPS so the
//! hosting page never mixes content.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Pixels cropped off the top of the home panel when its toolbar is hidden.
pub const HEADER_CROP_PX: u32 = 56;
/// Share of the row the home panel takes when the mixer sits beside it.
pub const HOME_WIDTH_WITH_MIXER_PCT: u8 = 60;
pub const MONITOR_PORT: u16 = 9443;
pub const MIN_IFRAME_SCALE: f64 = 0.5;
pub const MAX_IFRAME_SCALE: f64 = 1.5;

const MONITOR_HINT_TYPE: &str = "BESZEL_UPDATE";

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("{panel} panel URL {url} is invalid: {reason}")]
    InvalidUrl {
        panel: &'static str,
        url: String,
        reason: String,
    },

    #[error("{panel} panel URL {url} must use https")]
    NotHttps { panel: &'static str, url: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomePanel {
    pub url: Option<String>,
    pub show_toolbar: bool,
    pub show_left_panel: bool,
}

impl Default for HomePanel {
    fn default() -> Self {
        Self {
            url: None,
            show_toolbar: true,
            show_left_panel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorPanel {
    /// Defaults to `https://<agent host>:9443/`.
    pub url: Option<String>,
    pub show_header: bool,
}

impl Default for MonitorPanel {
    fn default() -> Self {
        Self {
            url: None,
            show_header: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSettings {
    pub home: HomePanel,
    pub monitor: MonitorPanel,
    pub iframe_scale: f64,
    pub show_debug: bool,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            home: HomePanel::default(),
            monitor: MonitorPanel::default(),
            iframe_scale: 1.0,
            show_debug: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPanel {
    pub name: &'static str,
    pub url: Url,
    pub scale: f64,
    /// Negative top offset applied to the embedded page.
    pub crop_top_px: u32,
    /// Share of the dashboard row, in percent.
    pub width_pct: u8,
    /// Message posted to the embedded page, if the panel takes one.
    pub hint: Option<Value>,
}

/// The message the monitor panel's page listens for.
pub fn visibility_hint(show_header: bool) -> Value {
    json!({ "type": MONITOR_HINT_TYPE, "showHeader": show_header })
}

pub fn clamp_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        return 1.0;
    }
    scale.clamp(MIN_IFRAME_SCALE, MAX_IFRAME_SCALE)
}

fn https_url(panel: &'static str, raw: &str) -> Result<Url, PanelError> {
    let url = Url::parse(raw).map_err(|e| PanelError::InvalidUrl {
        panel,
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.scheme() != "https" {
        return Err(PanelError::NotHttps {
            panel,
            url: raw.to_string(),
        });
    }
    Ok(url)
}

fn default_monitor_url(agent_url: &str) -> String {
    let host = Url::parse(agent_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "localhost".to_string());
    format!("https://{host}:{MONITOR_PORT}/")
}

impl PanelSettings {
    pub fn scale(&self) -> f64 {
        clamp_scale(self.iframe_scale)
    }

    /// Validate and resolve every configured panel. The home panel is skipped
    /// when no URL is set.
    pub fn resolve(&self, agent_url: &str) -> Result<Vec<ResolvedPanel>, PanelError> {
        let scale = self.scale();
        let mut panels = Vec::with_capacity(2);

        if let Some(raw) = self.home.url.as_deref() {
            panels.push(ResolvedPanel {
                name: "home",
                url: https_url("home", raw)?,
                scale,
                crop_top_px: if self.home.show_toolbar {
                    0
                } else {
                    HEADER_CROP_PX
                },
                width_pct: if self.home.show_left_panel {
                    HOME_WIDTH_WITH_MIXER_PCT
                } else {
                    100
                },
                hint: None,
            });
        }

        let monitor_raw = self
            .monitor
            .url
            .clone()
            .unwrap_or_else(|| default_monitor_url(agent_url));
        panels.push(ResolvedPanel {
            name: "monitor",
            url: https_url("monitor", &monitor_raw)?,
            scale,
            crop_top_px: 0,
            width_pct: 100,
            hint: Some(visibility_hint(self.monitor.show_header)),
        });

        Ok(panels)
    }
}
