//! Core types shared across the protocol

use serde::{Deserialize, Serialize};

/// One live audio-producing application, as reported by the OS mixer.
///
/// Rebuilt from scratch on every enumeration. `name` is the only key that
/// links a session across polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioSession {
    pub name: String,
    #[serde(default)]
    pub device_name: String,
    /// Formatted percentage, e.g. `"42.5%"`.
    #[serde(default)]
    pub volume_percent: String,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub process_id: String,
}

impl AudioSession {
    /// Numeric volume in `[0, 100]`. Unparseable values read as `0`.
    pub fn volume_level(&self) -> f64 {
        parse_volume_percent(&self.volume_percent)
    }

    /// Overwrite the volume with a formatted percentage.
    pub fn set_volume_level(&mut self, level: f64) {
        self.volume_percent = format_volume_percent(level);
    }
}

/// Parse `"42.5%"` (or `"42.5"`) into `42.5`, clamped to `[0, 100]`.
pub fn parse_volume_percent(value: &str) -> f64 {
    value
        .trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(clamp_volume)
        .unwrap_or(0.0)
}

pub fn format_volume_percent(level: f64) -> String {
    format!("{:.1}%", clamp_volume(level))
}

pub fn clamp_volume(level: f64) -> f64 {
    if level.is_nan() {
        return 0.0;
    }
    level.clamp(0.0, 100.0)
}

/// What an HDR request asks the display to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HdrMode {
    On,
    Off,
    Toggle,
}

impl HdrMode {
    /// `enable` omitted means toggle.
    pub fn from_enable(enable: Option<bool>) -> Self {
        match enable {
            Some(true) => HdrMode::On,
            Some(false) => HdrMode::Off,
            None => HdrMode::Toggle,
        }
    }

    pub fn as_enable(self) -> Option<bool> {
        match self {
            HdrMode::On => Some(true),
            HdrMode::Off => Some(false),
            HdrMode::Toggle => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HdrMode::On => "on",
            HdrMode::Off => "off",
            HdrMode::Toggle => "toggle",
        }
    }
}

/// Sessions whose name is pinned, in session order.
pub fn pinned_sessions<'a>(
    sessions: &'a [AudioSession],
    pinned: &'a [String],
) -> impl Iterator<Item = &'a AudioSession> + 'a {
    sessions
        .iter()
        .filter(move |s| pinned.iter().any(|p| p == &s.name))
}
