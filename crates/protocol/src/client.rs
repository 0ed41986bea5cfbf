//! Client → Agent request bodies

use serde::{Deserialize, Serialize};

use crate::types::HdrMode;

/// `POST /api/system/hdr`. `enable` omitted = toggle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HdrRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
}

impl HdrRequest {
    pub fn mode(&self) -> HdrMode {
        HdrMode::from_enable(self.enable)
    }
}

impl From<HdrMode> for HdrRequest {
    fn from(mode: HdrMode) -> Self {
        Self {
            enable: mode.as_enable(),
        }
    }
}

/// `POST /api/audio/mute`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuteRequest {
    pub app_name: String,
    pub mute: bool,
}

/// `POST /api/audio/volume`. `level` is a percentage in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeRequest {
    pub app_name: String,
    pub level: f64,
}

/// `POST /api/config/pinned-apps`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PinnedAppsRequest {
    pub apps: Vec<String>,
}
