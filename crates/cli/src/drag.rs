//! Drag-to-adjust volume.
//!
//! Horizontal pointer displacement maps linearly to a volume delta. Only the
//! release produces a value to send; every intermediate position is local.

use xeneon_protocol::{clamp_volume, AudioSession};

/// Percentage points per unit of horizontal displacement.
pub const DRAG_SENSITIVITY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeDrag {
    name: String,
    start_x: f64,
    start_level: f64,
    current_level: f64,
}

/// The single set-volume command a finished drag produces.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeCommit {
    pub app_name: String,
    pub level: f64,
}

impl VolumeDrag {
    pub fn begin(session: &AudioSession, x: f64) -> Self {
        let level = session.volume_level();
        Self {
            name: session.name.clone(),
            start_x: x,
            start_level: level,
            current_level: level,
        }
    }

    /// Track the pointer; returns the level to display.
    pub fn moved(&mut self, x: f64) -> f64 {
        let delta = (x - self.start_x) * DRAG_SENSITIVITY;
        self.current_level = clamp_volume(self.start_level + delta);
        self.current_level
    }

    /// End the drag. The committed level is rounded to a whole percent.
    pub fn release(self) -> VolumeCommit {
        VolumeCommit {
            app_name: self.name,
            level: self.current_level.round(),
        }
    }
}
