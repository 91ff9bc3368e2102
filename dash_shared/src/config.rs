//! Configuration system.
//!
//! Loads dashboard configuration from JSON strings/files (file IO left to app).
//! Every field has a default, so partial documents are accepted.

use serde::{Deserialize, Serialize};

use crate::{color::Color8, math::Vector3};

/// Channel the grab scripts announce grab/release on.
pub const DEFAULT_GRAB_CHANNEL: &str = "Hifi-Object-Manipulation";

/// Channel other scripts use to send window envelopes (e.g. `spawn_window`).
pub const DEFAULT_IPC_CHANNEL: &str = "dash.ipc";

/// Root configuration for the window manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    /// Window size in meters at a sensor-to-world scale of 1.
    pub window_dimensions: Vector3,
    /// Content surface DPI at a sensor-to-world scale of 1.
    pub window_dpi: f32,
    /// Frame cap for window content surfaces.
    pub window_max_fps: u32,
    /// Root content document every window loads; it hosts `source_url`.
    pub window_root_url: String,

    /// Half-width of the rail, in meters.
    pub rail_width: f32,
    /// How far the rail's middle bows away from its ends.
    pub rail_curvature: f32,
    /// Distance from the dashboard root to the rail ends.
    pub rail_distance: f32,
    /// Number of polyline vertices.
    pub rail_resolution: usize,
    pub rail_stroke_width: f32,
    pub rail_color: Color8,
    /// Rail animation progress per second.
    pub rail_anim_rate: f32,

    /// Length of the release-to-dock tween.
    pub dock_tween_ms: u64,
    /// Fallback delay before pushing initial window props.
    pub init_delay_ms: u64,

    pub grab_channel: String,
    pub ipc_channel: String,

    /// Tick rate for the `dashd` driver.
    pub tick_hz: u32,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            window_dimensions: Vector3::new(1.2, 0.8, 0.01),
            window_dpi: 20.0,
            window_max_fps: 90,
            window_root_url: "qrc:///qml/dash/WindowRoot.qml".to_string(),
            rail_width: 1.5,
            rail_curvature: 0.5,
            rail_distance: 1.0,
            rail_resolution: 32,
            rail_stroke_width: 0.003,
            rail_color: Color8::rgb(255, 192, 255),
            rail_anim_rate: 2.0,
            dock_tween_ms: 300,
            init_delay_ms: 100,
            grab_channel: DEFAULT_GRAB_CHANNEL.to_string(),
            ipc_channel: DEFAULT_IPC_CHANNEL.to_string(),
            tick_hz: 60,
        }
    }
}

impl DashConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Height at which docked windows sit, with their bottom edge just above
    /// the rail.
    pub fn dock_height(&self) -> f32 {
        self.window_dimensions.y / 2.0 + 0.01
    }

    pub fn dock_tween_secs(&self) -> f64 {
        self.dock_tween_ms as f64 / 1000.0
    }

    pub fn init_delay_secs(&self) -> f64 {
        self.init_delay_ms as f64 / 1000.0
    }
}
