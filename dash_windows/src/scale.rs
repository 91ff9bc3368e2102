//! Sensor-to-world scale compatibility shim.
//!
//! Web entity dimensions are applied after the avatar's sensor-to-world scale
//! rather than before it, and DPI does not follow that scale at all. Window
//! code asks a [`ScaleShim`] for entity-space values instead of doing scale
//! arithmetic itself, so the shim can be swapped for [`IdentityScale`] once
//! the host scales web entities correctly.

use dash_shared::math::Vector3;

/// Converts nominal window units into what the host must be told.
pub trait ScaleShim: Send + Sync {
    /// Dimensions to write for a window of nominal size `base`.
    fn dimensions(&self, base: Vector3, sensor_to_world_scale: f32) -> Vector3;
    /// DPI to write for a window of nominal DPI `base`.
    fn dpi(&self, base: f32, sensor_to_world_scale: f32) -> f32;
}

/// Compensates for the host's post-scale dimensions and unscaled DPI.
#[derive(Debug, Default, Clone, Copy)]
pub struct SensorScaleShim;

impl ScaleShim for SensorScaleShim {
    fn dimensions(&self, base: Vector3, sensor_to_world_scale: f32) -> Vector3 {
        base * sensor_to_world_scale
    }

    fn dpi(&self, base: f32, sensor_to_world_scale: f32) -> f32 {
        if sensor_to_world_scale.abs() < f32::EPSILON {
            return base;
        }
        base / sensor_to_world_scale
    }
}

/// Passes values through for hosts that scale web entities themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityScale;

impl ScaleShim for IdentityScale {
    fn dimensions(&self, base: Vector3, _sensor_to_world_scale: f32) -> Vector3 {
        base
    }

    fn dpi(&self, base: f32, _sensor_to_world_scale: f32) -> f32 {
        base
    }
}
