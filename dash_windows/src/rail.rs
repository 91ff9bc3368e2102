//! The window rail: a shallow curved dock in front of the user.
//!
//! Rail space is the dashboard root's local space. The rail sits at
//! `z = -distance` and bows toward the user by up to `curvature` at its
//! center. A sample at normalized position `u ∈ [-1, 1]` is
//! `(u·width, 0, cos(u·π/2)·-curvature)` in the rail entity's own frame.

use std::f32::consts::FRAC_PI_2;

use dash_shared::{
    config::DashConfig,
    host::Pose,
    math::{clamp, easing, Vector3},
    quat::Quaternion,
};

/// Curve parameters and the dock slot height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RailGeometry {
    pub width: f32,
    pub curvature: f32,
    pub distance: f32,
    pub resolution: usize,
    pub dock_height: f32,
}

impl RailGeometry {
    pub fn from_config(cfg: &DashConfig) -> Self {
        Self {
            width: cfg.rail_width,
            curvature: cfg.rail_curvature,
            distance: cfg.rail_distance,
            resolution: cfg.rail_resolution,
            dock_height: cfg.dock_height(),
        }
    }

    /// Polyline vertices in the rail entity's frame, with x squeezed toward
    /// the center by `extent` (0 = collapsed, 1 = full width).
    pub fn points(&self, extent: f32) -> Vec<Vector3> {
        let last = self.resolution.saturating_sub(1).max(1) as f32;
        (0..self.resolution)
            .map(|i| {
                let u = (2.0 * (i as f32 / last) - 1.0) * extent;
                self.sample(u)
            })
            .collect()
    }

    /// Where a window spawns: centered on the rail at dock height.
    pub fn spawn_pose(&self) -> Pose {
        Pose::new(
            Vector3::new(0.0, self.dock_height, -(self.curvature + self.distance)),
            Quaternion::IDENTITY,
        )
    }

    /// Constrains a root-space position to the rail.
    ///
    /// The x offset picks the rail point (clamped to the rail's ends); y is
    /// pinned to dock height; yaw turns the window to face out from the
    /// curve.
    pub fn project(&self, position: Vector3) -> Pose {
        let u = if self.width.abs() < f32::EPSILON {
            0.0
        } else {
            clamp(position.x / self.width, -1.0, 1.0)
        };

        let on_rail = self.sample(u);
        let yaw = -(u * FRAC_PI_2).sin() * FRAC_PI_2 * self.curvature;

        Pose::new(
            Vector3::new(on_rail.x, self.dock_height, on_rail.z - self.distance),
            Quaternion::from_pitch_yaw_roll_radians(0.0, yaw, 0.0),
        )
    }

    fn sample(&self, u: f32) -> Vector3 {
        Vector3::new(u * self.width, 0.0, (u * FRAC_PI_2).cos() * -self.curvature)
    }
}

/// What the rail entity should look like after a step.
#[derive(Debug, Clone, PartialEq)]
pub struct RailFrame {
    pub points: Vec<Vector3>,
    pub visible: bool,
}

/// Reveal/retract animation.
#[derive(Debug, Clone, PartialEq)]
pub struct RailAnimation {
    progress: f32,
    retracting: bool,
    rate: f32,
    /// Retraction finished but the rail stays up for one more step.
    lingering: bool,
}

impl RailAnimation {
    /// Starts fully retracted and at rest.
    pub fn new(rate: f32) -> Self {
        Self {
            progress: 1.0,
            retracting: true,
            rate,
            lingering: false,
        }
    }

    /// Restarts toward extended (`retract == false`) or retracted.
    pub fn start(&mut self, retract: bool) {
        self.retracting = retract;
        self.progress = 0.0;
        self.lingering = false;
    }

    pub fn is_retracting(&self) -> bool {
        self.retracting
    }

    /// Time through the current transition, `0..=1`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Fraction of the full width shown, 0 = retracted, 1 = extended.
    pub fn extent(&self) -> f32 {
        if self.retracting {
            easing::ease_in_cubic(1.0 - self.progress)
        } else {
            easing::ease_out_cubic(self.progress)
        }
    }

    /// Nothing left to animate.
    pub fn is_idle(&self) -> bool {
        self.progress >= 1.0 && !self.lingering
    }

    /// Advances by `dt` seconds. Returns `None` when there is nothing to
    /// update on the rail entity.
    pub fn advance(&mut self, geometry: &RailGeometry, dt: f32) -> Option<RailFrame> {
        if self.lingering {
            self.lingering = false;
            return Some(RailFrame {
                points: geometry.points(self.extent()),
                visible: false,
            });
        }
        if self.progress >= 1.0 {
            return None;
        }

        self.progress = (self.progress + dt * self.rate).min(1.0);
        if self.retracting && self.progress >= 1.0 {
            self.lingering = true;
        }

        Some(RailFrame {
            points: geometry.points(self.extent()),
            visible: true,
        })
    }
}
