//! Entity host abstraction.
//!
//! The window manager never owns a scene graph. It creates, edits, and deletes
//! entities through [`EntityHost`], which a real engine binding or the
//! headless [`crate::scene::Scene`] implements.

use serde::{Deserialize, Serialize};

use crate::{
    color::Color8,
    ecs::EntityId,
    event::{HostSignal, SubscriptionId},
    math::Vector3,
    quat::Quaternion,
};

/// Parent-relative position and rotation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3,
    pub rotation: Quaternion,
}

impl Pose {
    pub const fn new(position: Vector3, rotation: Quaternion) -> Self {
        Self { position, rotation }
    }
}

/// Properties of a web/QML content surface entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSurface {
    pub source_url: String,
    pub dimensions: Vector3,
    pub dpi: f32,
    pub max_fps: u32,
    pub wants_keyboard_focus: bool,
}

/// Properties of a polyline entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolyLine {
    pub points: Vec<Vector3>,
    pub normals: Vec<Vector3>,
    pub stroke_widths: Vec<f32>,
    pub color: Color8,
    pub face_camera: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Web(WebSurface),
    PolyLine(PolyLine),
}

/// Everything needed to create a local, non-colliding, non-shadowing entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub name: String,
    pub parent: Option<EntityId>,
    pub pose: Pose,
    pub visible: bool,
    pub grabbable: bool,
    pub kind: EntityKind,
}

/// Partial property edit. `None` leaves a property untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityEdit {
    pub position: Option<Vector3>,
    pub rotation: Option<Quaternion>,
    pub dimensions: Option<Vector3>,
    pub dpi: Option<f32>,
    pub visible: Option<bool>,
    pub ignore_pick_intersection: Option<bool>,
    pub grabbable: Option<bool>,
    pub line_points: Option<Vec<Vector3>>,
}

impl EntityEdit {
    pub fn pose(pose: Pose) -> Self {
        Self {
            position: Some(pose.position),
            rotation: Some(pose.rotation),
            ..Self::default()
        }
    }

    pub fn visible(visible: bool) -> Self {
        Self {
            visible: Some(visible),
            ..Self::default()
        }
    }
}

/// Entity/scene services a window manager depends on.
pub trait EntityHost {
    fn add_entity(&mut self, spec: EntitySpec) -> EntityId;
    fn edit_entity(&mut self, id: EntityId, edit: EntityEdit);
    fn delete_entity(&mut self, id: EntityId);
    /// Current parent-relative pose, or `None` if the entity is gone.
    fn local_pose(&self, id: EntityId) -> Option<Pose>;
    /// Sends a string to the entity's content surface.
    fn emit_script_event(&mut self, id: EntityId, payload: &str);
    fn sensor_to_world_scale(&self) -> f32;
    fn connect(&mut self, signal: HostSignal) -> SubscriptionId;
    fn disconnect(&mut self, id: SubscriptionId);
}
