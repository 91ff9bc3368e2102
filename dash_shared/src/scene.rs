//! Headless entity host.
//!
//! [`Scene`] implements [`EntityHost`] over an [`ecs::World`]. It has no
//! renderer; it keeps entity properties as components and records script
//! events and deletions on an [`EventBus`] so drivers and tests can see what
//! the window manager asked for.

use tracing::{debug, trace};

use crate::{
    ecs::{EntityId, World},
    event::{EventBus, HostSignal, SignalRegistry, SubscriptionId},
    host::{EntityEdit, EntityHost, EntityKind, EntitySpec, Pose, PolyLine, WebSurface},
};

/// Name and hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    pub name: String,
    pub parent: Option<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Presentation {
    pub visible: bool,
    pub ignore_pick_intersection: bool,
    pub grabbable: bool,
}

/// A string sent to an entity's content surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptEvent {
    pub entity: EntityId,
    pub payload: String,
}

/// An entity was deleted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityDeleted(pub EntityId);

/// In-memory scene.
pub struct Scene {
    world: World,
    events: EventBus,
    signals: SignalRegistry,
    sensor_to_world_scale: f32,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            world: World::default(),
            events: EventBus::default(),
            signals: SignalRegistry::default(),
            sensor_to_world_scale: 1.0,
        }
    }

    /// Creates a bare transform node other entities can be parented to.
    pub fn spawn_anchor(&mut self, name: &str) -> EntityId {
        let id = self.world.spawn();
        self.world.insert(
            id,
            Meta {
                name: name.to_string(),
                parent: None,
            },
        );
        self.world.insert(id, Pose::default());
        id
    }

    pub fn set_sensor_to_world_scale(&mut self, scale: f32) {
        self.sensor_to_world_scale = scale;
    }

    /// Moves an entity as an outside actor would (e.g. a hand grab).
    pub fn set_local_pose(&mut self, id: EntityId, pose: Pose) {
        if let Some(p) = self.world.get_mut::<Pose>(id) {
            *p = pose;
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.world.contains(id)
    }

    pub fn entity_count(&self) -> usize {
        self.world.len()
    }

    pub fn meta(&self, id: EntityId) -> Option<&Meta> {
        self.world.get::<Meta>(id)
    }

    pub fn presentation(&self, id: EntityId) -> Option<Presentation> {
        self.world.get::<Presentation>(id).copied()
    }

    pub fn web(&self, id: EntityId) -> Option<&WebSurface> {
        self.world.get::<WebSurface>(id)
    }

    pub fn line(&self, id: EntityId) -> Option<&PolyLine> {
        self.world.get::<PolyLine>(id)
    }

    /// Entities whose name matches exactly.
    pub fn find_by_name(&self, name: &str) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .world
            .iter::<Meta>()
            .filter(|(_, m)| m.name == name)
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids
    }

    pub fn signals(&self) -> &SignalRegistry {
        &self.signals
    }

    pub fn script_events(&self) -> &[ScriptEvent] {
        self.events.peek::<ScriptEvent>()
    }

    pub fn drain_script_events(&mut self) -> Vec<ScriptEvent> {
        self.events.drain::<ScriptEvent>()
    }

    pub fn drain_deleted(&mut self) -> Vec<EntityDeleted> {
        self.events.drain::<EntityDeleted>()
    }
}

impl EntityHost for Scene {
    fn add_entity(&mut self, spec: EntitySpec) -> EntityId {
        let id = self.world.spawn();
        debug!(id = %id, name = %spec.name, "Entity added");

        self.world.insert(
            id,
            Meta {
                name: spec.name,
                parent: spec.parent,
            },
        );
        self.world.insert(id, spec.pose);
        self.world.insert(
            id,
            Presentation {
                visible: spec.visible,
                ignore_pick_intersection: false,
                grabbable: spec.grabbable,
            },
        );
        match spec.kind {
            EntityKind::Web(web) => self.world.insert(id, web),
            EntityKind::PolyLine(line) => self.world.insert(id, line),
        }
        id
    }

    fn edit_entity(&mut self, id: EntityId, edit: EntityEdit) {
        if !self.world.contains(id) {
            debug!(id = %id, "Edit for missing entity ignored");
            return;
        }

        if let Some(pose) = self.world.get_mut::<Pose>(id) {
            if let Some(position) = edit.position {
                pose.position = position;
            }
            if let Some(rotation) = edit.rotation {
                pose.rotation = rotation;
            }
        }
        if let Some(p) = self.world.get_mut::<Presentation>(id) {
            if let Some(visible) = edit.visible {
                p.visible = visible;
            }
            if let Some(ignore) = edit.ignore_pick_intersection {
                p.ignore_pick_intersection = ignore;
            }
            if let Some(grabbable) = edit.grabbable {
                p.grabbable = grabbable;
            }
        }
        if let Some(web) = self.world.get_mut::<WebSurface>(id) {
            if let Some(dimensions) = edit.dimensions {
                web.dimensions = dimensions;
            }
            if let Some(dpi) = edit.dpi {
                web.dpi = dpi;
            }
        }
        if let (Some(line), Some(points)) = (self.world.get_mut::<PolyLine>(id), edit.line_points)
        {
            line.points = points;
        }
    }

    fn delete_entity(&mut self, id: EntityId) {
        if self.world.despawn(id) {
            debug!(id = %id, "Entity deleted");
            self.events.push(EntityDeleted(id));
        } else {
            debug!(id = %id, "Delete for missing entity ignored");
        }
    }

    fn local_pose(&self, id: EntityId) -> Option<Pose> {
        self.world.get::<Pose>(id).copied()
    }

    fn emit_script_event(&mut self, id: EntityId, payload: &str) {
        trace!(id = %id, payload, "Script event");
        self.events.push(ScriptEvent {
            entity: id,
            payload: payload.to_string(),
        });
    }

    fn sensor_to_world_scale(&self) -> f32 {
        self.sensor_to_world_scale
    }

    fn connect(&mut self, signal: HostSignal) -> SubscriptionId {
        self.signals.connect(signal)
    }

    fn disconnect(&mut self, id: SubscriptionId) {
        if !self.signals.disconnect(id) {
            debug!(?id, "Disconnect for unknown subscription");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{color::Color8, math::Vector3, quat::Quaternion};

    fn line_spec() -> EntitySpec {
        EntitySpec {
            name: "line".into(),
            parent: None,
            pose: Pose::default(),
            visible: false,
            grabbable: false,
            kind: EntityKind::PolyLine(PolyLine {
                points: vec![Vector3::ZERO],
                normals: vec![Vector3::BACKWARD],
                stroke_widths: vec![0.01],
                color: Color8::WHITE,
                face_camera: true,
            }),
        }
    }

    #[test]
    fn edits_apply_to_matching_components() {
        let mut scene = Scene::new();
        let id = scene.add_entity(line_spec());

        let points = vec![Vector3::LEFT, Vector3::RIGHT];
        scene.edit_entity(
            id,
            EntityEdit {
                visible: Some(true),
                dpi: Some(3.0),
                line_points: Some(points.clone()),
                rotation: Some(Quaternion::from_axis_angle_degrees(Vector3::UP, 10.0)),
                ..EntityEdit::default()
            },
        );

        assert!(scene.presentation(id).is_some_and(|p| p.visible));
        assert_eq!(scene.line(id).map(|l| &l.points), Some(&points));
        assert!(scene.web(id).is_none());
        assert!(scene.local_pose(id).is_some_and(|p| p.rotation != Quaternion::IDENTITY));
    }

    #[test]
    fn delete_is_recorded_once() {
        let mut scene = Scene::new();
        let id = scene.add_entity(line_spec());
        scene.delete_entity(id);
        scene.delete_entity(id);
        assert_eq!(scene.drain_deleted(), vec![EntityDeleted(id)]);
        assert!(scene.local_pose(id).is_none());
    }

    #[test]
    fn script_events_are_recorded() {
        let mut scene = Scene::new();
        let id = scene.spawn_anchor("root");
        scene.emit_script_event(id, "hello");
        assert_eq!(scene.script_events().len(), 1);
        assert_eq!(scene.drain_script_events()[0].payload, "hello");
        assert!(scene.script_events().is_empty());
    }
}
