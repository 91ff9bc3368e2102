//! Dashboard windows.
//!
//! A [`DashWindow`] owns one web entity and is the only thing that writes its
//! presentation state. Side effects are explicit: every mutator takes the
//! host it writes through and documents what it pushes.
//!
//! Visibility is computed, not stored:
//! `effectively_hidden = hidden || (hidden_override && !pinned)`.
//! Going hidden makes the entity non-interactive immediately but leaves it
//! visible until the content surface acks `finished_hiding`, so its fade-out
//! can finish.

use dash_shared::{
    ecs::EntityId,
    host::{EntityEdit, EntityHost, EntityKind, EntitySpec, Pose, WebSurface},
    math::{easing, Vector3},
    protocol::{encode_outbound, OutboundEvent, SetProps},
};
use tracing::{debug, warn};

use crate::scale::ScaleShim;

bitflags::bitflags! {
    /// Per-window state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WindowFlags: u8 {
        const PINNABLE = 1 << 0;
        const PINNED = 1 << 1;
        const HIDDEN = 1 << 2;
        const HIDDEN_OVERRIDE = 1 << 3;
        const GRABBED = 1 << 4;
        const INITIALIZED = 1 << 5;
        const CLOSING = 1 << 6;
    }
}

/// Where a window is in its lifecycle, as the manager sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    DockedVisible,
    DockedHidden,
    /// Pinned; left wherever it was put.
    FreeFloating,
    Grabbed,
    /// Asked to close; waiting for `finished_closing`.
    Closing,
}

/// Window operation errors. These are programming errors, not runtime
/// conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    AlreadyInitialized(EntityId),
}

impl std::fmt::Display for WindowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowError::AlreadyInitialized(id) => {
                write!(f, "window {id} has already been initialized")
            }
        }
    }
}

impl std::error::Error for WindowError {}

/// What a new window needs.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowParams {
    pub source_url: String,
    pub title: String,
    pub pinnable: bool,
    pub parent: Option<EntityId>,
    pub pose: Pose,
    /// Nominal size at a sensor-to-world scale of 1.
    pub dimensions: Vector3,
    /// Nominal DPI at a sensor-to-world scale of 1.
    pub dpi: f32,
    pub max_fps: u32,
    /// Root content document that hosts `source_url`.
    pub root_url: String,
}

/// One floating panel.
#[derive(Debug)]
pub struct DashWindow {
    entity: EntityId,
    source_url: String,
    title: String,
    flags: WindowFlags,

    base_dimensions: Vector3,
    base_dpi: f32,

    desired: Pose,
    release: Pose,
    release_time: f64,
    /// Docking tween has reached `desired`.
    settled: bool,
}

impl DashWindow {
    /// Creates the backing entity. Initial props are not pushed here; the
    /// manager pushes them once the content surface is ready.
    pub fn create(host: &mut dyn EntityHost, shim: &dyn ScaleShim, params: WindowParams, now: f64) -> Self {
        let scale = host.sensor_to_world_scale();

        let entity = host.add_entity(EntitySpec {
            name: format!("DashWindow: {}", params.title),
            parent: params.parent,
            pose: params.pose,
            visible: true,
            grabbable: false,
            kind: EntityKind::Web(WebSurface {
                source_url: params.root_url,
                dimensions: shim.dimensions(params.dimensions, scale),
                dpi: shim.dpi(params.dpi, scale),
                max_fps: params.max_fps,
                wants_keyboard_focus: true,
            }),
        });

        let mut flags = WindowFlags::empty();
        flags.set(WindowFlags::PINNABLE, params.pinnable);

        debug!(entity = %entity, title = %params.title, "Window created");

        Self {
            entity,
            source_url: params.source_url,
            title: params.title,
            flags,
            base_dimensions: params.dimensions,
            base_dpi: params.dpi,
            desired: params.pose,
            release: params.pose,
            release_time: now,
            settled: true,
        }
    }

    /// The backing web entity.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn flags(&self) -> WindowFlags {
        self.flags
    }

    pub fn is_pinnable(&self) -> bool {
        self.flags.contains(WindowFlags::PINNABLE)
    }

    pub fn is_pinned(&self) -> bool {
        self.flags.contains(WindowFlags::PINNED)
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.contains(WindowFlags::HIDDEN)
    }

    pub fn hidden_override(&self) -> bool {
        self.flags.contains(WindowFlags::HIDDEN_OVERRIDE)
    }

    pub fn is_grabbed(&self) -> bool {
        self.flags.contains(WindowFlags::GRABBED)
    }

    /// Whether the content surface has received its initial props.
    pub fn is_initialized(&self) -> bool {
        self.flags.contains(WindowFlags::INITIALIZED)
    }

    pub fn is_closing(&self) -> bool {
        self.flags.contains(WindowFlags::CLOSING)
    }

    pub fn effectively_hidden(&self) -> bool {
        self.is_hidden() || (self.hidden_override() && !self.is_pinned())
    }

    pub fn state(&self) -> WindowState {
        if self.is_closing() {
            WindowState::Closing
        } else if self.is_grabbed() {
            WindowState::Grabbed
        } else if self.is_pinned() {
            WindowState::FreeFloating
        } else if self.effectively_hidden() {
            WindowState::DockedHidden
        } else {
            WindowState::DockedVisible
        }
    }

    /// Pose the docking animation is driving toward.
    pub fn desired_pose(&self) -> Pose {
        self.desired
    }

    pub fn set_desired_pose(&mut self, pose: Pose) {
        self.desired = pose;
    }

    /// Pose captured when the window was last released or unpinned.
    pub fn release_pose(&self) -> Pose {
        self.release
    }

    pub fn release_time(&self) -> f64 {
        self.release_time
    }

    /// Updates the content URL and pushes `set_props { source_url }`.
    pub fn set_source_url(&mut self, host: &mut dyn EntityHost, url: impl Into<String>) {
        self.source_url = url.into();
        self.push_props(
            host,
            SetProps {
                source_url: Some(self.source_url.clone()),
                ..SetProps::default()
            },
        );
    }

    /// Updates the title and pushes `set_props { title }`.
    pub fn set_title(&mut self, host: &mut dyn EntityHost, title: impl Into<String>) {
        self.title = title.into();
        self.push_props(
            host,
            SetProps {
                title: Some(self.title.clone()),
                ..SetProps::default()
            },
        );
    }

    /// Pushes `set_props { pinnable }`. Clearing pinnability also unpins.
    pub fn set_pinnable(&mut self, host: &mut dyn EntityHost, pinnable: bool, now: f64) {
        self.flags.set(WindowFlags::PINNABLE, pinnable);
        self.push_props(
            host,
            SetProps {
                pinnable: Some(pinnable),
                ..SetProps::default()
            },
        );
        if !pinnable && self.is_pinned() {
            self.set_pinned(host, false, now);
        }
    }

    /// Pins or unpins. Coerced to unpinned when the window is not pinnable.
    ///
    /// Unpinning re-applies visibility (the dock may be hidden) and captures
    /// the current pose as the start of a docking tween.
    pub fn set_pinned(&mut self, host: &mut dyn EntityHost, pinned: bool, now: f64) {
        let was_pinned = self.is_pinned();
        let was_hidden = self.effectively_hidden();

        let pinned = pinned && self.is_pinnable();
        self.flags.set(WindowFlags::PINNED, pinned);

        if was_pinned && !self.is_pinned() {
            self.apply_visibility(host);
            self.capture_release(host, now);
        } else if was_hidden != self.effectively_hidden() {
            self.apply_visibility(host);
        }
    }

    /// Sets the explicit hidden flag and re-applies visibility.
    pub fn set_hidden(&mut self, host: &mut dyn EntityHost, hidden: bool) {
        self.flags.set(WindowFlags::HIDDEN, hidden);
        self.apply_visibility(host);
    }

    /// Sets the dock-wide hide flag and re-applies visibility. Pinned windows
    /// ignore it.
    pub fn set_hidden_override(&mut self, host: &mut dyn EntityHost, hidden: bool) {
        self.flags.set(WindowFlags::HIDDEN_OVERRIDE, hidden);
        self.apply_visibility(host);
    }

    /// Marks the window held or released.
    ///
    /// Release captures the entity's current pose as the docking tween start.
    /// Both edges reset dimensions and DPI, since host grabs disturb them.
    pub fn set_grabbed(&mut self, host: &mut dyn EntityHost, shim: &dyn ScaleShim, grabbed: bool, now: f64) {
        self.flags.set(WindowFlags::GRABBED, grabbed);

        if !grabbed {
            self.capture_release(host, now);
        }

        self.refresh_scale(host, shim);
        self.push_props(
            host,
            SetProps {
                grabbed: Some(grabbed),
                ..SetProps::default()
            },
        );
    }

    pub fn set_grabbable(&mut self, host: &mut dyn EntityHost, grabbable: bool) {
        host.edit_entity(
            self.entity,
            EntityEdit {
                grabbable: Some(grabbable),
                ..EntityEdit::default()
            },
        );
    }

    /// Records that the content surface has its initial props.
    pub fn mark_initialized(&mut self) -> Result<(), WindowError> {
        if self.is_initialized() {
            return Err(WindowError::AlreadyInitialized(self.entity));
        }
        self.flags.insert(WindowFlags::INITIALIZED);
        Ok(())
    }

    /// Pushes title and source URL, plus pinnability when `with_pinnable`.
    pub fn push_initial_props(&self, host: &mut dyn EntityHost, with_pinnable: bool) {
        self.push_props(
            host,
            SetProps {
                title: Some(self.title.clone()),
                source_url: Some(self.source_url.clone()),
                pinnable: with_pinnable.then_some(self.is_pinnable()),
                grabbed: None,
            },
        );
    }

    pub fn focus(&self, host: &mut dyn EntityHost) {
        self.push_window_event(host, &OutboundEvent::Focus);
    }

    pub fn unfocus(&self, host: &mut dyn EntityHost) {
        self.push_window_event(host, &OutboundEvent::Unfocus);
    }

    /// Asks the content surface to close. The window stays live until it
    /// acks with `finished_closing`.
    pub fn request_close(&mut self, host: &mut dyn EntityHost) {
        if self.is_closing() {
            return;
        }
        self.flags.insert(WindowFlags::CLOSING);
        self.push_window_event(host, &OutboundEvent::Close);
    }

    /// Rewrites dimensions and DPI for the current sensor-to-world scale.
    pub fn refresh_scale(&self, host: &mut dyn EntityHost, shim: &dyn ScaleShim) {
        let scale = host.sensor_to_world_scale();
        host.edit_entity(
            self.entity,
            EntityEdit {
                dimensions: Some(shim.dimensions(self.base_dimensions, scale)),
                dpi: Some(shim.dpi(self.base_dpi, scale)),
                ..EntityEdit::default()
            },
        );
    }

    /// Completes a deferred hide once the fade-out finished.
    pub fn finish_hiding(&self, host: &mut dyn EntityHost) {
        if self.effectively_hidden() {
            host.edit_entity(self.entity, EntityEdit::visible(false));
        } else {
            debug!(entity = %self.entity, "Hide ack for a visible window ignored");
        }
    }

    /// Sets the desired pose and moves the entity there at once.
    pub fn snap_to(&mut self, host: &mut dyn EntityHost, pose: Pose) {
        self.desired = pose;
        host.edit_entity(self.entity, EntityEdit::pose(pose));
    }

    /// Steps the release-to-dock tween. No-op once settled.
    pub fn advance_docking(&mut self, host: &mut dyn EntityHost, now: f64, tween_secs: f64) {
        if self.settled {
            return;
        }

        let alpha = if tween_secs <= 0.0 {
            1.0
        } else {
            ((now - self.release_time) / tween_secs).clamp(0.0, 1.0) as f32
        };
        let eased = easing::ease_out_quad(alpha);

        let position = self.release.position.lerp(self.desired.position, eased);
        let rotation = self
            .release
            .rotation
            .slerp(self.desired.rotation, eased)
            .try_normalized()
            .unwrap_or(self.desired.rotation);

        host.edit_entity(self.entity, EntityEdit::pose(Pose::new(position, rotation)));

        if alpha >= 1.0 {
            self.settled = true;
        }
    }

    /// Sends an envelope to the content surface. The only outbound channel.
    pub fn push_window_event(&self, host: &mut dyn EntityHost, event: &OutboundEvent) {
        match encode_outbound(event) {
            Ok(payload) => host.emit_script_event(self.entity, &payload),
            Err(e) => warn!(entity = %self.entity, error = %e, "Dropping window event"),
        }
    }

    /// Destroys the backing entity. Consumes the window, so it can only
    /// happen once.
    pub fn dispose(self, host: &mut dyn EntityHost) {
        debug!(entity = %self.entity, title = %self.title, "Window disposed");
        host.delete_entity(self.entity);
    }

    fn push_props(&self, host: &mut dyn EntityHost, props: SetProps) {
        self.push_window_event(host, &OutboundEvent::SetProps(props));
    }

    fn apply_visibility(&self, host: &mut dyn EntityHost) {
        if self.effectively_hidden() {
            // `visible` flips on the `finished_hiding` ack.
            host.edit_entity(
                self.entity,
                EntityEdit {
                    ignore_pick_intersection: Some(true),
                    ..EntityEdit::default()
                },
            );
            self.push_window_event(host, &OutboundEvent::Hide);
        } else {
            host.edit_entity(
                self.entity,
                EntityEdit {
                    visible: Some(true),
                    ignore_pick_intersection: Some(false),
                    ..EntityEdit::default()
                },
            );
            self.push_window_event(host, &OutboundEvent::Unhide);
        }
    }

    fn capture_release(&mut self, host: &dyn EntityHost, now: f64) {
        self.release = host.local_pose(self.entity).unwrap_or(self.desired);
        self.release_time = now;
        self.settled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::SensorScaleShim;
    use dash_shared::{protocol::decode_outbound, quat::Quaternion, scene::Scene};

    fn params(pinnable: bool) -> WindowParams {
        WindowParams {
            source_url: "qml:foo".into(),
            title: "Foo".into(),
            pinnable,
            parent: None,
            pose: Pose::new(Vector3::new(0.0, 0.41, -1.5), Quaternion::IDENTITY),
            dimensions: Vector3::new(1.2, 0.8, 0.01),
            dpi: 20.0,
            max_fps: 90,
            root_url: "root.qml".into(),
        }
    }

    fn outbound(scene: &mut Scene) -> Vec<OutboundEvent> {
        scene
            .drain_script_events()
            .into_iter()
            .filter_map(|e| decode_outbound(&e.payload).ok())
            .collect()
    }

    #[test]
    fn create_applies_scale_shim() {
        let mut scene = Scene::new();
        scene.set_sensor_to_world_scale(2.0);
        let w = DashWindow::create(&mut scene, &SensorScaleShim, params(true), 0.0);

        let web = scene.web(w.entity()).cloned().unwrap();
        assert_eq!(web.dimensions, Vector3::new(2.4, 1.6, 0.02));
        assert_eq!(web.dpi, 10.0);
        assert!(!w.is_initialized());
        assert!(scene.script_events().is_empty());
    }

    #[test]
    fn non_pinnable_window_never_pins() {
        let mut scene = Scene::new();
        let mut w = DashWindow::create(&mut scene, &SensorScaleShim, params(false), 0.0);
        w.set_pinned(&mut scene, true, 0.0);
        assert!(!w.is_pinned());
    }

    #[test]
    fn clearing_pinnable_unpins() {
        let mut scene = Scene::new();
        let mut w = DashWindow::create(&mut scene, &SensorScaleShim, params(true), 0.0);
        w.set_pinned(&mut scene, true, 0.0);
        assert!(w.is_pinned());
        w.set_pinnable(&mut scene, false, 0.0);
        assert!(!w.is_pinned());
    }

    #[test]
    fn hidden_override_yields_to_pinning() {
        let mut scene = Scene::new();
        let mut w = DashWindow::create(&mut scene, &SensorScaleShim, params(true), 0.0);

        w.set_hidden_override(&mut scene, true);
        assert!(w.effectively_hidden());
        assert_eq!(w.state(), WindowState::DockedHidden);

        w.set_pinned(&mut scene, true, 0.0);
        assert!(!w.effectively_hidden());
        assert_eq!(w.state(), WindowState::FreeFloating);

        w.set_hidden(&mut scene, true);
        assert!(w.effectively_hidden());
    }

    #[test]
    fn hiding_defers_invisibility_until_ack() {
        let mut scene = Scene::new();
        let mut w = DashWindow::create(&mut scene, &SensorScaleShim, params(true), 0.0);

        w.set_hidden(&mut scene, true);
        let p = scene.presentation(w.entity()).unwrap();
        assert!(p.visible);
        assert!(p.ignore_pick_intersection);
        assert_eq!(outbound(&mut scene), vec![OutboundEvent::Hide]);

        w.finish_hiding(&mut scene);
        assert!(!scene.presentation(w.entity()).unwrap().visible);

        w.set_hidden(&mut scene, false);
        let p = scene.presentation(w.entity()).unwrap();
        assert!(p.visible && !p.ignore_pick_intersection);
        assert_eq!(outbound(&mut scene), vec![OutboundEvent::Unhide]);
    }

    #[test]
    fn release_captures_entity_pose() {
        let mut scene = Scene::new();
        let mut w = DashWindow::create(&mut scene, &SensorScaleShim, params(true), 0.0);
        w.set_grabbed(&mut scene, &SensorScaleShim, true, 0.5);

        let held = Pose::new(
            Vector3::new(0.3, 0.9, -1.1),
            Quaternion::from_pitch_yaw_roll_degrees(0.0, 25.0, 0.0),
        );
        scene.set_local_pose(w.entity(), held);
        w.set_grabbed(&mut scene, &SensorScaleShim, false, 1.25);

        assert_eq!(w.release_pose(), held);
        assert_eq!(w.release_time(), 1.25);

        // Moving the entity afterwards does not touch the captured pose.
        scene.set_local_pose(w.entity(), Pose::default());
        assert_eq!(w.release_pose(), held);
    }

    #[test]
    fn grab_pushes_grabbed_prop() {
        let mut scene = Scene::new();
        let mut w = DashWindow::create(&mut scene, &SensorScaleShim, params(true), 0.0);
        w.set_grabbed(&mut scene, &SensorScaleShim, true, 0.0);
        assert_eq!(
            outbound(&mut scene),
            vec![OutboundEvent::SetProps(SetProps {
                grabbed: Some(true),
                ..SetProps::default()
            })]
        );
    }

    #[test]
    fn title_and_url_push_only_what_changed() {
        let mut scene = Scene::new();
        let mut w = DashWindow::create(&mut scene, &SensorScaleShim, params(true), 0.0);
        w.set_title(&mut scene, "Bar");
        w.set_source_url(&mut scene, "qml:bar");
        assert_eq!(w.title(), "Bar");
        assert_eq!(
            outbound(&mut scene),
            vec![
                OutboundEvent::SetProps(SetProps {
                    title: Some("Bar".into()),
                    ..SetProps::default()
                }),
                OutboundEvent::SetProps(SetProps {
                    source_url: Some("qml:bar".into()),
                    ..SetProps::default()
                }),
            ]
        );
    }

    #[test]
    fn close_request_is_sent_once() {
        let mut scene = Scene::new();
        let mut w = DashWindow::create(&mut scene, &SensorScaleShim, params(true), 0.0);
        w.request_close(&mut scene);
        w.request_close(&mut scene);
        assert_eq!(outbound(&mut scene), vec![OutboundEvent::Close]);
        assert_eq!(w.state(), WindowState::Closing);
    }

    #[test]
    fn double_initialize_is_an_error() {
        let mut scene = Scene::new();
        let mut w = DashWindow::create(&mut scene, &SensorScaleShim, params(true), 0.0);
        assert!(w.mark_initialized().is_ok());
        assert_eq!(
            w.mark_initialized(),
            Err(WindowError::AlreadyInitialized(w.entity()))
        );
    }

    #[test]
    fn docking_tween_eases_to_desired() {
        let mut scene = Scene::new();
        let mut w = DashWindow::create(&mut scene, &SensorScaleShim, params(true), 0.0);
        let desired = w.desired_pose();

        let start = Pose::new(desired.position + Vector3::new(1.0, 0.0, 0.0), desired.rotation);
        scene.set_local_pose(w.entity(), start);
        w.set_grabbed(&mut scene, &SensorScaleShim, true, 0.0);
        w.set_grabbed(&mut scene, &SensorScaleShim, false, 0.0);

        w.advance_docking(&mut scene, 0.15, 0.3);
        let mid = scene.local_pose(w.entity()).unwrap();
        // ease-out quad at t = 0.5 covers 75% of the way
        assert!((mid.position.x - 0.25).abs() < 1e-4);

        w.advance_docking(&mut scene, 0.3, 0.3);
        let end = scene.local_pose(w.entity()).unwrap();
        assert!(end.position.approx_eq(desired.position));
    }

    #[test]
    fn docking_tween_from_flipped_rotation_stays_finite() {
        let mut scene = Scene::new();
        let mut w = DashWindow::create(&mut scene, &SensorScaleShim, params(true), 0.0);
        let target = Pose::new(
            Vector3::new(0.5, 0.41, -1.4),
            Quaternion::from_pitch_yaw_roll_degrees(0.0, -20.0, 0.0),
        );
        w.set_desired_pose(target);

        // Same orientation, opposite sign.
        scene.set_local_pose(w.entity(), Pose::new(Vector3::ZERO, -target.rotation));
        w.set_grabbed(&mut scene, &SensorScaleShim, true, 0.0);
        w.set_grabbed(&mut scene, &SensorScaleShim, false, 0.0);

        for now in [0.05, 0.15, 0.3] {
            w.advance_docking(&mut scene, now, 0.3);
            let pose = scene.local_pose(w.entity()).unwrap();
            let q = pose.rotation;
            assert!(q.x.is_finite() && q.y.is_finite() && q.z.is_finite() && q.w.is_finite());
            assert!(q.dot(target.rotation).abs() > 1.0 - 1e-4, "{q}");
        }
        let end = scene.local_pose(w.entity()).unwrap();
        assert!(end.position.approx_eq(target.position));
    }

    #[test]
    fn dispose_deletes_entity() {
        let mut scene = Scene::new();
        let w = DashWindow::create(&mut scene, &SensorScaleShim, params(true), 0.0);
        let id = w.entity();
        w.dispose(&mut scene);
        assert!(!scene.contains(id));
        assert_eq!(scene.drain_deleted().len(), 1);
    }
}
