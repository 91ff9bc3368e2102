//! Window manager.
//!
//! The manager maintains:
//! - The live set of windows, keyed by backing entity
//! - At most one focused and one dragged window
//! - The rail entity and its reveal animation
//! - A clock advanced only by [`WindowManager::update`]
//! - Fallback timers for windows whose readiness ack never arrived
//!
//! Host callbacks are delivered as [`HostEvent`]s through
//! [`WindowManager::handle_host_event`]. Everything runs on the caller's
//! thread; nothing here blocks.

use std::collections::HashMap;

use dash_shared::{
    config::DashConfig,
    ecs::EntityId,
    event::{HostEvent, HostSignal, SubscriptionId},
    host::{EntityEdit, EntityHost, EntityKind, EntitySpec, PolyLine, Pose},
    math::Vector3,
    protocol::{parse_grab_message, parse_window_envelope, GrabAction, Inbound, WindowEvent},
    quat::Quaternion,
};
use tracing::{debug, info, trace, warn};

use crate::{
    rail::{RailAnimation, RailGeometry},
    scale::{ScaleShim, SensorScaleShim},
    window::{DashWindow, WindowParams},
};

const SIGNALS: [HostSignal; 4] = [
    HostSignal::KeyboardFocusChanged,
    HostSignal::WebEventReceived,
    HostSignal::MessageReceived,
    HostSignal::SensorToWorldScaleChanged,
];

/// Initial props to push if the readiness ack has not arrived by `due`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DeferredInit {
    entity: EntityId,
    due: f64,
}

/// Owns every dashboard window under one root entity.
pub struct WindowManager<H: EntityHost> {
    host: H,
    shim: Box<dyn ScaleShim>,
    cfg: DashConfig,
    geometry: RailGeometry,

    root: EntityId,
    rail: EntityId,
    rail_anim: RailAnimation,

    windows: HashMap<EntityId, DashWindow>,
    focused: Option<EntityId>,
    dragged: Option<EntityId>,
    hidden: bool,

    /// Seconds of `update` time since construction.
    clock: f64,
    deferred_inits: Vec<DeferredInit>,
    subscriptions: Vec<SubscriptionId>,
}

impl<H: EntityHost> WindowManager<H> {
    /// Creates a manager using the sensor-scale compatibility shim.
    pub fn new(host: H, root: EntityId, cfg: DashConfig) -> Self {
        Self::with_scale_shim(host, root, cfg, Box::new(SensorScaleShim))
    }

    /// Connects to host signals and creates the (hidden) rail.
    pub fn with_scale_shim(mut host: H, root: EntityId, cfg: DashConfig, shim: Box<dyn ScaleShim>) -> Self {
        let geometry = RailGeometry::from_config(&cfg);

        let subscriptions = SIGNALS.iter().map(|s| host.connect(*s)).collect();

        let rail = host.add_entity(EntitySpec {
            name: "Window Rail".to_string(),
            parent: Some(root),
            pose: Pose::new(Vector3::new(0.0, 0.0, -cfg.rail_distance), Quaternion::IDENTITY),
            visible: false,
            grabbable: false,
            kind: EntityKind::PolyLine(PolyLine {
                points: geometry.points(1.0),
                normals: vec![Vector3::FORWARD; cfg.rail_resolution],
                stroke_widths: vec![cfg.rail_stroke_width; cfg.rail_resolution],
                color: cfg.rail_color,
                face_camera: true,
            }),
        });

        info!(root = %root, rail = %rail, "Window manager ready");

        Self {
            host,
            shim,
            rail_anim: RailAnimation::new(cfg.rail_anim_rate),
            cfg,
            geometry,
            root,
            rail,
            windows: HashMap::new(),
            focused: None,
            dragged: None,
            hidden: true,
            clock: 0.0,
            deferred_inits: Vec::new(),
            subscriptions,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &DashConfig {
        &self.cfg
    }

    pub fn geometry(&self) -> &RailGeometry {
        &self.geometry
    }

    pub fn root(&self) -> EntityId {
        self.root
    }

    /// The rail polyline entity.
    pub fn rail(&self) -> EntityId {
        self.rail
    }

    pub fn rail_animation(&self) -> &RailAnimation {
        &self.rail_anim
    }

    pub fn window(&self, entity: EntityId) -> Option<&DashWindow> {
        self.windows.get(&entity)
    }

    pub fn windows(&self) -> impl Iterator<Item = &DashWindow> {
        self.windows.values()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn focused(&self) -> Option<EntityId> {
        self.focused
    }

    /// Window whose content reported an in-progress drag.
    pub fn dragged(&self) -> Option<EntityId> {
        self.dragged
    }

    /// Whether the dock (rail and unpinned windows) is hidden.
    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Routes a host callback to its handler.
    pub fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::KeyboardFocusChanged { entity } => self.on_keyboard_focus_changed(entity),
            HostEvent::WebEventReceived { entity, payload } => self.on_web_event(entity, &payload),
            HostEvent::MessageReceived { channel, payload } => self.on_message(&channel, &payload),
            HostEvent::SensorToWorldScaleChanged => self.on_scale_changed(),
        }
    }

    /// A content surface sent a string. Only live windows are listened to.
    pub fn on_web_event(&mut self, entity: EntityId, payload: &str) {
        if !self.windows.contains_key(&entity) {
            trace!(entity = %entity, "Web event from unrelated entity");
            return;
        }

        match parse_window_envelope(payload) {
            Some(Inbound::Event(event)) => self.window_event(entity, event),
            Some(Inbound::Unknown(tag)) => {
                warn!(entity = %entity, tag = %tag, "Unknown dash_window event, ignoring")
            }
            Some(Inbound::Malformed(tag)) => {
                warn!(entity = %entity, tag = %tag, "Malformed dash_window event, ignoring")
            }
            None => trace!(entity = %entity, "Dropping non-window web event"),
        }
    }

    /// A message bus message arrived.
    pub fn on_message(&mut self, channel: &str, payload: &str) {
        if channel == self.cfg.grab_channel {
            self.on_grab_message(payload);
        } else if channel == self.cfg.ipc_channel {
            match parse_window_envelope(payload) {
                Some(Inbound::Event(WindowEvent::SpawnWindow {
                    source_url,
                    title,
                    pinnable,
                })) => {
                    self.spawn_window(source_url, title, pinnable.unwrap_or(true));
                }
                Some(Inbound::Event(event)) => {
                    warn!(tag = event.tag(), "Window event without a window, ignoring")
                }
                Some(Inbound::Unknown(tag)) => {
                    warn!(tag = %tag, "Unknown dash_window event, ignoring")
                }
                Some(Inbound::Malformed(tag)) => {
                    warn!(tag = %tag, "Malformed dash_window event, ignoring")
                }
                None => trace!(channel, "Dropping unparsable IPC message"),
            }
        }
    }

    fn on_grab_message(&mut self, payload: &str) {
        let Some(msg) = parse_grab_message(payload) else {
            trace!("Dropping unparsable grab message");
            return;
        };
        let Some(window) = self.windows.get_mut(&msg.grabbed_entity) else {
            return;
        };

        let grabbed = match msg.action {
            GrabAction::Grab => true,
            GrabAction::Release => false,
            GrabAction::Other => return,
        };
        debug!(entity = %msg.grabbed_entity, grabbed, "Grab state changed");
        window.set_grabbed(&mut self.host, self.shim.as_ref(), grabbed, self.clock);
    }

    /// Moves focus, unfocusing the previous window. Focus on anything that is
    /// not a live window clears it.
    pub fn on_keyboard_focus_changed(&mut self, entity: Option<EntityId>) {
        if let Some(prev) = self.focused.take().and_then(|id| self.windows.get(&id)) {
            prev.unfocus(&mut self.host);
        }

        if let Some(window) = entity.and_then(|id| self.windows.get(&id)) {
            window.focus(&mut self.host);
            self.focused = Some(window.entity());
        }
    }

    /// Re-applies dimensions and DPI after the avatar's scale changed.
    pub fn on_scale_changed(&mut self) {
        debug!(scale = self.host.sensor_to_world_scale(), "Sensor-to-world scale changed");
        for window in self.windows.values() {
            window.refresh_scale(&mut self.host, self.shim.as_ref());
        }
    }

    /// Creates a window at the rail's center and arms its init fallback.
    pub fn spawn_window(&mut self, source_url: String, title: String, pinnable: bool) -> EntityId {
        let window = DashWindow::create(
            &mut self.host,
            self.shim.as_ref(),
            WindowParams {
                source_url,
                title,
                pinnable,
                parent: Some(self.root),
                pose: self.geometry.spawn_pose(),
                dimensions: self.cfg.window_dimensions,
                dpi: self.cfg.window_dpi,
                max_fps: self.cfg.window_max_fps,
                root_url: self.cfg.window_root_url.clone(),
            },
            self.clock,
        );

        let entity = window.entity();
        info!(entity = %entity, title = window.title(), pinnable, "Window spawned");

        self.deferred_inits.push(DeferredInit {
            entity,
            due: self.clock + self.cfg.init_delay_secs(),
        });
        self.windows.insert(entity, window);
        entity
    }

    /// Asks a window's content to close. Returns `false` for unknown windows.
    pub fn request_close(&mut self, entity: EntityId) -> bool {
        match self.windows.get_mut(&entity) {
            Some(window) => {
                window.request_close(&mut self.host);
                true
            }
            None => false,
        }
    }

    /// Retitles a window. Returns `false` for unknown windows.
    pub fn set_title(&mut self, entity: EntityId, title: impl Into<String>) -> bool {
        let Some(window) = self.windows.get_mut(&entity) else {
            return false;
        };
        window.set_title(&mut self.host, title);
        true
    }

    /// Points a window at new content. Returns `false` for unknown windows.
    pub fn set_source_url(&mut self, entity: EntityId, url: impl Into<String>) -> bool {
        let Some(window) = self.windows.get_mut(&entity) else {
            return false;
        };
        window.set_source_url(&mut self.host, url);
        true
    }

    /// Hides or shows one window, independent of the dock. Returns `false`
    /// for unknown windows.
    pub fn set_window_hidden(&mut self, entity: EntityId, hidden: bool) -> bool {
        let Some(window) = self.windows.get_mut(&entity) else {
            return false;
        };
        debug!(entity = %entity, hidden, "Window visibility changed");
        window.set_hidden(&mut self.host, hidden);
        true
    }

    /// Allows or forbids pinning. Returns `false` for unknown windows.
    pub fn set_pinnable(&mut self, entity: EntityId, pinnable: bool) -> bool {
        let Some(window) = self.windows.get_mut(&entity) else {
            return false;
        };
        window.set_pinnable(&mut self.host, pinnable, self.clock);
        true
    }

    fn window_event(&mut self, entity: EntityId, event: WindowEvent) {
        trace!(entity = %entity, tag = event.tag(), "Window event");

        match event {
            WindowEvent::SpawnWindow {
                source_url,
                title,
                pinnable,
            } => {
                self.spawn_window(source_url, title, pinnable.unwrap_or(true));
            }
            WindowEvent::FinishedClosing => self.close_window(entity),
            _ => {
                let Some(window) = self.windows.get_mut(&entity) else {
                    return;
                };
                match event {
                    WindowEvent::WindowSpawned => match window.mark_initialized() {
                        Ok(()) => {
                            window.push_initial_props(&mut self.host, false);
                            self.deferred_inits.retain(|d| d.entity != entity);
                        }
                        Err(e) => debug!(error = %e, "Late readiness ack ignored"),
                    },
                    WindowEvent::FinishedHiding => window.finish_hiding(&mut self.host),
                    WindowEvent::Pin => window.set_pinned(&mut self.host, true, self.clock),
                    WindowEvent::Unpin => window.set_pinned(&mut self.host, false, self.clock),
                    WindowEvent::BeginDrag => self.dragged = Some(entity),
                    WindowEvent::FinishDrag => self.dragged = None,
                    WindowEvent::SetGrabbable { grabbable } => {
                        window.set_grabbable(&mut self.host, grabbable)
                    }
                    WindowEvent::SpawnWindow { .. } | WindowEvent::FinishedClosing => {}
                }
            }
        }
    }

    fn close_window(&mut self, entity: EntityId) {
        let Some(window) = self.windows.remove(&entity) else {
            return;
        };
        if self.focused == Some(entity) {
            self.focused = None;
        }
        if self.dragged == Some(entity) {
            self.dragged = None;
        }
        self.deferred_inits.retain(|d| d.entity != entity);

        info!(entity = %entity, title = window.title(), "Window closed");
        window.dispose(&mut self.host);
    }

    /// Shows or hides the dock. Every window's hide override follows, and
    /// the rail animation restarts in the matching direction.
    pub fn set_hidden(&mut self, hide: bool) {
        info!(hidden = hide, "Dock visibility changed");
        self.hidden = hide;

        for window in self.windows.values_mut() {
            window.set_hidden_override(&mut self.host, hide);
        }

        if !hide {
            self.host.edit_entity(self.rail, EntityEdit::visible(true));
        }
        self.rail_anim.start(hide);
    }

    /// Advances the manager by `dt` seconds: rail first, then pending
    /// initializations, then window poses.
    pub fn update(&mut self, dt: f64) {
        let dt = dt.max(0.0);
        self.clock += dt;

        if let Some(frame) = self.rail_anim.advance(&self.geometry, dt as f32) {
            self.host.edit_entity(
                self.rail,
                EntityEdit {
                    visible: Some(frame.visible),
                    line_points: Some(frame.points),
                    ..EntityEdit::default()
                },
            );
        }

        self.fire_deferred_inits();
        self.update_windows();
    }

    // TODO: drop the timed fallback once `window_spawned` reliably reaches
    // the manager for every window.
    fn fire_deferred_inits(&mut self) {
        if self.deferred_inits.is_empty() {
            return;
        }

        let now = self.clock;
        let (due, pending): (Vec<_>, Vec<_>) =
            self.deferred_inits.drain(..).partition(|d| d.due <= now);
        self.deferred_inits = pending;

        for init in due {
            let Some(window) = self.windows.get_mut(&init.entity) else {
                debug!(entity = %init.entity, "Deferred init for a closed window skipped");
                continue;
            };
            if window.mark_initialized().is_err() {
                continue;
            }
            debug!(entity = %init.entity, "Readiness ack missing, pushing initial props");
            window.push_initial_props(&mut self.host, true);
        }
    }

    fn update_windows(&mut self) {
        let tween = self.cfg.dock_tween_secs();

        for (id, window) in self.windows.iter_mut() {
            if window.is_pinned() {
                continue;
            }

            if window.is_grabbed() {
                if let Some(pose) = self.host.local_pose(*id) {
                    window.snap_to(&mut self.host, self.geometry.project(pose.position));
                }
            } else {
                window.advance_docking(&mut self.host, self.clock, tween);
            }
        }
    }

    /// Disconnects from the host, deletes the rail and every window, and
    /// hands the host back.
    pub fn dispose(mut self) -> H {
        for id in self.subscriptions.drain(..) {
            self.host.disconnect(id);
        }

        self.host.delete_entity(self.rail);

        let count = self.windows.len();
        for (_, window) in self.windows.drain() {
            window.dispose(&mut self.host);
        }
        self.deferred_inits.clear();

        info!(windows = count, "Window manager disposed");
        self.host
    }
}
