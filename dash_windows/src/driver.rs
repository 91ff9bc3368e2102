//! Headless driver.
//!
//! Runs a [`WindowManager`] over an in-memory [`Scene`] and feeds it
//! JSON-lines commands, one object per line:
//!
//! ```text
//! {"cmd":"message","channel":"dash.ipc","payload":{"dash_window":{"event":"spawn_window","source_url":"qml:foo","title":"Foo"}}}
//! {"cmd":"web_event","entity":3,"payload":{"dash_window":{"event":"pin"}}}
//! {"cmd":"show"}
//! {"cmd":"status"}
//! ```
//!
//! Payloads may be given as JSON values or as pre-encoded strings.

use anyhow::Context;
use dash_shared::{
    config::DashConfig,
    ecs::EntityId,
    event::HostEvent,
    host::{EntityHost, Pose},
    math::Vector3,
    scene::{Scene, ScriptEvent},
};
use serde::Deserialize;
use serde_json::Value;

use crate::manager::WindowManager;

/// One input line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum DriverCommand {
    /// A content surface sent `payload`.
    WebEvent { entity: EntityId, payload: Value },
    /// A message bus message.
    Message { channel: String, payload: Value },
    /// Keyboard focus moved; `null` clears it.
    Focus {
        #[serde(default)]
        entity: Option<EntityId>,
    },
    /// The avatar's sensor-to-world scale changed.
    Scale { scale: f32 },
    /// Moves an entity, as a hand holding it would.
    Move { entity: EntityId, position: Vector3 },
    Close { entity: EntityId },
    Show,
    Hide,
    Status,
    Quit,
}

impl DriverCommand {
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        serde_json::from_str(line).context("parse driver command")
    }
}

/// Whether the driver loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Manager plus its headless host.
pub struct Driver {
    manager: WindowManager<Scene>,
}

impl Driver {
    pub fn new(cfg: DashConfig) -> Self {
        let mut scene = Scene::new();
        let root = scene.spawn_anchor("Dashboard");
        Self {
            manager: WindowManager::new(scene, root, cfg),
        }
    }

    pub fn manager(&self) -> &WindowManager<Scene> {
        &self.manager
    }

    /// Runs one command. Returns lines to print and whether to keep going.
    pub fn exec(&mut self, cmd: DriverCommand) -> (Vec<String>, Flow) {
        let out = match cmd {
            DriverCommand::WebEvent { entity, payload } => {
                self.manager.handle_host_event(HostEvent::WebEventReceived {
                    entity,
                    payload: payload_string(payload),
                });
                Vec::new()
            }
            DriverCommand::Message { channel, payload } => {
                self.manager.handle_host_event(HostEvent::MessageReceived {
                    channel,
                    payload: payload_string(payload),
                });
                Vec::new()
            }
            DriverCommand::Focus { entity } => {
                self.manager
                    .handle_host_event(HostEvent::KeyboardFocusChanged { entity });
                Vec::new()
            }
            DriverCommand::Scale { scale } => {
                self.manager.host_mut().set_sensor_to_world_scale(scale);
                self.manager
                    .handle_host_event(HostEvent::SensorToWorldScaleChanged);
                Vec::new()
            }
            DriverCommand::Move { entity, position } => {
                let scene = self.manager.host_mut();
                match scene.local_pose(entity) {
                    Some(pose) => {
                        scene.set_local_pose(entity, Pose::new(position, pose.rotation));
                        Vec::new()
                    }
                    None => vec![format!("No entity {entity}")],
                }
            }
            DriverCommand::Close { entity } => {
                if self.manager.request_close(entity) {
                    Vec::new()
                } else {
                    vec![format!("No window {entity}")]
                }
            }
            DriverCommand::Show => {
                self.manager.set_hidden(false);
                Vec::new()
            }
            DriverCommand::Hide => {
                self.manager.set_hidden(true);
                Vec::new()
            }
            DriverCommand::Status => self.status(),
            DriverCommand::Quit => return (Vec::new(), Flow::Quit),
        };
        (out, Flow::Continue)
    }

    pub fn status(&self) -> Vec<String> {
        let m = &self.manager;
        let mut out = Vec::new();
        out.push(format!("Clock: {:.3}s", m.clock()));
        out.push(format!("Hidden: {}", m.hidden()));
        out.push(format!("Focused: {:?}", m.focused()));
        out.push(format!("Windows: {}", m.len()));

        let mut windows: Vec<_> = m.windows().collect();
        windows.sort_by_key(|w| w.entity());
        for w in windows {
            out.push(format!("  {} {:?} \"{}\" {}", w.entity(), w.state(), w.title(), w.source_url()));
        }
        out
    }

    /// Advances the manager and returns what it sent to content surfaces.
    pub fn tick(&mut self, dt: f64) -> Vec<ScriptEvent> {
        self.manager.update(dt);
        self.manager.host_mut().drain_script_events()
    }

    /// Tears the manager down and returns the scene.
    pub fn shutdown(self) -> Scene {
        self.manager.dispose()
    }
}

fn payload_string(payload: Value) -> String {
    match payload {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
