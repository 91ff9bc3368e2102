//! Test harness: a [`WindowManager`] over a headless [`Scene`], driven the
//! way the host would drive it, through JSON envelopes and messages.

use std::collections::BTreeSet;

use anyhow::Context;
use dash_shared::{
    config::DashConfig,
    ecs::EntityId,
    event::HostEvent,
    protocol::{decode_outbound, encode_window_event, OutboundEvent, WindowEvent},
    scene::Scene,
};
use dash_windows::WindowManager;

/// Installs a test-writer subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

pub struct Harness {
    pub manager: WindowManager<Scene>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(DashConfig::default())
    }

    pub fn with_config(cfg: DashConfig) -> Self {
        init_tracing();
        let mut scene = Scene::new();
        let root = scene.spawn_anchor("Dashboard");
        Self {
            manager: WindowManager::new(scene, root, cfg),
        }
    }

    pub fn scene(&self) -> &Scene {
        self.manager.host()
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        self.manager.host_mut()
    }

    /// Sends `spawn_window` over the IPC channel and returns the new window.
    pub fn spawn(&mut self, source_url: &str, title: &str, pinnable: Option<bool>) -> anyhow::Result<EntityId> {
        let before: BTreeSet<EntityId> = self.manager.windows().map(|w| w.entity()).collect();

        let payload = encode_window_event(&WindowEvent::SpawnWindow {
            source_url: source_url.to_string(),
            title: title.to_string(),
            pinnable,
        })?;
        let channel = self.manager.config().ipc_channel.clone();
        self.manager
            .handle_host_event(HostEvent::MessageReceived { channel, payload });

        self.manager
            .windows()
            .map(|w| w.entity())
            .find(|id| !before.contains(id))
            .context("spawn_window did not create a window")
    }

    /// Delivers a window event as if `entity`'s content surface sent it.
    pub fn send(&mut self, entity: EntityId, event: &WindowEvent) -> anyhow::Result<()> {
        let payload = encode_window_event(event)?;
        self.send_raw(entity, &payload);
        Ok(())
    }

    pub fn send_raw(&mut self, entity: EntityId, payload: &str) {
        self.manager
            .handle_host_event(HostEvent::WebEventReceived {
                entity,
                payload: payload.to_string(),
            });
    }

    /// Announces a grab-channel action (`"grab"`, `"release"`, ...).
    pub fn grab_action(&mut self, entity: EntityId, action: &str) {
        let payload = serde_json::json!({ "grabbedEntity": entity, "action": action }).to_string();
        let channel = self.manager.config().grab_channel.clone();
        self.manager
            .handle_host_event(HostEvent::MessageReceived { channel, payload });
    }

    /// Drains outbound events and keeps the ones sent to `entity`.
    pub fn outbound(&mut self, entity: EntityId) -> Vec<OutboundEvent> {
        self.scene_mut()
            .drain_script_events()
            .into_iter()
            .filter(|e| e.entity == entity)
            .filter_map(|e| decode_outbound(&e.payload).ok())
            .collect()
    }

    pub fn clear_outbound(&mut self) {
        self.scene_mut().drain_script_events();
    }
}
