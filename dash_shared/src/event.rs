//! Event and messaging system.
//!
//! - [`EventBus`]: a small typed queue. The headless scene records what it was
//!   asked to do on it; tests and the driver drain it.
//! - [`HostSignal`] / [`HostEvent`]: the host callbacks a window manager
//!   listens to, and their payloads.
//! - [`SignalRegistry`]: the subscription list a host keeps for connected
//!   listeners.

use std::{
    any::{Any, TypeId},
    collections::{BTreeMap, HashMap},
};

use serde::{Deserialize, Serialize};

use crate::ecs::EntityId;

/// Typed event bus.
#[derive(Default)]
pub struct EventBus {
    queues: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl EventBus {
    /// Pushes an event into the queue.
    pub fn push<E: 'static + Send + Sync>(&mut self, e: E) {
        let q = self
            .queues
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Vec::<E>::new()));
        if let Some(q) = q.downcast_mut::<Vec<E>>() {
            q.push(e);
        }
    }

    /// Drains all queued events of a type.
    pub fn drain<E: 'static + Send + Sync>(&mut self) -> Vec<E> {
        self.queues
            .remove(&TypeId::of::<E>())
            .and_then(|boxed| boxed.downcast::<Vec<E>>().ok())
            .map(|boxed| *boxed)
            .unwrap_or_default()
    }

    /// Borrows queued events of a type without draining them.
    pub fn peek<E: 'static + Send + Sync>(&self) -> &[E] {
        self.queues
            .get(&TypeId::of::<E>())
            .and_then(|boxed| boxed.downcast_ref::<Vec<E>>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Host callbacks a listener can connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HostSignal {
    /// The entity holding keyboard focus changed.
    KeyboardFocusChanged,
    /// A content surface sent a string to its script side.
    WebEventReceived,
    /// A message arrived on the local message bus.
    MessageReceived,
    /// The avatar's sensor-to-world scale changed.
    SensorToWorldScaleChanged,
}

/// Payload delivered with a [`HostSignal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostEvent {
    KeyboardFocusChanged {
        entity: Option<EntityId>,
    },
    WebEventReceived {
        entity: EntityId,
        payload: String,
    },
    MessageReceived {
        channel: String,
        payload: String,
    },
    SensorToWorldScaleChanged,
}

impl HostEvent {
    pub fn signal(&self) -> HostSignal {
        match self {
            HostEvent::KeyboardFocusChanged { .. } => HostSignal::KeyboardFocusChanged,
            HostEvent::WebEventReceived { .. } => HostSignal::WebEventReceived,
            HostEvent::MessageReceived { .. } => HostSignal::MessageReceived,
            HostEvent::SensorToWorldScaleChanged => HostSignal::SensorToWorldScaleChanged,
        }
    }
}

/// Handle returned by `connect`, used to `disconnect` later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Live subscriptions, keyed by handle.
#[derive(Debug, Default)]
pub struct SignalRegistry {
    next_id: u64,
    live: BTreeMap<SubscriptionId, HostSignal>,
}

impl SignalRegistry {
    pub fn connect(&mut self, signal: HostSignal) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.live.insert(id, signal);
        id
    }

    /// Returns `false` if `id` was not connected.
    pub fn disconnect(&mut self, id: SubscriptionId) -> bool {
        self.live.remove(&id).is_some()
    }

    pub fn is_connected(&self, signal: HostSignal) -> bool {
        self.live.values().any(|s| *s == signal)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
