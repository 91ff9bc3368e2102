//! Window event protocol.
//!
//! Content surfaces and the window manager talk in JSON envelopes of the form
//! `{ "dash_window": { "event": "<tag>", ... } }`. The channel is shared with
//! unrelated traffic, so parsing is lenient at the edge:
//! - Unparsable JSON, or JSON without a `dash_window.event` string, is
//!   dropped ([`parse_window_envelope`] returns `None`).
//! - An envelope with an unknown tag comes back as [`Inbound::Unknown`], and
//!   a known tag with missing or mistyped fields as [`Inbound::Malformed`],
//!   so the caller can warn about either.
//!
//! Grab/release announcements arrive separately on the grab channel as
//! [`GrabMessage`].

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ecs::EntityId;

/// Envelope key shared by every window event.
pub const ENVELOPE_KEY: &str = "dash_window";

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    dash_window: T,
}

/// Content surface -> window manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WindowEvent {
    /// The content surface is ready for its initial props.
    WindowSpawned,
    /// Ask the manager to open a new window.
    SpawnWindow {
        source_url: String,
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pinnable: Option<bool>,
    },
    /// Close animation done; the window can be destroyed.
    FinishedClosing,
    /// Hide animation done; the entity can go invisible.
    FinishedHiding,
    Pin,
    Unpin,
    BeginDrag,
    FinishDrag,
    SetGrabbable {
        grabbable: bool,
    },
}

impl WindowEvent {
    /// Every tag [`WindowEvent`] decodes from.
    pub const TAGS: [&'static str; 9] = [
        "window_spawned",
        "spawn_window",
        "finished_closing",
        "finished_hiding",
        "pin",
        "unpin",
        "begin_drag",
        "finish_drag",
        "set_grabbable",
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            WindowEvent::WindowSpawned => "window_spawned",
            WindowEvent::SpawnWindow { .. } => "spawn_window",
            WindowEvent::FinishedClosing => "finished_closing",
            WindowEvent::FinishedHiding => "finished_hiding",
            WindowEvent::Pin => "pin",
            WindowEvent::Unpin => "unpin",
            WindowEvent::BeginDrag => "begin_drag",
            WindowEvent::FinishDrag => "finish_drag",
            WindowEvent::SetGrabbable { .. } => "set_grabbable",
        }
    }
}

/// Result of parsing a recognized envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Event(WindowEvent),
    /// Envelope had an `event` tag no [`WindowEvent`] uses.
    Unknown(String),
    /// Known tag whose fields did not decode.
    Malformed(String),
}

/// Fields of a `set_props` push. Only the changed fields are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinnable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grabbed: Option<bool>,
}

/// Window manager -> content surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OutboundEvent {
    SetProps(SetProps),
    Hide,
    Unhide,
    Focus,
    Unfocus,
    /// Ask the content to play its close animation and ack with
    /// `finished_closing`.
    Close,
}

/// What the grab scripts report for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrabAction {
    Grab,
    Release,
    #[serde(other)]
    Other,
}

/// Grab channel message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrabMessage {
    pub grabbed_entity: EntityId,
    pub action: GrabAction,
}

/// Parses a `dash_window` envelope. `None` means "not for us, drop it".
pub fn parse_window_envelope(raw: &str) -> Option<Inbound> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let body = value.get(ENVELOPE_KEY)?;
    let tag = body.get("event")?.as_str()?.to_string();

    match serde_json::from_value::<WindowEvent>(body.clone()) {
        Ok(event) => Some(Inbound::Event(event)),
        Err(_) if WindowEvent::TAGS.contains(&tag.as_str()) => Some(Inbound::Malformed(tag)),
        Err(_) => Some(Inbound::Unknown(tag)),
    }
}

/// Parses a grab channel message. `None` for anything malformed.
pub fn parse_grab_message(raw: &str) -> Option<GrabMessage> {
    serde_json::from_str(raw).ok()
}

/// Serializes an outbound event inside its envelope.
pub fn encode_outbound(event: &OutboundEvent) -> anyhow::Result<String> {
    serde_json::to_string(&Envelope { dash_window: event }).context("serialize window event")
}

/// Serializes an inbound event inside its envelope, as a content surface would.
pub fn encode_window_event(event: &WindowEvent) -> anyhow::Result<String> {
    serde_json::to_string(&Envelope { dash_window: event }).context("serialize window event")
}

/// Decodes an outbound envelope.
pub fn decode_outbound(raw: &str) -> anyhow::Result<OutboundEvent> {
    let env: Envelope<OutboundEvent> =
        serde_json::from_str(raw).context("deserialize window event")?;
    Ok(env.dash_window)
}
