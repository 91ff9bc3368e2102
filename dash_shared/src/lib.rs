//! `dash_shared`
//!
//! Host-agnostic libraries used by the dashboard window manager.
//!
//! Design goals:
//! - Deterministic value types (vectors, quaternions, colors).
//! - Clear separation of concerns (math, protocol, events, host boundary).
//! - Traits for abstraction and dependency injection.
//! - No `unsafe`.

pub mod color;
pub mod config;
pub mod ecs;
pub mod event;
pub mod host;
pub mod math;
pub mod protocol;
pub mod quat;
pub mod scene;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::color::*;
    pub use crate::config::*;
    pub use crate::ecs::EntityId;
    pub use crate::event::*;
    pub use crate::host::*;
    pub use crate::math::*;
    pub use crate::protocol::*;
    pub use crate::quat::*;
}
