//! `dash_windows`
//!
//! Dashboard window systems:
//! - Floating content windows and their visibility/pin/grab state
//! - The curved window rail and its reveal animation
//! - The window manager tying host callbacks, docking, and focus together
//! - A scale shim isolating host sensor-scale workarounds
//! - A JSON-lines driver for running the manager headless

pub mod driver;
pub mod manager;
pub mod rail;
pub mod scale;
pub mod window;

pub use manager::WindowManager;
pub use window::{DashWindow, WindowError, WindowFlags, WindowState};
