//! Geometry and interaction core for the circuit-board portfolio.
//!
//! A centre chip carries a ring of anchor pins; every content panel on the
//! board is wired to one of them with an orthogonal trace. Panels open on a
//! click and detach for dragging after a long press. The render layer owns
//! pixels; this crate owns positions, routes, gesture state and timing.

pub mod animation;
pub mod board;
pub mod config;
pub mod content;
pub mod error;
pub mod gesture;
pub mod layout;
pub mod output;
pub mod prefs;
mod wasm;

pub use board::{Board, BoardEvent};
pub use config::CircuitConfig;
pub use content::{Panel, PanelId, PanelKind};
pub use error::CoreError;
pub use layout::{PointF, SizeF};
pub use output::FrameOutput;
pub use wasm::*;
