//! Output types for the render layer.
//!
//! These structs are serialized to JSON and handed to the front end once
//! per frame. They carry geometry and state facts only, no styling.

use serde::Serialize;

use crate::animation::TraceCue;
use crate::content::PanelKind;
use crate::layout::{AnchorPoint, PointF, RectF, RouteOrder};
use crate::prefs::Theme;

/// A panel as the render layer should place it
#[derive(Debug, Clone, Serialize)]
pub struct PanelOutput {
    pub id: String,
    pub label: String,
    pub kind: PanelKind,
    /// Panel centre; absent for panels that could not be placed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<PointF>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<RectF>,
    pub revealed: bool,
    pub highlighted: bool,
    /// Being dragged right now
    pub detaching: bool,
}

/// A routed trace from an anchor to a panel pin (or to the detail card)
#[derive(Debug, Clone, Serialize)]
pub struct ConnectorOutput {
    pub id: String,
    pub anchor: String,
    pub d: String,
    pub length: f64,
    pub order: RouteOrder,
    pub waypoints: Vec<PointF>,
    pub detaching: bool,
    /// Carries the travelling pulse shortly after a drop
    pub signal: bool,
    pub highlighted: bool,
}

/// Everything the render layer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameOutput {
    pub anchors: Vec<AnchorPoint>,
    pub panels: Vec<PanelOutput>,
    pub connectors: Vec<ConnectorOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ConnectorOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cues: Vec<TraceCue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<String>,
    /// Panel currently holding pointer capture
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured: Option<String>,
    pub theme: Theme,
    pub reduced_motion: bool,
    pub all_revealed: bool,
    pub refresh_token: u32,
}
