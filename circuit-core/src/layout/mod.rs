// Board geometry.
//
// Everything in here is a pure function of the board state:
// - pins: anchor ring around the centre chip + greedy pin assignment
// - routing: orthogonal connector paths from an anchor to a panel edge
// - spacing: post-drop clearance relaxation for a moved panel
//
// Coordinates are f64 screen units. A panel's `pos` is its centre.

use serde::{Deserialize, Serialize};

pub mod pins;
pub mod routing;
pub mod spacing;

pub use pins::{assign_pins, generate_anchor_ring, nearest_anchor, AnchorPoint, PinAssignment};
pub use routing::{route, route_detail, ConnectorPath, RouteKey, RouteOrder, Router};
pub use spacing::{enforce_minimum_spacing, SpacingOutcome};

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(&self, other: &PointF) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &PointF) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn offset(&self, dx: f64, dy: f64) -> PointF {
        PointF { x: self.x + dx, y: self.y + dy }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeF {
    pub w: f64,
    pub h: f64,
}

impl SizeF {
    pub const fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    pub fn half_w(&self) -> f64 { self.w / 2.0 }
    pub fn half_h(&self) -> f64 { self.h / 2.0 }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct RectF {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl RectF {
    pub fn from_center(center: PointF, size: SizeF) -> Self {
        RectF {
            x: center.x - size.half_w(),
            y: center.y - size.half_h(),
            w: size.w,
            h: size.h,
        }
    }

    pub fn right(&self) -> f64 { self.x + self.w }
    pub fn bottom(&self) -> f64 { self.y + self.h }

    pub fn center(&self) -> PointF {
        PointF { x: self.x + self.w / 2.0, y: self.y + self.h / 2.0 }
    }

    /// Midpoint of one edge of the rectangle.
    pub fn edge_midpoint(&self, side: Side) -> PointF {
        let c = self.center();
        match side {
            Side::Left => PointF { x: self.x, y: c.y },
            Side::Right => PointF { x: self.right(), y: c.y },
            Side::Top => PointF { x: c.x, y: self.y },
            Side::Bottom => PointF { x: c.x, y: self.bottom() },
        }
    }
}

/// One side of a box: of the centre chip for anchors, of a panel for
/// the edge a connector terminates on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    /// Unit vector pointing away from the box on this side.
    pub fn outward(self) -> (f64, f64) {
        match self {
            Side::Left => (-1.0, 0.0),
            Side::Right => (1.0, 0.0),
            Side::Top => (0.0, -1.0),
            Side::Bottom => (0.0, 1.0),
        }
    }

    /// Left and right sides; their connectors leave horizontally.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }

    pub fn letter(self) -> char {
        match self {
            Side::Left => 'L',
            Side::Right => 'R',
            Side::Top => 'T',
            Side::Bottom => 'B',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    /// Side length of the square the anchor ring sits on.
    pub chip_size: f64,
    /// Anchors per side of the ring.
    pub per_side: usize,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self { chip_size: 200.0, per_side: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Straight run out of an anchor before the first bend.
    pub stub_length: f64,
    /// Space between a panel's outer box and its pin centre.
    pub pin_gap: f64,
    /// Rendered pin glyph size.
    pub pin_size: f64,
    /// Shortest first segment allowed after the stub.
    pub min_bend_clearance: f64,
    /// Bend offset used when the first segment would be too short.
    pub bend_bias: f64,
    /// Size assumed for a panel that has not been measured yet.
    pub default_panel_size: SizeF,
}

impl RouteConfig {
    /// Distance from a panel edge to where its connector ends.
    pub fn edge_clearance(&self) -> f64 {
        self.pin_gap + self.pin_size / 2.0
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            stub_length: 14.0,
            pin_gap: 16.0,
            pin_size: 8.0,
            min_bend_clearance: 40.0,
            bend_bias: 70.0,
            default_panel_size: SizeF { w: 218.0, h: 82.0 },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacingConfig {
    /// Minimum centre-to-centre distance between panels.
    pub min_distance: f64,
    /// Extra push beyond the exact overlap.
    pub buffer: f64,
    pub max_iterations: usize,
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self { min_distance: 35.0, buffer: 2.0, max_iterations: 40 }
    }
}
