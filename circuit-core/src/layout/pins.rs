// Anchor ring and pin assignment.
//
// The ring is `per_side` evenly spaced anchors on each side of a square of
// side `chip_size` centred on the chip. Panels are matched to anchors
// greedily: in id order, each panel takes the closest anchor nobody has
// taken yet. The result is deterministic for a given ring and panel set.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{PointF, Side};
use crate::content::{Panel, PanelId};

/// A fixed connection point on the chip's ring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnchorPoint {
    /// Side letter + 1-based index, e.g. `L1`, `B5`.
    pub id: String,
    pub side: Side,
    pub index: usize,
    pub x: f64,
    pub y: f64,
}

impl AnchorPoint {
    fn new(side: Side, index: usize, x: f64, y: f64) -> Self {
        AnchorPoint { id: format!("{}{}", side.letter(), index), side, index, x, y }
    }

    pub fn point(&self) -> PointF {
        PointF { x: self.x, y: self.y }
    }
}

/// Generate the anchor ring around `center`.
///
/// Emission order is `L1, R1, L2, R2, ..` followed by `T1, B1, T2, B2, ..`.
/// That order is also the tie-break order for assignment.
pub fn generate_anchor_ring(center: PointF, size: f64, per_side: usize) -> Vec<AnchorPoint> {
    let half = size / 2.0;
    let gap = size / (per_side as f64 + 1.0);
    let mut anchors = Vec::with_capacity(per_side * 4);

    for i in 1..=per_side {
        let y = center.y - half + gap * i as f64;
        anchors.push(AnchorPoint::new(Side::Left, i, center.x - half, y));
        anchors.push(AnchorPoint::new(Side::Right, i, center.x + half, y));
    }
    for i in 1..=per_side {
        let x = center.x - half + gap * i as f64;
        anchors.push(AnchorPoint::new(Side::Top, i, x, center.y - half));
        anchors.push(AnchorPoint::new(Side::Bottom, i, x, center.y + half));
    }

    anchors
}

/// Result of matching panels to anchors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PinAssignment {
    pub pins: BTreeMap<PanelId, AnchorPoint>,
    /// Panels that found the pool empty and share an anchor with another panel.
    pub reused: Vec<PanelId>,
}

impl PinAssignment {
    pub fn get(&self, id: &PanelId) -> Option<&AnchorPoint> {
        self.pins.get(id)
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

/// Closest anchor to `point`, ignoring any assignment. First in ring order wins ties.
pub fn nearest_anchor<'a>(anchors: &'a [AnchorPoint], point: PointF) -> Option<&'a AnchorPoint> {
    let mut best: Option<(&AnchorPoint, f64)> = None;
    for anchor in anchors {
        let d = anchor.point().distance_sq(&point);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((anchor, d));
        }
    }
    best.map(|(a, _)| a)
}

/// Assign every positioned panel a distinct anchor, nearest first.
///
/// Panels without a position are skipped. With more panels than anchors
/// the overflow falls back to the nearest anchor and is listed in
/// `reused`.
pub fn assign_pins(panels: &[Panel], anchors: &[AnchorPoint]) -> PinAssignment {
    let mut sorted: Vec<(&PanelId, PointF)> = panels
        .iter()
        .filter_map(|p| p.pos.filter(PointF::is_finite).map(|pos| (&p.id, pos)))
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut free: Vec<&AnchorPoint> = anchors.iter().collect();
    let mut result = PinAssignment::default();

    for (id, pos) in sorted {
        let mut best: Option<(usize, f64)> = None;
        for (i, anchor) in free.iter().enumerate() {
            let d = anchor.point().distance_sq(&pos);
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((i, d));
            }
        }

        match best {
            Some((i, _)) => {
                let anchor = free.remove(i);
                result.pins.insert(id.clone(), anchor.clone());
            }
            None => {
                let Some(anchor) = nearest_anchor(anchors, pos) else {
                    // Empty ring: nothing to connect to.
                    continue;
                };
                tracing::warn!(panel = %id, anchor = %anchor.id, "anchor pool exhausted, reusing nearest anchor");
                result.pins.insert(id.clone(), anchor.clone());
                result.reused.push(id.clone());
            }
        }
    }

    result
}
