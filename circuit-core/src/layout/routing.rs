// Orthogonal connector routing.
//
// A connector leaves its anchor with a short stub in the anchor's outward
// direction, bends once or twice, and ends just outside the panel edge that
// faces the chip, where the render layer draws the panel's pin glyph.
//
// Panels left/right of the chip are routed horizontal-first, panels
// above/below vertical-first, so traces leave the chip before turning.

use std::collections::HashMap;

use serde::Serialize;

use super::{AnchorPoint, PointF, RectF, RouteConfig, Side, SizeF};
use crate::content::PanelId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteOrder {
    HorizontalFirst,
    VerticalFirst,
}

/// A routed connector: axis-aligned waypoints from anchor to panel pin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorPath {
    pub anchor: String,
    pub order: RouteOrder,
    pub waypoints: Vec<PointF>,
    /// SVG path data (`M x y L x y ..`).
    pub d: String,
    /// Total length, for dash-offset animation.
    pub length: f64,
}

impl ConnectorPath {
    fn from_waypoints(anchor: &str, order: RouteOrder, mut waypoints: Vec<PointF>) -> Self {
        waypoints.dedup_by(|b, a| (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9);
        let length = waypoints.windows(2).map(|w| w[0].distance(&w[1])).sum();
        let d = path_data(&waypoints);
        ConnectorPath { anchor: anchor.to_string(), order, waypoints, d, length }
    }

    pub fn start(&self) -> Option<PointF> {
        self.waypoints.first().copied()
    }

    pub fn end(&self) -> Option<PointF> {
        self.waypoints.last().copied()
    }
}

fn fmt_coord(v: f64) -> String {
    let r = (v * 100.0).round() / 100.0;
    // Avoid "-0" in the output
    if r == 0.0 { "0".to_string() } else { format!("{r}") }
}

fn path_data(points: &[PointF]) -> String {
    let mut d = String::new();
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            d.push(' ');
        }
        d.push_str(if i == 0 { "M " } else { "L " });
        d.push_str(&fmt_coord(p.x));
        d.push(' ');
        d.push_str(&fmt_coord(p.y));
    }
    d
}

/// Hashable stand-in for an f64 coordinate pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct CoordBits(u64, u64);

impl CoordBits {
    fn of(x: f64, y: f64) -> Self {
        // +0.0 and -0.0 must map to the same key
        CoordBits((x + 0.0).to_bits(), (y + 0.0).to_bits())
    }
}

/// Everything a connector's geometry depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    panel: PanelId,
    anchor: String,
    anchor_at: CoordBits,
    target: CoordBits,
    side: Side,
    half: CoordBits,
}

/// Which panel edge faces the chip: the edge on the dominant axis of the
/// panel's offset from the centre.
pub fn facing_side(pos: PointF, center: PointF) -> Side {
    let dx = pos.x - center.x;
    let dy = pos.y - center.y;
    if dx.abs() >= dy.abs() {
        if dx >= 0.0 { Side::Left } else { Side::Right }
    } else if dy >= 0.0 {
        Side::Top
    } else {
        Side::Bottom
    }
}

/// Where a connector ends: the facing edge's midpoint, pushed out to the pin centre.
pub fn pin_target(pos: PointF, size: SizeF, side: Side, cfg: &RouteConfig) -> PointF {
    let mid = RectF::from_center(pos, size).edge_midpoint(side);
    let (ox, oy) = side.outward();
    let clearance = cfg.edge_clearance();
    mid.offset(ox * clearance, oy * clearance)
}

/// Coordinate of the first bend. Too short a first run gets pushed out by `bend_bias`.
fn bend_coord(from: f64, to: f64, fallback_dir: f64, cfg: &RouteConfig) -> f64 {
    if (to - from).abs() >= cfg.min_bend_clearance {
        return to;
    }
    let dir = if to > from {
        1.0
    } else if to < from {
        -1.0
    } else if fallback_dir < 0.0 {
        -1.0
    } else {
        1.0
    };
    from + dir * cfg.bend_bias
}

/// Route one panel's connector from its anchor.
///
/// Returns `None` when any input coordinate is not finite.
pub fn route(
    anchor: &AnchorPoint,
    pos: PointF,
    size: SizeF,
    center: PointF,
    cfg: &RouteConfig,
) -> Option<ConnectorPath> {
    if !pos.is_finite() || !center.is_finite() || !anchor.point().is_finite() {
        return None;
    }

    let side = facing_side(pos, center);
    let target = pin_target(pos, size, side, cfg);
    let start = anchor.point();
    let (ox, oy) = anchor.side.outward();
    let exit = start.offset(ox * cfg.stub_length, oy * cfg.stub_length);

    let (order, waypoints) = if side.is_horizontal() {
        let bend = bend_coord(exit.x, target.x, pos.x - center.x, cfg);
        (
            RouteOrder::HorizontalFirst,
            vec![
                start,
                exit,
                PointF::new(bend, exit.y),
                PointF::new(bend, target.y),
                target,
            ],
        )
    } else {
        let bend = bend_coord(exit.y, target.y, pos.y - center.y, cfg);
        (
            RouteOrder::VerticalFirst,
            vec![
                start,
                exit,
                PointF::new(exit.x, bend),
                PointF::new(target.x, bend),
                target,
            ],
        )
    };

    Some(ConnectorPath::from_waypoints(&anchor.id, order, waypoints))
}

/// Connector for an opened detail card: stub, one horizontal run, then down/up to the card.
pub fn route_detail(anchor: &AnchorPoint, target: PointF, cfg: &RouteConfig) -> Option<ConnectorPath> {
    if !target.is_finite() {
        return None;
    }
    let start = anchor.point();
    let (ox, oy) = anchor.side.outward();
    let exit = start.offset(ox * cfg.stub_length, oy * cfg.stub_length);
    let waypoints = vec![start, exit, PointF::new(target.x, exit.y), target];
    Some(ConnectorPath::from_waypoints(&anchor.id, RouteOrder::HorizontalFirst, waypoints))
}

/// Connector cache, one entry per panel.
///
/// A panel's path is recomputed only when its `RouteKey` changes.
#[derive(Debug, Default)]
pub struct Router {
    cache: HashMap<PanelId, (RouteKey, ConnectorPath)>,
    hits: u64,
    misses: u64,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(
        &mut self,
        panel: &PanelId,
        anchor: &AnchorPoint,
        pos: PointF,
        size: SizeF,
        center: PointF,
        cfg: &RouteConfig,
    ) -> Option<ConnectorPath> {
        let side = facing_side(pos, center);
        let target = pin_target(pos, size, side, cfg);
        let key = RouteKey {
            panel: panel.clone(),
            anchor: anchor.id.clone(),
            anchor_at: CoordBits::of(anchor.x, anchor.y),
            target: CoordBits::of(target.x, target.y),
            side,
            half: CoordBits::of(size.half_w(), size.half_h()),
        };

        if let Some((cached_key, path)) = self.cache.get(panel) {
            if *cached_key == key {
                self.hits += 1;
                return Some(path.clone());
            }
        }

        let path = route(anchor, pos, size, center, cfg)?;
        self.misses += 1;
        self.cache.insert(panel.clone(), (key, path.clone()));
        Some(path)
    }

    /// Drop cached entries for panels that are no longer routed.
    pub fn retain(&mut self, mut keep: impl FnMut(&PanelId) -> bool) {
        self.cache.retain(|id, _| keep(id));
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::generate_anchor_ring;

    fn ring() -> Vec<AnchorPoint> {
        generate_anchor_ring(PointF::new(500.0, 500.0), 200.0, 5)
    }

    fn anchor(id: &str) -> AnchorPoint {
        ring().into_iter().find(|a| a.id == id).unwrap()
    }

    fn assert_orthogonal(path: &ConnectorPath) {
        for w in path.waypoints.windows(2) {
            assert!(
                w[0].x == w[1].x || w[0].y == w[1].y,
                "diagonal segment {:?} -> {:?} in {}",
                w[0],
                w[1],
                path.d
            );
        }
    }

    #[test]
    fn test_facing_side() {
        let c = PointF::new(0.0, 0.0);
        assert_eq!(facing_side(PointF::new(300.0, 10.0), c), Side::Left);
        assert_eq!(facing_side(PointF::new(-300.0, 10.0), c), Side::Right);
        assert_eq!(facing_side(PointF::new(10.0, -300.0), c), Side::Bottom);
        assert_eq!(facing_side(PointF::new(10.0, 300.0), c), Side::Top);
    }

    #[test]
    fn test_straight_route_right() {
        let cfg = RouteConfig::default();
        let path = route(
            &anchor("R3"),
            PointF::new(850.0, 500.0),
            SizeF::new(200.0, 80.0),
            PointF::new(500.0, 500.0),
            &cfg,
        )
        .unwrap();

        assert_eq!(path.order, RouteOrder::HorizontalFirst);
        assert_eq!(path.d, "M 600 500 L 614 500 L 730 500");
        assert!((path.length - 130.0).abs() < 1e-9);
    }

    #[test]
    fn test_elbow_route_ends_at_pin() {
        let cfg = RouteConfig::default();
        let path = route(
            &anchor("R1"),
            PointF::new(850.0, 300.0),
            SizeF::new(200.0, 80.0),
            PointF::new(500.0, 500.0),
            &cfg,
        )
        .unwrap();

        assert_orthogonal(&path);
        assert_eq!(path.start(), Some(PointF::new(600.0, anchor("R1").y)));
        // Left edge at 750, pin 16 + 4 further out
        assert_eq!(path.end(), Some(PointF::new(730.0, 300.0)));
        assert_eq!(path.waypoints.len(), 4);
    }

    #[test]
    fn test_vertical_first_for_panels_above() {
        let cfg = RouteConfig::default();
        let path = route(
            &anchor("T3"),
            PointF::new(560.0, 150.0),
            SizeF::new(200.0, 80.0),
            PointF::new(500.0, 500.0),
            &cfg,
        )
        .unwrap();

        assert_eq!(path.order, RouteOrder::VerticalFirst);
        assert_orthogonal(&path);
        // Bottom edge at 190, pin at 210
        assert_eq!(path.end(), Some(PointF::new(560.0, 210.0)));
        // Stub goes up from the top of the chip
        assert_eq!(path.waypoints[1], PointF::new(500.0, 386.0));
    }

    #[test]
    fn test_short_first_run_gets_bias() {
        let cfg = RouteConfig::default();
        let path = route(
            &anchor("R3"),
            PointF::new(700.0, 480.0),
            SizeF::new(100.0, 40.0),
            PointF::new(500.0, 500.0),
            &cfg,
        )
        .unwrap();

        // Pin at x=630 is only 16 past the stub end at 614, so bend at 614 + 70
        assert_orthogonal(&path);
        assert_eq!(path.waypoints[2], PointF::new(684.0, 500.0));
        assert_eq!(path.end(), Some(PointF::new(630.0, 480.0)));
    }

    #[test]
    fn test_non_finite_position_is_unroutable() {
        let cfg = RouteConfig::default();
        let path = route(
            &anchor("R3"),
            PointF::new(f64::NAN, 0.0),
            SizeF::new(100.0, 40.0),
            PointF::new(500.0, 500.0),
            &cfg,
        );
        assert!(path.is_none());
    }

    #[test]
    fn test_router_cache_hit_is_identical() {
        let cfg = RouteConfig::default();
        let mut router = Router::new();
        let id = PanelId::from("skills");
        let a = anchor("R2");
        let pos = PointF::new(806.0, 449.0);
        let size = SizeF::new(218.0, 82.0);
        let center = PointF::new(500.0, 500.0);

        let first = router.route(&id, &a, pos, size, center, &cfg).unwrap();
        let second = router.route(&id, &a, pos, size, center, &cfg).unwrap();
        assert_eq!(first, second);
        assert_eq!(router.hits(), 1);
        assert_eq!(router.misses(), 1);

        // Moving the panel invalidates its entry
        let moved = router.route(&id, &a, pos.offset(40.0, 0.0), size, center, &cfg).unwrap();
        assert_ne!(moved.d, first.d);
        assert_eq!(router.misses(), 2);
    }

    #[test]
    fn test_router_cache_tracks_anchor_coordinates() {
        let cfg = RouteConfig::default();
        let mut router = Router::new();
        let id = PanelId::from("skills");
        let size = SizeF::new(218.0, 82.0);
        let pos = PointF::new(900.0, 500.0);

        let old = generate_anchor_ring(PointF::new(500.0, 500.0), 200.0, 5);
        let new = generate_anchor_ring(PointF::new(480.0, 500.0), 200.0, 5);
        let r3 = |ring: &[AnchorPoint]| ring.iter().find(|a| a.id == "R3").unwrap().clone();

        router.route(&id, &r3(&old), pos, size, PointF::new(500.0, 500.0), &cfg);
        router.route(&id, &r3(&new), pos, size, PointF::new(500.0, 500.0), &cfg);
        assert_eq!(router.hits(), 0);
        assert_eq!(router.misses(), 2);
    }

    #[test]
    fn test_detail_route() {
        let cfg = RouteConfig::default();
        let path = route_detail(&anchor("R3"), PointF::new(900.0, 600.0), &cfg).unwrap();
        assert_eq!(path.d, "M 600 500 L 614 500 L 900 500 L 900 600");
    }

    #[test]
    fn test_fractional_coordinates_are_rounded() {
        assert_eq!(fmt_coord(433.33333333), "433.33");
        assert_eq!(fmt_coord(-0.001), "0");
        assert_eq!(fmt_coord(12.5), "12.5");
    }
}
