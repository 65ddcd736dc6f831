// Post-drop spacing relaxation.
//
// Only the moved panel moves. While it sits closer than `min_distance` to
// any other panel it is pushed outward along the ray from the chip centre.
// Bounded by `max_iterations`; the result is best effort, not a globally
// overlap-free layout.

use super::{PointF, SpacingConfig};
use crate::content::{Panel, PanelId};

#[derive(Debug, Clone, PartialEq)]
pub struct SpacingOutcome {
    pub position: PointF,
    /// Position after each push, in order.
    pub trail: Vec<PointF>,
    pub iterations: usize,
    /// False when the iteration bound was hit with a neighbour still too close.
    pub converged: bool,
}

impl SpacingOutcome {
    pub fn moved(&self) -> bool {
        !self.trail.is_empty()
    }
}

fn unit(dx: f64, dy: f64) -> Option<(f64, f64)> {
    let len = dx.hypot(dy);
    (len > f64::EPSILON).then(|| (dx / len, dy / len))
}

/// Direction to push `pos` away from `blocker`.
///
/// Radially outward from `center`, unless that ray points back toward the
/// blocker, in which case straight away from the blocker. A panel sitting
/// exactly on both goes up.
fn push_direction(pos: PointF, blocker: PointF, center: PointF) -> (f64, f64) {
    let radial = unit(pos.x - center.x, pos.y - center.y);
    let away = unit(pos.x - blocker.x, pos.y - blocker.y);

    match (radial, away) {
        (Some(r), Some(a)) if r.0 * a.0 + r.1 * a.1 < 0.0 => a,
        (Some(r), _) => r,
        (None, Some(a)) => a,
        (None, None) => (0.0, -1.0),
    }
}

/// Push `moved` until it clears every other positioned panel.
///
/// Returns `None` when the moved panel is unknown or has no position.
pub fn enforce_minimum_spacing(
    panels: &[Panel],
    moved: &PanelId,
    center: PointF,
    cfg: &SpacingConfig,
) -> Option<SpacingOutcome> {
    let mut pos = panels.iter().find(|p| &p.id == moved)?.pos?;
    let others: Vec<PointF> = panels
        .iter()
        .filter(|p| &p.id != moved)
        .filter_map(|p| p.pos)
        .collect();

    let first_blocker = |pos: PointF| {
        others.iter().find_map(|o| {
            let d = pos.distance(o);
            (d < cfg.min_distance).then_some((*o, d))
        })
    };

    let mut trail = Vec::new();
    let mut iterations = 0;

    while iterations < cfg.max_iterations {
        let Some((blocker, dist)) = first_blocker(pos) else {
            break;
        };
        iterations += 1;
        let (ux, uy) = push_direction(pos, blocker, center);
        let push = (cfg.min_distance - dist) + cfg.buffer;
        pos = pos.offset(ux * push, uy * push);
        trail.push(pos);
    }

    let converged = first_blocker(pos).is_none();
    if !converged {
        tracing::warn!(panel = %moved, iterations, "spacing did not converge");
    }

    Some(SpacingOutcome { position: pos, trail, iterations, converged })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::PanelKind;

    const CENTER: PointF = PointF::new(500.0, 500.0);

    fn panel(id: &str, x: f64, y: f64) -> Panel {
        Panel::new(id, PanelKind::List, Some(PointF::new(x, y)))
    }

    #[test]
    fn test_clear_panel_is_untouched() {
        let panels = vec![panel("a", 800.0, 500.0), panel("b", 200.0, 500.0)];
        let out = enforce_minimum_spacing(&panels, &PanelId::from("a"), CENTER, &SpacingConfig::default()).unwrap();
        assert_eq!(out.position, PointF::new(800.0, 500.0));
        assert!(!out.moved());
        assert!(out.converged);
        assert_eq!(out.iterations, 0);
    }

    #[test]
    fn test_two_crowded_panels_move_away_monotonically() {
        let cfg = SpacingConfig::default();
        let stationary = PointF::new(600.0, 500.0);
        // Both "a" and "b" are within min_distance of the stationary panel
        let panels = vec![
            panel("s", stationary.x, stationary.y),
            panel("b", 615.0, 510.0),
            panel("a", 610.0, 500.0),
        ];

        let out = enforce_minimum_spacing(&panels, &PanelId::from("a"), CENTER, &cfg).unwrap();
        assert!(out.converged);
        assert!(out.iterations >= 1);

        let mut last = PointF::new(610.0, 500.0).distance(&stationary);
        for p in &out.trail {
            let d = p.distance(&stationary);
            assert!(d > last, "distance shrank from {last} to {d}");
            last = d;
        }

        for other in panels.iter().filter(|p| p.id.as_str() != "a") {
            let d = out.position.distance(&other.pos.unwrap());
            assert!(d >= cfg.min_distance - 1e-9, "{} too close: {d}", other.id);
        }
    }

    #[test]
    fn test_iteration_bound_is_reported() {
        let cfg = SpacingConfig { max_iterations: 1, ..SpacingConfig::default() };
        let panels = vec![
            panel("s", 600.0, 500.0),
            panel("b", 615.0, 510.0),
            panel("a", 610.0, 500.0),
        ];
        let out = enforce_minimum_spacing(&panels, &PanelId::from("a"), CENTER, &cfg).unwrap();
        // One push clears "s" but lands too close to "b"; accepted degenerate case
        assert_eq!(out.iterations, 1);
        assert!(!out.converged);
    }

    #[test]
    fn test_blocker_further_out_pushes_inward() {
        let panels = vec![panel("s", 600.0, 500.0), panel("a", 580.0, 500.0)];
        let out = enforce_minimum_spacing(&panels, &PanelId::from("a"), CENTER, &SpacingConfig::default()).unwrap();
        assert_eq!(out.position, PointF::new(563.0, 500.0));
        assert!(out.converged);
    }

    #[test]
    fn test_panel_on_center_goes_up() {
        let panels = vec![panel("s", 500.0, 500.0), panel("a", 500.0, 500.0)];
        let out = enforce_minimum_spacing(&panels, &PanelId::from("a"), CENTER, &SpacingConfig::default()).unwrap();
        assert_eq!(out.position, PointF::new(500.0, 463.0));
    }

    #[test]
    fn test_unknown_or_unplaced_panel() {
        let panels = vec![Panel::new("ghost", PanelKind::List, None)];
        let cfg = SpacingConfig::default();
        assert!(enforce_minimum_spacing(&panels, &PanelId::from("ghost"), CENTER, &cfg).is_none());
        assert!(enforce_minimum_spacing(&panels, &PanelId::from("nope"), CENTER, &cfg).is_none());
    }
}
