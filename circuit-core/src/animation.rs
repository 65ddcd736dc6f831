//! Trace animation cues.
//!
//! The render layer owns timing curves and stroke styling; the core only
//! decides which trace should retract or grow in a given frame. A trace
//! retracts when its panel starts detaching, grows when the panel is
//! dropped, when it first appears, and when its geometry changed while not
//! being dragged. Under reduced motion every cue is instantaneous.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::layout::ConnectorPath;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub retract_ms: u64,
    pub grow_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self { retract_ms: 440, grow_ms: 520 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CueKind {
    Retract,
    Grow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceCue {
    pub id: String,
    pub kind: CueKind,
    /// 0 means snap to the end state.
    pub duration_ms: u64,
    /// Path length, used as the dash array/offset.
    pub length: f64,
}

/// Remembers last frame's traces so it can tell what changed.
#[derive(Debug, Default)]
pub struct TraceAnimator {
    prev_paths: HashMap<String, String>,
    prev_detaching: BTreeSet<String>,
}

impl TraceAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare this frame against the previous one and emit at most one cue per trace.
    pub fn update<'a>(
        &mut self,
        paths: &[(&'a str, &'a ConnectorPath)],
        detaching: &BTreeSet<String>,
        reduced_motion: bool,
        cfg: &AnimationConfig,
    ) -> Vec<TraceCue> {
        let duration = |ms: u64| if reduced_motion { 0 } else { ms };
        let length_of = |id: &str| {
            paths
                .iter()
                .find(|(pid, _)| *pid == id)
                .map(|(_, p)| p.length)
                .unwrap_or(0.0)
        };

        let mut cues: Vec<TraceCue> = Vec::new();

        for id in self.prev_detaching.union(detaching) {
            let was = self.prev_detaching.contains(id);
            let is = detaching.contains(id);
            let cue = match (was, is) {
                (false, true) => Some((CueKind::Retract, cfg.retract_ms)),
                (true, false) => Some((CueKind::Grow, cfg.grow_ms)),
                _ => None,
            };
            if let Some((kind, ms)) = cue {
                cues.push(TraceCue { id: id.clone(), kind, duration_ms: duration(ms), length: length_of(id) });
            }
        }

        for (id, path) in paths {
            if cues.iter().any(|c| c.id == *id) {
                continue;
            }
            let grow = match self.prev_paths.get(*id) {
                None => true,
                Some(prev) => *prev != path.d && !detaching.contains(*id),
            };
            if grow {
                cues.push(TraceCue {
                    id: id.to_string(),
                    kind: CueKind::Grow,
                    duration_ms: duration(cfg.grow_ms),
                    length: path.length,
                });
            }
        }

        self.prev_paths = paths.iter().map(|(id, p)| (id.to_string(), p.d.clone())).collect();
        self.prev_detaching = detaching.clone();
        cues
    }

    /// Forget everything; the next frame grows every trace from zero.
    pub fn reset(&mut self) {
        self.prev_paths.clear();
        self.prev_detaching.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{generate_anchor_ring, route, PointF, RouteConfig, SizeF};

    fn path_to(x: f64) -> ConnectorPath {
        let ring = generate_anchor_ring(PointF::new(500.0, 500.0), 200.0, 5);
        let r3 = ring.iter().find(|a| a.id == "R3").unwrap();
        route(r3, PointF::new(x, 500.0), SizeF::new(200.0, 80.0), PointF::new(500.0, 500.0), &RouteConfig::default())
            .unwrap()
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_trace_grows() {
        let mut anim = TraceAnimator::new();
        let p = path_to(850.0);
        let cues = anim.update(&[("skills", &p)], &set(&[]), false, &AnimationConfig::default());
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].kind, CueKind::Grow);
        assert_eq!(cues[0].duration_ms, 520);

        // Unchanged next frame: nothing to do
        let cues = anim.update(&[("skills", &p)], &set(&[]), false, &AnimationConfig::default());
        assert!(cues.is_empty());
    }

    #[test]
    fn test_drag_retracts_then_grows() {
        let cfg = AnimationConfig::default();
        let mut anim = TraceAnimator::new();
        let start = path_to(850.0);
        anim.update(&[("skills", &start)], &set(&[]), false, &cfg);

        let cues = anim.update(&[("skills", &start)], &set(&["skills"]), false, &cfg);
        assert_eq!(cues[0].kind, CueKind::Retract);
        assert_eq!(cues[0].duration_ms, 440);

        // Geometry changes while detached are silent
        let mid = path_to(900.0);
        assert!(anim.update(&[("skills", &mid)], &set(&["skills"]), false, &cfg).is_empty());

        let end = path_to(950.0);
        let cues = anim.update(&[("skills", &end)], &set(&[]), false, &cfg);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].kind, CueKind::Grow);
        assert_eq!(cues[0].length, end.length);
    }

    #[test]
    fn test_reduced_motion_is_instant() {
        let mut anim = TraceAnimator::new();
        let p = path_to(850.0);
        let cues = anim.update(&[("skills", &p)], &set(&["skills"]), true, &AnimationConfig::default());
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].duration_ms, 0);
    }
}
