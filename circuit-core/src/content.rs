//! Panel definitions handed over by the content provider.
//!
//! The payload of a panel is opaque to the core; only `id` and `pos`
//! take part in geometry. Positions missing from the input are seeded
//! from the startup table when the id is one of the known panels.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::layout::PointF;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelId(pub String);

impl PanelId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PanelId {
    fn from(s: &str) -> Self {
        PanelId(s.to_string())
    }
}

/// How the render layer lays out a panel's content.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelKind {
    List,
    Tags,
    Links,
    Certs,
    Projects,
    /// Anything the core doesn't know; still placed and routed.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub id: PanelId,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_kind", alias = "type")]
    pub kind: PanelKind,
    #[serde(default)]
    pub content: Value,
    /// Panel centre. `None` means the panel cannot be routed.
    #[serde(default)]
    pub pos: Option<PointF>,
}

fn default_kind() -> PanelKind {
    PanelKind::Unknown
}

impl Panel {
    pub fn new(id: &str, kind: PanelKind, pos: Option<PointF>) -> Self {
        Panel {
            id: PanelId::from(id),
            label: id.to_string(),
            kind,
            content: Value::Null,
            pos,
        }
    }
}

/// Startup offsets from the chip centre, before scaling.
pub const SEED_LAYOUT: &[(&str, f64, f64)] = &[
    ("about", 0.0, -340.0),
    ("skills", 360.0, -60.0),
    ("projects", 420.0, 80.0),
    ("links", 0.0, 360.0),
    ("certs", -420.0, -40.0),
    ("experience", -340.0, 240.0),
];

/// Startup position of a known panel id.
pub fn seed_position(id: &PanelId, center: PointF, scale: f64) -> Option<PointF> {
    SEED_LAYOUT
        .iter()
        .find(|(seed_id, _, _)| *seed_id == id.as_str())
        .map(|&(_, dx, dy)| PointF { x: center.x + dx * scale, y: center.y + dy * scale })
}

/// Fill in missing positions from the seed table. Unknown ids stay unplaced.
pub fn seed_panels(panels: &mut [Panel], center: PointF, scale: f64) {
    for panel in panels.iter_mut() {
        if panel.pos.is_none() {
            panel.pos = seed_position(&panel.id, center, scale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_panel_json() {
        let json = r#"{"id":"skills","label":"Skills","type":"tags","content":["Rust","React"]}"#;
        let panel: Panel = serde_json::from_str(json).unwrap();
        assert_eq!(panel.id, PanelId::from("skills"));
        assert_eq!(panel.kind, PanelKind::Tags);
        assert!(panel.pos.is_none());
        assert_eq!(panel.content.as_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn test_unknown_kind_is_kept() {
        let panel: Panel = serde_json::from_str(r#"{"id":"x","kind":"gallery"}"#).unwrap();
        assert_eq!(panel.kind, PanelKind::Unknown);
    }

    #[test]
    fn test_seed_positions() {
        let mut panels = vec![
            Panel::new("about", PanelKind::List, None),
            Panel::new("links", PanelKind::Links, Some(PointF::new(1.0, 2.0))),
            Panel::new("blog", PanelKind::List, None),
        ];
        seed_panels(&mut panels, PointF::new(500.0, 500.0), 0.85);

        assert_eq!(panels[0].pos, Some(PointF::new(500.0, 500.0 - 340.0 * 0.85)));
        // Explicit positions win over the seed table
        assert_eq!(panels[1].pos, Some(PointF::new(1.0, 2.0)));
        assert_eq!(panels[2].pos, None);
    }
}
