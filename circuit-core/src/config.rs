//! Tuning constants for the whole core.
//!
//! Every section has defaults matching the live site, and every field is
//! optional in JSON so the host can override just what it needs.

use serde::{Deserialize, Serialize};

use crate::animation::AnimationConfig;
use crate::error::CoreError;
use crate::gesture::GestureConfig;
use crate::layout::{PinConfig, PointF, RouteConfig, SpacingConfig};
use crate::prefs::Preferences;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Scale applied to the startup layout offsets.
    pub layout_scale: f64,
    /// How long a dropped panel's trace carries the travelling pulse.
    pub signal_duration_ms: u64,
    /// Where an opened detail card sits relative to its panel.
    pub detail_offset: PointF,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            layout_scale: 0.85,
            signal_duration_ms: 1200,
            detail_offset: PointF::new(240.0, 40.0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitConfig {
    pub pins: PinConfig,
    pub route: RouteConfig,
    pub gesture: GestureConfig,
    pub spacing: SpacingConfig,
    pub animation: AnimationConfig,
    pub board: BoardConfig,
    /// Preferences at startup; the host updates them on toggle.
    pub prefs: Preferences,
}

impl CircuitConfig {
    /// Parse a (possibly partial) JSON override. Empty input means defaults.
    pub fn from_json(input: &str) -> Result<Self, CoreError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(input)?)
    }
}
