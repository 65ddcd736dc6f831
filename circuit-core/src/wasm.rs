//! WASM bindings for the circuit-core library.
//!
//! All functions exposed to JavaScript via wasm-bindgen are defined here.
//! Results cross the boundary as JSON strings; errors are logged to the
//! console and returned as `{"error": "..."}`.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::board::{Board, BoardEvent};
use crate::config::CircuitConfig;
use crate::content::{Panel, PanelId};
use crate::error::CoreError;
use crate::layout::{generate_anchor_ring, PointF, SizeF};
use crate::prefs::{Preferences, Theme};

#[wasm_bindgen]
extern "C" {
    pub fn alert(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = log)]
    pub fn console_log(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    pub fn console_error(s: &str);
}

#[derive(Serialize)]
struct ErrorOutput {
    error: String,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| error_json(&e.to_string()))
}

fn error_json(message: &str) -> String {
    serde_json::to_string(&ErrorOutput { error: message.to_string() })
        .unwrap_or_else(|_| r#"{"error":"unserializable error"}"#.to_string())
}

fn events_or_error(result: Result<Vec<BoardEvent>, CoreError>) -> String {
    match result {
        Ok(events) => to_json(&events),
        Err(e) => {
            console_error(&format!("circuit-core: {e}"));
            error_json(&e.to_string())
        }
    }
}

/// JS timestamps (`performance.now()`) are fractional milliseconds.
fn millis(now: f64) -> u64 {
    if now.is_finite() && now > 0.0 { now as u64 } else { 0 }
}

/// The board as seen from JavaScript.
#[wasm_bindgen]
pub struct CircuitBoard {
    board: Board,
}

#[wasm_bindgen]
impl CircuitBoard {
    /// `panels_json` is the content list; `config_json` may be empty for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(panels_json: &str, config_json: &str, center_x: f64, center_y: f64) -> Result<CircuitBoard, JsValue> {
        let build = || -> Result<Board, CoreError> {
            let panels: Vec<Panel> = serde_json::from_str(panels_json)?;
            let config = CircuitConfig::from_json(config_json)?;
            Board::new(panels, PointF::new(center_x, center_y), config)
        };
        match build() {
            Ok(board) => Ok(CircuitBoard { board }),
            Err(e) => {
                console_error(&format!("Error creating board: {e}"));
                Err(JsValue::from_str(&e.to_string()))
            }
        }
    }

    pub fn set_center(&mut self, x: f64, y: f64) {
        self.board.set_center(PointF::new(x, y));
    }

    pub fn set_chip_size(&mut self, size: f64) {
        self.board.set_chip_size(size);
    }

    /// Report a panel's rendered size. Returns false for unknown panels.
    pub fn measure_panel(&mut self, id: &str, w: f64, h: f64) -> bool {
        match self.board.measure_panel(&PanelId::from(id), SizeF::new(w, h)) {
            Ok(()) => true,
            Err(e) => {
                console_error(&format!("circuit-core: {e}"));
                false
            }
        }
    }

    pub fn pointer_down(&mut self, id: &str, x: f64, y: f64, now: f64) -> String {
        events_or_error(self.board.pointer_down(&PanelId::from(id), PointF::new(x, y), millis(now)))
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, now: f64) -> String {
        to_json(&self.board.pointer_move(PointF::new(x, y), millis(now)))
    }

    pub fn pointer_up(&mut self, now: f64) -> String {
        to_json(&self.board.pointer_up(millis(now)))
    }

    pub fn pointer_leave(&mut self, now: f64) -> String {
        to_json(&self.board.pointer_leave(millis(now)))
    }

    /// Fire timers that fell due; call from a `setTimeout` armed with `next_deadline`.
    pub fn advance(&mut self, now: f64) -> String {
        to_json(&self.board.advance(millis(now)))
    }

    pub fn animation_frame(&mut self, now: f64) -> String {
        to_json(&self.board.animation_frame(millis(now)))
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.board.next_deadline().map(|t| t as f64)
    }

    pub fn toggle(&mut self, id: &str) -> String {
        events_or_error(self.board.toggle(&PanelId::from(id)))
    }

    pub fn toggle_all(&mut self) -> String {
        to_json(&self.board.toggle_all())
    }

    pub fn track_pointer(&mut self, x: f64, y: f64) -> String {
        to_json(&self.board.track_pointer(PointF::new(x, y)))
    }

    pub fn open_detail(&mut self, panel_id: &str, item_id: &str) -> bool {
        match self.board.open_detail(&PanelId::from(panel_id), item_id) {
            Ok(()) => true,
            Err(e) => {
                console_error(&format!("circuit-core: {e}"));
                false
            }
        }
    }

    pub fn close_detail(&mut self) {
        self.board.close_detail();
    }

    pub fn set_reduced_motion(&mut self, on: bool) {
        let prefs = self.board.preferences();
        self.board.set_preferences(Preferences { reduced_motion: on, ..prefs });
    }

    /// Accepts "dark" or "light"; anything else is logged and ignored.
    pub fn set_theme(&mut self, theme: &str) -> bool {
        match theme.parse::<Theme>() {
            Ok(theme) => {
                let prefs = self.board.preferences();
                self.board.set_preferences(Preferences { theme, ..prefs });
                true
            }
            Err(e) => {
                console_error(&format!("circuit-core: {e}"));
                false
            }
        }
    }

    pub fn request_refresh(&mut self) {
        self.board.request_refresh();
    }

    /// Everything to draw, as JSON.
    pub fn frame(&mut self) -> String {
        to_json(&self.board.frame())
    }

    pub fn teardown(&mut self) {
        self.board.teardown();
    }
}

/// Anchor ring for a chip, as a JSON array.
#[wasm_bindgen]
pub fn anchor_ring(center_x: f64, center_y: f64, size: f64, per_side: usize) -> String {
    to_json(&generate_anchor_ring(PointF::new(center_x, center_y), size, per_side))
}

/// Centre of the browser viewport as `{"x":..,"y":..}`.
#[wasm_bindgen]
pub fn viewport_center() -> String {
    let center = web_sys::window()
        .and_then(|w| {
            let width = w.inner_width().ok()?.as_f64()?;
            let height = w.inner_height().ok()?.as_f64()?;
            Some(PointF::new(width / 2.0, height / 2.0))
        })
        .unwrap_or_default();
    to_json(&center)
}
