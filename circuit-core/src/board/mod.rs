//! The board: single owner of the panel list and all transient state.
//!
//! The render layer forwards raw pointer input and the current time; the
//! board routes input to the captured panel's gesture machine, carries out
//! the resulting effects, and fires deferred work (press delays, signal
//! pulses) when the clock passes their deadline. `frame()` then produces
//! everything that must be drawn.

mod timers;

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::animation::TraceAnimator;
use crate::config::CircuitConfig;
use crate::content::{seed_panels, Panel, PanelId};
use crate::error::CoreError;
use crate::gesture::{CaptureScope, Effect, GestureEvent, GesturePhase, PressDragMachine};
use crate::layout::{
    assign_pins, enforce_minimum_spacing, generate_anchor_ring, nearest_anchor, route_detail, AnchorPoint,
    ConnectorPath, PointF, RectF, Router, SizeF,
};
use crate::output::{ConnectorOutput, FrameOutput, PanelOutput};
use crate::prefs::Preferences;

pub use timers::{TimerKind, TimerQueue};

/// Trace id used for the detail card connector.
pub const DETAIL_TRACE: &str = "detail";

/// Something the render layer may want to react to immediately.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoardEvent {
    Toggled { id: PanelId, open: bool },
    Detached { id: PanelId, at: PointF },
    Moved { id: PanelId, at: PointF },
    /// `at` is the committed position after spacing.
    Dropped { id: PanelId, at: PointF, nudged: bool },
    /// Moved by the spacing resolver after a reveal.
    Nudged { id: PanelId, at: PointF },
    SignalCleared { id: PanelId },
    HighlightChanged { id: Option<PanelId> },
}

#[derive(Debug, Clone, PartialEq)]
struct DetailView {
    panel: PanelId,
    item: String,
}

pub struct Board {
    config: CircuitConfig,
    center: PointF,
    anchors: Vec<AnchorPoint>,
    panels: Vec<Panel>,
    sizes: HashMap<PanelId, SizeF>,
    machines: HashMap<PanelId, PressDragMachine>,
    capture: CaptureScope,
    captured: Option<PanelId>,
    detaching: BTreeSet<PanelId>,
    signal: BTreeSet<PanelId>,
    revealed: BTreeSet<PanelId>,
    highlighted: Option<PanelId>,
    detail: Option<DetailView>,
    prefs: Preferences,
    timers: TimerQueue,
    router: Router,
    animator: TraceAnimator,
    refresh_pending: bool,
    refresh_token: u32,
    now: u64,
    alive: bool,
}

impl Board {
    /// Build a board from the content provider's panels.
    ///
    /// Panels without a position are placed from the startup layout when
    /// their id is known, otherwise they stay unplaced and unrouted.
    pub fn new(mut panels: Vec<Panel>, center: PointF, config: CircuitConfig) -> Result<Self, CoreError> {
        let mut seen = HashSet::new();
        for panel in &panels {
            if !seen.insert(panel.id.clone()) {
                return Err(CoreError::DuplicatePanel(panel.id.clone()));
            }
        }

        seed_panels(&mut panels, center, config.board.layout_scale);
        let anchors = generate_anchor_ring(center, config.pins.chip_size, config.pins.per_side);
        let machines = panels.iter().map(|p| (p.id.clone(), PressDragMachine::new())).collect();

        tracing::debug!(panels = panels.len(), anchors = anchors.len(), "board created");

        Ok(Board {
            prefs: config.prefs,
            config,
            center,
            anchors,
            panels,
            sizes: HashMap::new(),
            machines,
            capture: CaptureScope::new(),
            captured: None,
            detaching: BTreeSet::new(),
            signal: BTreeSet::new(),
            revealed: BTreeSet::new(),
            highlighted: None,
            detail: None,
            timers: TimerQueue::new(),
            router: Router::new(),
            animator: TraceAnimator::new(),
            // Paths are refreshed once after the host's first painted frame.
            refresh_pending: true,
            refresh_token: 0,
            now: 0,
            alive: true,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn panel(&self, id: &PanelId) -> Option<&Panel> {
        self.panels.iter().find(|p| &p.id == id)
    }

    pub fn anchors(&self) -> &[AnchorPoint] {
        &self.anchors
    }

    pub fn center(&self) -> PointF {
        self.center
    }

    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    pub fn preferences(&self) -> Preferences {
        self.prefs
    }

    pub fn is_detaching(&self, id: &PanelId) -> bool {
        self.detaching.contains(id)
    }

    pub fn has_signal(&self, id: &PanelId) -> bool {
        self.signal.contains(id)
    }

    pub fn is_revealed(&self, id: &PanelId) -> bool {
        self.revealed.contains(id)
    }

    pub fn highlighted(&self) -> Option<&PanelId> {
        self.highlighted.as_ref()
    }

    /// Panel whose gesture currently receives global pointer input.
    pub fn captured(&self) -> Option<&PanelId> {
        self.captured.as_ref()
    }

    /// Live capture holders; zero whenever no gesture is in progress.
    pub fn capture_count(&self) -> usize {
        self.capture.active()
    }

    pub fn gesture_phase(&self, id: &PanelId) -> Option<GesturePhase> {
        self.machines.get(id).map(PressDragMachine::phase)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn panel_size(&self, id: &PanelId) -> SizeF {
        self.sizes.get(id).copied().unwrap_or(self.config.route.default_panel_size)
    }

    fn require(&self, id: &PanelId) -> Result<usize, CoreError> {
        self.panels
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| CoreError::UnknownPanel(id.clone()))
    }

    fn set_pos(&mut self, id: &PanelId, at: PointF) {
        if let Some(panel) = self.panels.iter_mut().find(|p| &p.id == id) {
            panel.pos = Some(at);
        }
    }

    // ------------------------------------------------------------------
    // Geometry inputs
    // ------------------------------------------------------------------

    pub fn set_center(&mut self, center: PointF) {
        if !center.is_finite() {
            tracing::debug!(?center, "ignoring non-finite centre");
            return;
        }
        self.center = center;
        self.regenerate_anchors();
    }

    pub fn set_chip_size(&mut self, size: f64) {
        if !size.is_finite() || size <= 0.0 {
            tracing::debug!(size, "ignoring invalid chip size");
            return;
        }
        self.config.pins.chip_size = size;
        self.regenerate_anchors();
    }

    fn regenerate_anchors(&mut self) {
        self.anchors = generate_anchor_ring(self.center, self.config.pins.chip_size, self.config.pins.per_side);
    }

    /// Record a panel's rendered size; routing targets its real edges from now on.
    pub fn measure_panel(&mut self, id: &PanelId, size: SizeF) -> Result<(), CoreError> {
        self.require(id)?;
        if !(size.w.is_finite() && size.h.is_finite()) || size.w <= 0.0 || size.h <= 0.0 {
            tracing::debug!(panel = %id, ?size, "ignoring invalid measurement");
            return Ok(());
        }
        self.sizes.insert(id.clone(), size);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, id: &PanelId, pointer: PointF, now: u64) -> Result<Vec<BoardEvent>, CoreError> {
        let idx = self.require(id)?;
        let mut events = self.advance(now);
        if !self.alive {
            return Ok(events);
        }

        if let Some(active) = &self.captured {
            tracing::debug!(panel = %id, captured = %active, "pointer already captured, ignoring press");
            return Ok(events);
        }
        let Some(origin) = self.panels[idx].pos else {
            tracing::debug!(panel = %id, "press on unplaced panel ignored");
            return Ok(events);
        };

        events.extend(self.dispatch(id, GestureEvent::PointerDown { pointer, origin }));
        Ok(events)
    }

    pub fn pointer_move(&mut self, pointer: PointF, now: u64) -> Vec<BoardEvent> {
        self.forward(GestureEvent::PointerMove { pointer }, now)
    }

    pub fn pointer_up(&mut self, now: u64) -> Vec<BoardEvent> {
        self.forward(GestureEvent::PointerUp, now)
    }

    pub fn pointer_leave(&mut self, now: u64) -> Vec<BoardEvent> {
        self.forward(GestureEvent::PointerLeave, now)
    }

    /// Global pointer input goes to whichever panel holds capture, if any.
    fn forward(&mut self, event: GestureEvent, now: u64) -> Vec<BoardEvent> {
        let mut events = self.advance(now);
        if let Some(id) = self.captured.clone() {
            events.extend(self.dispatch(&id, event));
        }
        events
    }

    /// Fire every timer due at or before `now`, earliest first.
    pub fn advance(&mut self, now: u64) -> Vec<BoardEvent> {
        if !self.alive {
            return vec![];
        }
        self.now = self.now.max(now);

        let mut events = Vec::new();
        while let Some(kind) = self.timers.pop_due(self.now) {
            match kind {
                TimerKind::Press { panel, token } => {
                    events.extend(self.dispatch(&panel, GestureEvent::PressTimerElapsed { token }));
                }
                TimerKind::ClearSignal { panel } => {
                    if self.signal.remove(&panel) {
                        events.push(BoardEvent::SignalCleared { id: panel });
                    }
                }
            }
        }
        events
    }

    fn dispatch(&mut self, id: &PanelId, event: GestureEvent) -> Vec<BoardEvent> {
        let Some(machine) = self.machines.get_mut(id) else {
            return vec![];
        };
        let effects = machine.handle(event, &self.config.gesture, &self.capture);

        let mut events = Vec::new();
        for effect in effects {
            self.apply(id, effect, &mut events);
        }
        events
    }

    fn apply(&mut self, id: &PanelId, effect: Effect, events: &mut Vec<BoardEvent>) {
        match effect {
            Effect::CaptureAcquired => self.captured = Some(id.clone()),
            Effect::CaptureReleased => {
                if self.captured.as_ref() == Some(id) {
                    self.captured = None;
                }
            }
            Effect::StartPressTimer { token, delay_ms } => {
                self.timers.schedule(self.now + delay_ms, TimerKind::Press { panel: id.clone(), token });
            }
            Effect::CancelPressTimer { token } => {
                self.timers.cancel(&TimerKind::Press { panel: id.clone(), token });
            }
            Effect::Toggle => events.extend(self.flip_revealed(id)),
            Effect::Detach { at } => {
                self.set_pos(id, at);
                self.detaching.insert(id.clone());
                events.push(BoardEvent::Detached { id: id.clone(), at });
            }
            Effect::MoveTo { at } => {
                self.set_pos(id, at);
                events.push(BoardEvent::Moved { id: id.clone(), at });
            }
            Effect::Drop { at } => events.push(self.commit_drop(id, at)),
        }
    }

    /// Drop commit: position, flags, signal timer and spacing in one step.
    fn commit_drop(&mut self, id: &PanelId, at: PointF) -> BoardEvent {
        self.set_pos(id, at);
        self.detaching.remove(id);
        self.signal.insert(id.clone());
        self.timers.schedule(
            self.now + self.config.board.signal_duration_ms,
            TimerKind::ClearSignal { panel: id.clone() },
        );

        let settled = self.settle(id).unwrap_or(at);
        BoardEvent::Dropped { id: id.clone(), at: settled, nudged: settled != at }
    }

    /// Run the spacing resolver on one panel and commit its result.
    fn settle(&mut self, id: &PanelId) -> Option<PointF> {
        let outcome = enforce_minimum_spacing(&self.panels, id, self.center, &self.config.spacing)?;
        if outcome.moved() {
            self.set_pos(id, outcome.position);
        }
        Some(outcome.position)
    }

    // ------------------------------------------------------------------
    // Reveal state
    // ------------------------------------------------------------------

    pub fn toggle(&mut self, id: &PanelId) -> Result<Vec<BoardEvent>, CoreError> {
        self.require(id)?;
        if !self.alive {
            return Ok(vec![]);
        }
        Ok(self.flip_revealed(id))
    }

    fn flip_revealed(&mut self, id: &PanelId) -> Vec<BoardEvent> {
        let open = !self.revealed.remove(id);
        if open {
            self.revealed.insert(id.clone());
        }
        let mut events = vec![BoardEvent::Toggled { id: id.clone(), open }];
        if open {
            events.extend(self.nudge(id));
        }
        events
    }

    /// An expanded panel grows, so re-check its spacing.
    fn nudge(&mut self, id: &PanelId) -> Option<BoardEvent> {
        let before = self.panel(id)?.pos?;
        let after = self.settle(id)?;
        (after != before).then(|| BoardEvent::Nudged { id: id.clone(), at: after })
    }

    /// Open every panel, or close them all when all are already open.
    pub fn toggle_all(&mut self) -> Vec<BoardEvent> {
        if !self.alive {
            return vec![];
        }
        let ids: Vec<PanelId> = self.panels.iter().map(|p| p.id.clone()).collect();
        let all_open = ids.iter().all(|id| self.revealed.contains(id));

        let mut events = Vec::new();
        if all_open {
            for id in ids {
                self.revealed.remove(&id);
                events.push(BoardEvent::Toggled { id, open: false });
            }
        } else {
            for id in ids {
                if self.revealed.insert(id.clone()) {
                    events.push(BoardEvent::Toggled { id: id.clone(), open: true });
                    events.extend(self.nudge(&id));
                }
            }
        }
        events
    }

    // ------------------------------------------------------------------
    // Highlight, detail card, preferences
    // ------------------------------------------------------------------

    /// Highlight the panel nearest to the tracked pointer.
    pub fn track_pointer(&mut self, point: PointF) -> Vec<BoardEvent> {
        if !self.alive || !point.is_finite() {
            return vec![];
        }
        let nearest = self
            .panels
            .iter()
            .filter_map(|p| p.pos.map(|pos| (&p.id, pos.distance_sq(&point))))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id.clone());

        if nearest == self.highlighted {
            return vec![];
        }
        self.highlighted = nearest.clone();
        vec![BoardEvent::HighlightChanged { id: nearest }]
    }

    pub fn open_detail(&mut self, panel: &PanelId, item: &str) -> Result<(), CoreError> {
        self.require(panel)?;
        self.detail = Some(DetailView { panel: panel.clone(), item: item.to_string() });
        Ok(())
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    /// Item id of the open detail card.
    pub fn detail_item(&self) -> Option<&str> {
        self.detail.as_ref().map(|d| d.item.as_str())
    }

    pub fn set_preferences(&mut self, prefs: Preferences) {
        self.prefs = prefs;
    }

    // ------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------

    /// Ask for one path refresh on the next animation frame.
    pub fn request_refresh(&mut self) {
        self.refresh_pending = true;
    }

    /// Called from the host's animation-frame callback.
    pub fn animation_frame(&mut self, now: u64) -> Vec<BoardEvent> {
        let events = self.advance(now);
        if self.alive && self.refresh_pending {
            self.refresh_pending = false;
            if self.refresh_token == 0 {
                self.refresh_token = 1;
            }
            self.router.clear();
        }
        events
    }

    /// Routed connectors for every placed panel that got an anchor, in panel order.
    pub fn connectors(&mut self) -> Vec<(PanelId, ConnectorPath)> {
        let assignment = assign_pins(&self.panels, &self.anchors);
        let mut routed = Vec::with_capacity(self.panels.len());

        for panel in &self.panels {
            let (Some(pos), Some(anchor)) = (panel.pos, assignment.get(&panel.id)) else {
                continue;
            };
            let size = self.sizes.get(&panel.id).copied().unwrap_or(self.config.route.default_panel_size);
            if let Some(path) = self.router.route(&panel.id, anchor, pos, size, self.center, &self.config.route) {
                routed.push((panel.id.clone(), path));
            }
        }

        self.router.retain(|id| routed.iter().any(|(rid, _)| rid == id));
        routed
    }

    fn detail_connector(&self) -> Option<ConnectorPath> {
        let view = self.detail.as_ref()?;
        let offset = self.config.board.detail_offset;
        let target = self.panel(&view.panel)?.pos?.offset(offset.x, offset.y);
        let anchor = nearest_anchor(&self.anchors, target)?;
        route_detail(anchor, target, &self.config.route)
    }

    /// Everything the render layer draws this frame.
    pub fn frame(&mut self) -> FrameOutput {
        let routed = self.connectors();
        let detail = self.detail_connector();

        let mut traces: Vec<(&str, &ConnectorPath)> = routed.iter().map(|(id, p)| (id.as_str(), p)).collect();
        if let Some(path) = &detail {
            traces.push((DETAIL_TRACE, path));
        }
        let detaching: BTreeSet<String> = self.detaching.iter().map(|id| id.0.clone()).collect();
        let cues = self.animator.update(&traces, &detaching, self.prefs.reduced_motion, &self.config.animation);

        let connectors = routed
            .iter()
            .map(|(id, path)| ConnectorOutput {
                id: id.0.clone(),
                anchor: path.anchor.clone(),
                d: path.d.clone(),
                length: path.length,
                order: path.order,
                waypoints: path.waypoints.clone(),
                detaching: self.detaching.contains(id),
                signal: self.signal.contains(id),
                highlighted: self.highlighted.as_ref() == Some(id),
            })
            .collect();

        let detail = detail.map(|path| ConnectorOutput {
            id: DETAIL_TRACE.to_string(),
            anchor: path.anchor,
            d: path.d,
            length: path.length,
            order: path.order,
            waypoints: path.waypoints,
            detaching: false,
            signal: false,
            highlighted: false,
        });

        let panels = self
            .panels
            .iter()
            .map(|p| PanelOutput {
                id: p.id.0.clone(),
                label: p.label.clone(),
                kind: p.kind,
                pos: p.pos,
                bounds: p.pos.map(|pos| RectF::from_center(pos, self.panel_size(&p.id))),
                revealed: self.revealed.contains(&p.id),
                highlighted: self.highlighted.as_ref() == Some(&p.id),
                detaching: self.detaching.contains(&p.id),
            })
            .collect();

        FrameOutput {
            anchors: self.anchors.clone(),
            panels,
            connectors,
            detail,
            cues,
            highlighted: self.highlighted.as_ref().map(|id| id.0.clone()),
            captured: self.captured.as_ref().map(|id| id.0.clone()),
            theme: self.prefs.theme,
            reduced_motion: self.prefs.reduced_motion,
            all_revealed: !self.panels.is_empty() && self.panels.iter().all(|p| self.revealed.contains(&p.id)),
            refresh_token: self.refresh_token,
        }
    }

    /// Cancel all pending work and release capture. Later input is ignored.
    pub fn teardown(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.timers.clear();
        for machine in self.machines.values_mut() {
            machine.handle(GestureEvent::Teardown, &self.config.gesture, &self.capture);
        }
        self.captured = None;
        self.detaching.clear();
        tracing::debug!("board torn down");
    }
}
