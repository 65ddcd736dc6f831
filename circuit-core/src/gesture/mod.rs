//! Long-press-to-drag gesture recognition for a single panel.
//!
//! `step` is the pure transition function: it takes the current state and
//! one input event and returns the next state plus the effects the owner
//! has to carry out (schedule or cancel the press timer, toggle the panel,
//! move it, drop it). `PressDragMachine` owns the state between events.
//!
//! ```text
//! Idle --down--> Pressing --timer--> Dragging --up/leave--> Idle (drop)
//!                   |  \--up/leave--> Idle (toggle)
//!                   \----move > jitter--> Idle (nothing)
//! ```

mod capture;

use serde::{Deserialize, Serialize};

use crate::layout::PointF;

pub use capture::{CaptureGuard, CaptureScope};

/// Identifies one scheduled press timer; stale tokens are ignored.
pub type TimerToken = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Hold time before a press turns into a drag.
    pub press_delay_ms: u64,
    /// Pointer travel that cancels a pending press.
    pub jitter_threshold: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self { press_delay_ms: 500, jitter_threshold: 6.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// `origin` is the panel's position when the press starts.
    PointerDown { pointer: PointF, origin: PointF },
    PointerMove { pointer: PointF },
    PointerUp,
    PointerLeave,
    PressTimerElapsed { token: TimerToken },
    Teardown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    CaptureAcquired,
    CaptureReleased,
    StartPressTimer { token: TimerToken, delay_ms: u64 },
    CancelPressTimer { token: TimerToken },
    Toggle,
    Detach { at: PointF },
    MoveTo { at: PointF },
    Drop { at: PointF },
}

/// State of one pointer-down..pointer-up interaction.
#[derive(Debug)]
pub struct Session {
    origin: PointF,
    pointer_start: PointF,
    last: PointF,
    timer: TimerToken,
    _capture: CaptureGuard,
}

impl Session {
    /// Panel position implied by the pointer's travel since the press started.
    fn follow(&self, pointer: PointF) -> PointF {
        self.origin.offset(pointer.x - self.pointer_start.x, pointer.y - self.pointer_start.y)
    }
}

#[derive(Debug, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Pressing(Session),
    Dragging(Session),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GesturePhase {
    Idle,
    Pressing,
    Dragging,
}

impl GestureState {
    pub fn phase(&self) -> GesturePhase {
        match self {
            GestureState::Idle => GesturePhase::Idle,
            GestureState::Pressing(_) => GesturePhase::Pressing,
            GestureState::Dragging(_) => GesturePhase::Dragging,
        }
    }
}

pub struct StepContext<'a> {
    pub config: &'a GestureConfig,
    pub capture: &'a CaptureScope,
    /// Token to use if this step starts a press timer.
    pub next_token: TimerToken,
}

/// Advance the recognizer by one event.
pub fn step(state: GestureState, event: GestureEvent, ctx: &StepContext<'_>) -> (GestureState, Vec<Effect>) {
    use GestureEvent as E;
    use GestureState as S;

    match (state, event) {
        (S::Idle, E::PointerDown { pointer, origin }) => {
            let session = Session {
                origin,
                pointer_start: pointer,
                last: origin,
                timer: ctx.next_token,
                _capture: ctx.capture.acquire(),
            };
            let effects = vec![
                Effect::CaptureAcquired,
                Effect::StartPressTimer { token: ctx.next_token, delay_ms: ctx.config.press_delay_ms },
            ];
            (S::Pressing(session), effects)
        }

        (S::Pressing(session), E::PointerMove { pointer }) => {
            if pointer.distance(&session.pointer_start) > ctx.config.jitter_threshold {
                let token = session.timer;
                drop(session);
                (S::Idle, vec![Effect::CancelPressTimer { token }, Effect::CaptureReleased])
            } else {
                (S::Pressing(session), vec![])
            }
        }

        (S::Pressing(session), E::PressTimerElapsed { token }) if token == session.timer => {
            let at = session.origin;
            (S::Dragging(session), vec![Effect::Detach { at }])
        }

        (S::Pressing(session), E::PointerUp | E::PointerLeave) => {
            let token = session.timer;
            drop(session);
            (
                S::Idle,
                vec![Effect::CancelPressTimer { token }, Effect::Toggle, Effect::CaptureReleased],
            )
        }

        (S::Dragging(mut session), E::PointerMove { pointer }) => {
            session.last = session.follow(pointer);
            let at = session.last;
            (S::Dragging(session), vec![Effect::MoveTo { at }])
        }

        (S::Dragging(session), E::PointerUp | E::PointerLeave) => {
            let at = session.last;
            drop(session);
            (S::Idle, vec![Effect::Drop { at }, Effect::CaptureReleased])
        }

        (S::Pressing(session), E::Teardown) => {
            let token = session.timer;
            drop(session);
            (S::Idle, vec![Effect::CancelPressTimer { token }, Effect::CaptureReleased])
        }

        (S::Dragging(session), E::Teardown) => {
            drop(session);
            (S::Idle, vec![Effect::CaptureReleased])
        }

        // Everything else (second pointer-down, stray moves, stale timers) is ignored.
        (state, _) => (state, vec![]),
    }
}

/// Owns one panel's gesture state between events.
#[derive(Debug, Default)]
pub struct PressDragMachine {
    state: GestureState,
    last_token: TimerToken,
}

impl PressDragMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: GestureEvent, config: &GestureConfig, capture: &CaptureScope) -> Vec<Effect> {
        let before = self.state.phase();
        let ctx = StepContext { config, capture, next_token: self.last_token + 1 };
        let (next, effects) = step(std::mem::take(&mut self.state), event, &ctx);

        if effects.iter().any(|e| matches!(e, Effect::StartPressTimer { .. })) {
            self.last_token += 1;
        }
        self.state = next;

        let after = self.state.phase();
        if before != after {
            tracing::debug!(?before, ?after, ?event, "gesture transition");
        }
        effects
    }

    pub fn phase(&self) -> GesturePhase {
        self.state.phase()
    }

    pub fn is_active(&self) -> bool {
        self.phase() != GesturePhase::Idle
    }
}
