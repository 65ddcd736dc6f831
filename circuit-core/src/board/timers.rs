// Deferred work on the board's clock.
//
// The host never sleeps on our behalf: it reports the current time with
// every call (or from an animation frame) and the board fires whatever
// fell due, earliest first. Entries scheduled at the same instant fire in
// scheduling order.

use std::collections::BTreeMap;

use crate::content::PanelId;
use crate::gesture::TimerToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerKind {
    /// Long-press delay of a panel's gesture session.
    Press { panel: PanelId, token: TimerToken },
    /// End of a dropped panel's signal pulse.
    ClearSignal { panel: PanelId },
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    entries: BTreeMap<(u64, u64), TimerKind>,
    seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: u64, kind: TimerKind) {
        self.seq += 1;
        self.entries.insert((due, self.seq), kind);
    }

    /// Remove every entry equal to `kind`. Returns how many were removed.
    pub fn cancel(&mut self, kind: &TimerKind) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, k| k != kind);
        before - self.entries.len()
    }

    /// Take the earliest entry due at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<TimerKind> {
        let (&key, _) = self.entries.iter().next()?;
        if key.0 > now {
            return None;
        }
        self.entries.remove(&key)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.keys().next().map(|(due, _)| *due)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(id: &str) -> TimerKind {
        TimerKind::ClearSignal { panel: PanelId::from(id) }
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut q = TimerQueue::new();
        q.schedule(1200, signal("b"));
        q.schedule(500, signal("a"));
        q.schedule(1200, signal("c"));

        assert_eq!(q.next_deadline(), Some(500));
        assert_eq!(q.pop_due(499), None);
        assert_eq!(q.pop_due(2000), Some(signal("a")));
        assert_eq!(q.pop_due(2000), Some(signal("b")));
        assert_eq!(q.pop_due(2000), Some(signal("c")));
        assert!(q.is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut q = TimerQueue::new();
        let press = TimerKind::Press { panel: PanelId::from("a"), token: 3 };
        q.schedule(500, press.clone());
        q.schedule(600, signal("a"));
        assert_eq!(q.cancel(&press), 1);
        assert_eq!(q.cancel(&press), 0);
        assert_eq!(q.len(), 1);
    }
}
