// Scoped pointer capture.
//
// While a gesture session is live the board routes global pointer
// move/up/leave to it. The session holds a `CaptureGuard`; dropping the
// session on any exit path, or dropping the whole machine, releases it.

use std::cell::Cell;
use std::rc::Rc;

/// Shared counter of live capture holders.
#[derive(Debug, Clone, Default)]
pub struct CaptureScope {
    holders: Rc<Cell<usize>>,
}

impl CaptureScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> CaptureGuard {
        self.holders.set(self.holders.get() + 1);
        CaptureGuard { holders: Rc::clone(&self.holders) }
    }

    /// Number of sessions currently holding capture.
    pub fn active(&self) -> usize {
        self.holders.get()
    }

    pub fn is_captured(&self) -> bool {
        self.active() > 0
    }
}

/// Released on drop.
#[derive(Debug)]
pub struct CaptureGuard {
    holders: Rc<Cell<usize>>,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.holders.set(self.holders.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let scope = CaptureScope::new();
        let a = scope.acquire();
        let b = scope.clone().acquire();
        assert_eq!(scope.active(), 2);
        drop(a);
        assert!(scope.is_captured());
        drop(b);
        assert!(!scope.is_captured());
    }
}
