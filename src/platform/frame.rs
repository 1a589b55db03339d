//! Cancellable per-frame loop handles
//!
//! A recurring frame callback holds a clone of its [`FrameHandle`] and checks
//! it before doing any work. Whoever owns the loop cancels the handle when
//! the state the loop touches goes away; the next frame then stops instead
//! of rescheduling itself.

use std::cell::Cell;
use std::rc::Rc;

/// Shared cancellation token for one recurring frame loop
#[derive(Debug, Clone)]
pub struct FrameHandle {
    label: &'static str,
    active: Rc<Cell<bool>>,
}

impl FrameHandle {
    pub fn new(label: &'static str) -> Self {
        log::debug!("Frame loop '{}' started", label);
        Self {
            label,
            active: Rc::new(Cell::new(true)),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// True until any clone of this handle is cancelled
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    pub fn cancel(&self) {
        if self.active.replace(false) {
            log::debug!("Frame loop '{}' cancelled", self.label);
        }
    }

    /// True if both handles refer to the same loop
    pub fn same_loop(&self, other: &FrameHandle) -> bool {
        Rc::ptr_eq(&self.active, &other.active)
    }
}
