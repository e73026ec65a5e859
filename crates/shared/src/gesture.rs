//! Drag gesture state machine shared by the item and folder reconcilers.
//!
//! ```text
//! Idle --start--> Dragging --finish--> Idle
//!                    |
//!                    +------cancel---> Idle
//! ```
//!
//! # Invariants
//!
//! 1. At most one gesture is `Dragging`; a second `start` is ignored.
//! 2. The provisional placement is only ever replaced wholesale or cleared,
//!    never patched, so it cannot drift across hover events.
//! 3. `finish` and `cancel` always return to `Idle`.

/// An in-flight drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDrag<Id, Origin, P> {
    pub id: Id,
    /// Where the dragged entry sat when the gesture started.
    pub origin: Origin,
    /// Latest hover result, not yet persisted.
    pub provisional: Option<P>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragState<Id, Origin, P> {
    Idle,
    Dragging(ActiveDrag<Id, Origin, P>),
}

impl<Id, Origin, P> Default for DragState<Id, Origin, P> {
    fn default() -> Self {
        DragState::Idle
    }
}

impl<Id, Origin, P> DragState<Id, Origin, P> {
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging(_))
    }

    pub fn active(&self) -> Option<&ActiveDrag<Id, Origin, P>> {
        match self {
            DragState::Dragging(drag) => Some(drag),
            DragState::Idle => None,
        }
    }

    /// Begin a gesture. Returns `false` and leaves the current gesture
    /// untouched if one is already running.
    pub fn start(&mut self, id: Id, origin: Origin) -> bool {
        if self.is_dragging() {
            return false;
        }
        *self = DragState::Dragging(ActiveDrag {
            id,
            origin,
            provisional: None,
        });
        true
    }

    /// Replace the provisional placement of the running gesture.
    pub fn set_provisional(&mut self, placement: P) {
        if let DragState::Dragging(drag) = self {
            drag.provisional = Some(placement);
        }
    }

    /// Forget the provisional placement but keep the gesture running.
    pub fn clear_provisional(&mut self) {
        if let DragState::Dragging(drag) = self {
            drag.provisional = None;
        }
    }

    /// End the gesture, handing back what was being dragged.
    pub fn finish(&mut self) -> Option<ActiveDrag<Id, Origin, P>> {
        match std::mem::take(self) {
            DragState::Dragging(drag) => Some(drag),
            DragState::Idle => None,
        }
    }

    /// Drop the gesture and its provisional placement. Returns whether a
    /// gesture was running.
    pub fn cancel(&mut self) -> bool {
        self.finish().is_some()
    }
}
