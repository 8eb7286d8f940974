//! Child lifecycle hooks and completion tokens.
//!
//! A mounted child takes part in transitions by implementing
//! [`TransitionHooks`]. Every hook is optional:
//!
//! | Hook          | Default                  |
//! |---------------|--------------------------|
//! | `will_appear` | completes immediately    |
//! | `did_appear`  | nothing                  |
//! | `will_enter`  | completes immediately    |
//! | `did_enter`   | nothing                  |
//! | `will_leave`  | completes immediately    |
//! | `did_leave`   | nothing                  |
//!
//! The `will_*` hooks receive a [`Done`] token. The child keeps it for as long
//! as its transition runs (a timer, an animation end) and calls
//! [`Done::complete`] once finished. Hooks take `&self`, so children keep their
//! own state behind `Cell`/`RefCell`.

use std::fmt;
use std::rc::Weak;

use crate::types::{Key, Phase};

// =============================================================================
// TransitionHooks
// =============================================================================

/// Lifecycle hooks a child may expose to its transition group.
pub trait TransitionHooks {
    /// Child present at initial mount starts appearing.
    fn will_appear(&self, done: Done) {
        done.complete();
    }

    fn did_appear(&self) {}

    /// Child added by an update starts entering.
    fn will_enter(&self, done: Done) {
        done.complete();
    }

    fn did_enter(&self) {}

    /// Child removed by an update starts leaving. It stays rendered until
    /// `done` completes.
    fn will_leave(&self, done: Done) {
        done.complete();
    }

    fn did_leave(&self) {}
}

// =============================================================================
// Completion
// =============================================================================

/// Receiver of phase completions. Implemented by the group internals.
pub(crate) trait CompletionSink {
    fn complete(self: std::rc::Rc<Self>, key: Key, phase: Phase, epoch: u64);
}

/// Single-shot completion signal for one transition phase of one key.
///
/// Consumed by [`complete`](Done::complete), so a child cannot fire it twice.
/// The token only holds a weak reference to its group: completing it after
/// the group is gone does nothing. A leave completion that belongs to a leave
/// the group has since replaced is ignored; an appear or enter completion
/// finishes whichever appear or enter the key is running.
///
/// Dropping a token without completing it leaves the key transitioning for
/// good. That is a bug in the child and is logged at `debug` level.
pub struct Done {
    target: Option<Target>,
}

struct Target {
    sink: Weak<dyn CompletionSink>,
    key: Key,
    phase: Phase,
    epoch: u64,
}

impl Done {
    pub(crate) fn new(
        sink: Weak<dyn CompletionSink>,
        key: Key,
        phase: Phase,
        epoch: u64,
    ) -> Self {
        Done {
            target: Some(Target {
                sink,
                key,
                phase,
                epoch,
            }),
        }
    }

    /// Key whose transition this token completes.
    pub fn key(&self) -> Option<&Key> {
        self.target.as_ref().map(|t| &t.key)
    }

    /// Phase this token completes.
    pub fn phase(&self) -> Option<Phase> {
        self.target.as_ref().map(|t| t.phase)
    }

    /// Signal that the transition finished.
    pub fn complete(mut self) {
        let Some(target) = self.target.take() else {
            return;
        };

        match target.sink.upgrade() {
            Some(sink) => sink.complete(target.key, target.phase, target.epoch),
            None => tracing::trace!(
                key = %target.key,
                phase = %target.phase,
                "completion after group teardown ignored"
            ),
        }
    }
}

impl fmt::Debug for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(t) => f
                .debug_struct("Done")
                .field("key", &t.key)
                .field("phase", &t.phase)
                .field("epoch", &t.epoch)
                .finish(),
            None => f.write_str("Done(completed)"),
        }
    }
}

impl Drop for Done {
    fn drop(&mut self) {
        if let Some(target) = self.target.take() {
            tracing::debug!(
                key = %target.key,
                phase = %target.phase,
                "completion dropped without firing; key stays transitioning"
            );
        }
    }
}
