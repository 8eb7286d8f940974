//! Transition group - Keyed enter/leave orchestration.
//!
//! A [`TransitionGroup`] owns the keyed mapping of everything it renders and
//! decides when each child's transition hooks run:
//!
//! ```text
//!            did_mount                    done
//! (absent) ───────────▶ appearing ───────────────▶ settled
//!    │                                              │   ▲
//!    │ set_children (added)                removed  │   │ done
//!    ▼                                              ▼   │
//! entering ◀──────────── re-added ────────────── leaving ──▶ evicted
//!                                                     done
//! ```
//!
//! # Driving a group
//!
//! The framework integration calls, in order:
//! 1. [`TransitionGroup::new`] then [`render`](TransitionGroup::render) and mount
//!    the children, binding each instance to its handle
//! 2. [`did_mount`](TransitionGroup::did_mount) after the first commit
//! 3. on every new child list: [`set_children`](TransitionGroup::set_children),
//!    `render`, commit, [`did_update`](TransitionGroup::did_update), then
//!    flush the [`CommitQueue`] once the commit is done
//! 4. whenever [`revision`](TransitionGroup::revision) changes (a child
//!    finished leaving): `render`, commit, `did_update`, flush
//! 5. [`unmount`](TransitionGroup::unmount) on teardown
//!
//! Everything runs on one thread. Hooks are invoked without any internal
//! borrow held, so children may complete synchronously from inside a hook.

mod commit;
mod hooks;
mod state;

pub use commit::CommitQueue;
pub use hooks::{Done, TransitionHooks};
pub use state::KeyFlags;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

use crate::error::TransitionError;
use crate::mapping::{compute_mapping, merge_mappings, KeyedMapping};
use crate::render::{project, HandleRegistry, RenderOutput, TransitionGroupProps};
use crate::types::{ChildDescriptor, Key, Phase};

use hooks::CompletionSink;
use state::Bookkeeping;

// =============================================================================
// Internal State
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Mounted,
    Unmounted,
}

struct GroupState<C> {
    lifecycle: Lifecycle,
    /// What is rendered: the live children plus those still leaving.
    children: KeyedMapping<C>,
    /// The live child list from the latest update.
    desired: KeyedMapping<C>,
    book: Bookkeeping,
}

struct Shared<C> {
    state: RefCell<GroupState<C>>,
    handles: HandleRegistry,
    commits: CommitQueue,
    revision: Signal<u64>,
    revision_count: Cell<u64>,
}

// =============================================================================
// TransitionGroup
// =============================================================================

/// Orchestrates appear/enter/leave transitions for a keyed child list.
///
/// Cloning yields another handle to the same group.
pub struct TransitionGroup<C: ChildDescriptor> {
    shared: Rc<Shared<C>>,
    props: TransitionGroupProps<C>,
}

impl<C: ChildDescriptor> Clone for TransitionGroup<C> {
    fn clone(&self) -> Self {
        TransitionGroup {
            shared: self.shared.clone(),
            props: self.props.clone(),
        }
    }
}

impl<C: ChildDescriptor> fmt::Debug for TransitionGroup<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("TransitionGroup")
            .field("lifecycle", &state.lifecycle)
            .field("keys", &state.children.keys().collect::<Vec<_>>())
            .field("transitioning", &state.book.transitioning_count())
            .finish()
    }
}

impl<C: ChildDescriptor> TransitionGroup<C> {
    /// Create a group for the initial child list. Nothing transitions until
    /// [`did_mount`](Self::did_mount).
    pub fn new(children: &[C], props: TransitionGroupProps<C>) -> Self {
        let mapping = compute_mapping(children);

        TransitionGroup {
            shared: Rc::new(Shared {
                state: RefCell::new(GroupState {
                    lifecycle: Lifecycle::Created,
                    children: mapping.clone(),
                    desired: mapping,
                    book: Bookkeeping::default(),
                }),
                handles: HandleRegistry::new(),
                commits: CommitQueue::new(),
                revision: signal(0),
                revision_count: Cell::new(0),
            }),
            props,
        }
    }

    /// First commit happened: every rendered child starts appearing.
    pub fn did_mount(&self) -> Result<(), TransitionError> {
        let keys: Vec<Key> = {
            let mut state = self.shared.state.borrow_mut();
            match state.lifecycle {
                Lifecycle::Created => state.lifecycle = Lifecycle::Mounted,
                Lifecycle::Mounted => return Err(TransitionError::AlreadyMounted),
                Lifecycle::Unmounted => return Err(TransitionError::Unmounted),
            }
            state
                .children
                .iter()
                .filter(|(_, child)| child.is_some())
                .map(|(key, _)| key.clone())
                .collect()
        };

        tracing::debug!(children = keys.len(), "transition group mounted");

        for key in keys {
            self.shared.perform(key, Phase::Appear);
        }
        Ok(())
    }

    /// Receive a new child list.
    ///
    /// Removed children keep rendering until they finish leaving. Enter and
    /// leave work is queued here and started by the drain that
    /// [`did_update`](Self::did_update) schedules. Before mount this only
    /// replaces the initial list.
    pub fn set_children(&self, children: &[C]) -> Result<(), TransitionError> {
        let next = compute_mapping(children);

        let mut guard = self.shared.state.borrow_mut();
        let state = &mut *guard;

        match state.lifecycle {
            Lifecycle::Created => {
                state.children = next.clone();
                state.desired = next;
                return Ok(());
            }
            Lifecycle::Mounted => {}
            Lifecycle::Unmounted => return Err(TransitionError::Unmounted),
        }

        let prev = std::mem::take(&mut state.children);
        state.children = merge_mappings(&prev, &next);

        // Placeholders never leave, so dropped ones would otherwise linger
        let dropped: Vec<Key> = state
            .children
            .iter()
            .filter(|(key, child)| child.is_none() && !next.contains_key(key))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &dropped {
            state.children.remove(key);
        }

        for (key, child) in next.iter() {
            if child.is_none() {
                continue;
            }
            let has_prev = prev.contains_key(key);
            let transitioning = state.book.is_transitioning(key);

            if has_prev && transitioning {
                // Came back mid-transition: enter again, and keep any running
                // leave from evicting it
                tracing::trace!(%key, "re-entering transitioning child");
                state.book.queue_enter(key.clone());
                state.book.request_abort(key);
            } else if !has_prev && !transitioning {
                state.book.queue_enter(key.clone());
            }
        }

        for (key, child) in prev.iter() {
            if child.is_some() && !next.contains_key(key) && !state.book.is_transitioning(key) {
                state.book.queue_leave(key.clone());
            }
        }

        state.desired = next;
        Ok(())
    }

    /// An update was committed: schedule the queued enter/leave work on the
    /// commit queue.
    pub fn did_update(&self) -> Result<(), TransitionError> {
        match self.shared.state.borrow().lifecycle {
            Lifecycle::Created => return Err(TransitionError::NotMounted),
            Lifecycle::Mounted => {}
            Lifecycle::Unmounted => return Err(TransitionError::Unmounted),
        }

        let weak = Rc::downgrade(&self.shared);
        self.shared.commits.schedule(move || {
            if let Some(shared) = weak.upgrade() {
                shared.drain();
            }
        });
        Ok(())
    }

    /// Tear the group down. Pending work is dropped and completions arriving
    /// later are ignored. Idempotent.
    pub fn unmount(&self) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.lifecycle == Lifecycle::Unmounted {
                return;
            }
            state.lifecycle = Lifecycle::Unmounted;
            state.children = KeyedMapping::new();
            state.desired = KeyedMapping::new();
            state.book.clear();
        }
        self.shared.handles.clear();
        tracing::debug!("transition group unmounted");
    }

    /// Render instructions for the current mapping.
    pub fn render(&self) -> RenderOutput<C> {
        let mapping = self.shared.state.borrow().children.clone();
        project(&mapping, &self.props, &self.shared.handles)
    }

    /// Queue the framework integration flushes after each commit.
    pub fn commit_queue(&self) -> CommitQueue {
        self.shared.commits.clone()
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.shared.handles
    }

    pub fn props(&self) -> &TransitionGroupProps<C> {
        &self.props
    }

    /// Bumped whenever the group changed its own mapping and needs a render.
    pub fn revision(&self) -> Signal<u64> {
        self.shared.revision.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.state.borrow().lifecycle == Lifecycle::Mounted
    }

    /// Keys in render order, including children still leaving.
    pub fn keys(&self) -> Vec<Key> {
        self.shared.state.borrow().children.keys().cloned().collect()
    }

    pub fn is_transitioning(&self, key: &Key) -> bool {
        self.shared.state.borrow().book.is_transitioning(key)
    }

    pub fn phase_of(&self, key: &Key) -> Option<Phase> {
        self.shared.state.borrow().book.phase_of(key)
    }

    pub fn flags_of(&self, key: &Key) -> KeyFlags {
        self.shared.state.borrow().book.flags(key)
    }
}

// =============================================================================
// Transition Procedures
// =============================================================================

impl<C: ChildDescriptor> Shared<C> {
    /// Start the queued enters, then the queued leaves.
    fn drain(self: &Rc<Self>) {
        let keys_to_enter = {
            let mut state = self.state.borrow_mut();
            if state.lifecycle != Lifecycle::Mounted {
                return;
            }
            state.book.take_enter_queue()
        };
        for key in keys_to_enter {
            self.perform(key, Phase::Enter);
        }

        let keys_to_leave = self.state.borrow_mut().book.take_leave_queue();
        for key in keys_to_leave {
            self.perform(key, Phase::Leave);
        }
    }

    fn perform(self: &Rc<Self>, key: Key, phase: Phase) {
        let epoch = {
            let mut state = self.state.borrow_mut();
            if state.lifecycle != Lifecycle::Mounted {
                return;
            }
            // Only reachable when a leave is started for a key whose re-entry
            // has not been consumed yet
            if phase == Phase::Leave && state.book.is_abort_pending(&key) {
                tracing::trace!(%key, "leave suppressed; child re-entered");
                return;
            }
            state.book.begin(&key, phase)
        };

        tracing::trace!(%key, %phase, epoch, "transition started");

        let sink: Weak<dyn CompletionSink> = Rc::downgrade(self) as Weak<dyn CompletionSink>;
        let done = Done::new(sink, key.clone(), phase, epoch);

        match self.handles.get(&key) {
            Some(handle) => match phase {
                Phase::Appear => handle.will_appear(done),
                Phase::Enter => handle.will_enter(done),
                Phase::Leave => handle.will_leave(done),
            },
            None => {
                tracing::debug!(%key, %phase, "no mounted child; completing immediately");
                done.complete();
            }
        }
    }

    fn finish_entering(self: &Rc<Self>, key: Key, phase: Phase, epoch: u64) {
        if !self.accepts(&key, phase, epoch) {
            return;
        }

        if let Some(handle) = self.handles.get(&key) {
            match phase {
                Phase::Appear => handle.did_appear(),
                _ => handle.did_enter(),
            }
        }

        let removed = {
            let mut state = self.state.borrow_mut();
            if state.lifecycle != Lifecycle::Mounted {
                return;
            }
            state.book.finish(&key);
            state.book.consume_abort(&key);
            !state.desired.contains_key(&key)
        };

        tracing::trace!(%key, %phase, "transition finished");

        if removed {
            // Removed before it finished coming in
            self.perform(key, Phase::Leave);
        }
    }

    fn finish_leaving(self: &Rc<Self>, key: Key, epoch: u64) {
        {
            let state = self.state.borrow();
            if state.book.is_abort_pending(&key) {
                tracing::trace!(%key, "leave completion ignored; child re-entered");
                return;
            }
        }
        if !self.accepts(&key, Phase::Leave, epoch) {
            return;
        }

        if let Some(handle) = self.handles.get(&key) {
            handle.did_leave();
        }

        let returned = {
            let mut state = self.state.borrow_mut();
            if state.lifecycle != Lifecycle::Mounted {
                return;
            }
            state.book.finish(&key);

            let returned = state.desired.contains_key(&key);
            if !returned {
                state.children.remove(&key);
            }
            returned
        };

        if returned {
            // Added back after its leave could no longer be aborted
            tracing::trace!(%key, "child returned while leaving; entering again");
            self.perform(key, Phase::Enter);
        } else {
            tracing::trace!(%key, "child evicted");
            self.bump_revision();
        }
    }

    /// True if a completion for `(key, phase, epoch)` should be processed.
    fn accepts(&self, key: &Key, phase: Phase, epoch: u64) -> bool {
        let state = self.state.borrow();
        if state.lifecycle != Lifecycle::Mounted {
            tracing::trace!(%key, %phase, "completion after unmount ignored");
            return false;
        }
        let current = match phase {
            Phase::Leave => state.book.is_current(key, phase, epoch),
            Phase::Appear | Phase::Enter => state.book.is_entering(key),
        };
        if !current {
            tracing::debug!(%key, %phase, epoch, "stale completion ignored");
            return false;
        }
        true
    }

    fn bump_revision(&self) {
        let next = self.revision_count.get() + 1;
        self.revision_count.set(next);
        self.revision.set(next);
    }
}

impl<C: ChildDescriptor> CompletionSink for Shared<C> {
    fn complete(self: Rc<Self>, key: Key, phase: Phase, epoch: u64) {
        match phase {
            Phase::Appear | Phase::Enter => self.finish_entering(key, phase, epoch),
            Phase::Leave => self.finish_leaving(key, epoch),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
