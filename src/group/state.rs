//! Per-key transition bookkeeping.
//!
//! Tracks, for every key that is transitioning or has a pending leave abort:
//! - [`KeyFlags`] - transitioning / abort-leave membership
//! - the running [`Phase`]
//! - the epoch stamped when that phase started
//!
//! Epochs come from one counter per group and only ever grow, so a leave
//! completion token from an earlier phase can never match a later one, even
//! after the key's entry was pruned and recreated. Appear and enter
//! completions are not epoch-checked: an enter queued on top of a running
//! appear or enter does not cancel it.
//!
//! Also owns the enter/leave queues filled during an update and drained after
//! the commit.

use std::collections::HashMap;

use bitflags::bitflags;

use crate::types::{Key, Phase};

bitflags! {
    /// Membership flags for one key.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KeyFlags: u8 {
        /// An appear, enter or leave is running.
        const TRANSITIONING = 1 << 0;
        /// The key came back while leaving; its leave must not evict it.
        const ABORT_LEAVE = 1 << 1;
    }
}

impl Default for KeyFlags {
    fn default() -> Self {
        KeyFlags::empty()
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct KeyState {
    flags: KeyFlags,
    phase: Option<Phase>,
    epoch: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Bookkeeping {
    keys: HashMap<Key, KeyState>,
    keys_to_enter: Vec<Key>,
    keys_to_leave: Vec<Key>,
    next_epoch: u64,
}

impl Bookkeeping {
    pub fn flags(&self, key: &Key) -> KeyFlags {
        self.keys.get(key).map(|s| s.flags).unwrap_or_default()
    }

    pub fn is_transitioning(&self, key: &Key) -> bool {
        self.flags(key).contains(KeyFlags::TRANSITIONING)
    }

    pub fn is_abort_pending(&self, key: &Key) -> bool {
        self.flags(key).contains(KeyFlags::ABORT_LEAVE)
    }

    /// Phase currently running for `key`, if any.
    pub fn phase_of(&self, key: &Key) -> Option<Phase> {
        self.keys
            .get(key)
            .filter(|s| s.flags.contains(KeyFlags::TRANSITIONING))
            .and_then(|s| s.phase)
    }

    /// Mark `key` as transitioning in `phase`. Returns the phase's epoch.
    pub fn begin(&mut self, key: &Key, phase: Phase) -> u64 {
        self.next_epoch += 1;
        let epoch = self.next_epoch;

        let state = self.keys.entry(key.clone()).or_default();
        state.flags.insert(KeyFlags::TRANSITIONING);
        state.phase = Some(phase);
        state.epoch = epoch;

        epoch
    }

    /// True if `(phase, epoch)` is the phase `key` is running right now.
    pub fn is_current(&self, key: &Key, phase: Phase, epoch: u64) -> bool {
        self.keys.get(key).is_some_and(|s| {
            s.flags.contains(KeyFlags::TRANSITIONING)
                && s.phase == Some(phase)
                && s.epoch == epoch
        })
    }

    /// True if `key` is appearing or entering, whichever token started it.
    pub fn is_entering(&self, key: &Key) -> bool {
        self.keys.get(key).is_some_and(|s| {
            s.flags.contains(KeyFlags::TRANSITIONING)
                && matches!(s.phase, Some(Phase::Appear | Phase::Enter))
        })
    }

    /// Unmark `key` as transitioning.
    pub fn finish(&mut self, key: &Key) {
        if let Some(state) = self.keys.get_mut(key) {
            state.flags.remove(KeyFlags::TRANSITIONING);
            state.phase = None;
        }
        self.prune(key);
    }

    /// Record that `key`'s leave must be abandoned. Repeated requests collapse.
    pub fn request_abort(&mut self, key: &Key) {
        self.keys
            .entry(key.clone())
            .or_default()
            .flags
            .insert(KeyFlags::ABORT_LEAVE);
    }

    /// Clear a pending abort for `key`, if any.
    pub fn consume_abort(&mut self, key: &Key) {
        if let Some(state) = self.keys.get_mut(key) {
            state.flags.remove(KeyFlags::ABORT_LEAVE);
        }
        self.prune(key);
    }

    pub fn queue_enter(&mut self, key: Key) {
        if !self.keys_to_enter.contains(&key) {
            self.keys_to_enter.push(key);
        }
    }

    pub fn queue_leave(&mut self, key: Key) {
        if !self.keys_to_leave.contains(&key) {
            self.keys_to_leave.push(key);
        }
    }

    pub fn take_enter_queue(&mut self) -> Vec<Key> {
        std::mem::take(&mut self.keys_to_enter)
    }

    pub fn take_leave_queue(&mut self) -> Vec<Key> {
        std::mem::take(&mut self.keys_to_leave)
    }

    pub fn transitioning_count(&self) -> usize {
        self.keys
            .values()
            .filter(|s| s.flags.contains(KeyFlags::TRANSITIONING))
            .count()
    }

    /// Forget everything except the epoch counter.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.keys_to_enter.clear();
        self.keys_to_leave.clear();
    }

    fn prune(&mut self, key: &Key) {
        if self.keys.get(key).is_some_and(|s| s.flags.is_empty()) {
            self.keys.remove(key);
        }
    }
}
