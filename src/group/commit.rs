//! Post-commit queue - Work deferred until after a render commit.
//!
//! Transition hooks can only run once the children they target are mounted.
//! The group therefore never starts enter/leave work while it is being
//! updated. It schedules that work here, and the framework integration
//! flushes the queue once after every render commit.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// Queue of callbacks flushed after each render commit.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone, Default)]
pub struct CommitQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl CommitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer `task` to the next flush.
    pub fn schedule(&self, task: impl FnOnce() + 'static) {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Run everything scheduled so far.
    ///
    /// The batch is taken before any task runs, so tasks scheduled during the
    /// flush wait for the next one. Returns the number of tasks run.
    pub fn flush(&self) -> usize {
        let batch = std::mem::take(&mut *self.tasks.borrow_mut());
        let count = batch.len();
        for task in batch {
            task();
        }
        count
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Drop pending tasks without running them.
    pub fn clear(&self) {
        self.tasks.borrow_mut().clear();
    }
}

impl std::fmt::Debug for CommitQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitQueue").field("pending", &self.len()).finish()
    }
}
