//! Reactive transition groups - Signal-driven list rendering with transitions.
//!
//! [`transition_group`] is the reactive entry point, the transition-aware
//! sibling of a keyed `each()`: the child list comes from a getter, and the
//! group re-renders whenever the getter's dependencies change or a child
//! finishes leaving.
//!
//! # Pattern: Two Effects
//!
//! 1. The list effect reads `children_getter` (creating the dependency),
//!    feeds the result to the group, renders and commits
//! 2. The revision effect reads the group's revision signal and re-renders
//!    after the group evicted a child on its own
//!
//! Both effects' stop functions are folded into the returned handle's
//! cleanup, which also unmounts the group.
//!
//! # Commit and Flush
//!
//! `commit` receives every [`RenderOutput`] and must mount it synchronously,
//! binding each child instance through its handle. Transition work is not run
//! inside the effects: call [`TransitionGroupHandle::flush`] once the commit is
//! done (e.g. after the frame is drawn).

use std::cell::Cell;
use std::rc::Rc;

use spark_signals::effect;

use crate::group::{CommitQueue, TransitionGroup};
use crate::primitives::Cleanup;
use crate::render::{RenderOutput, TransitionGroupProps};
use crate::types::ChildDescriptor;

// =============================================================================
// Handle
// =============================================================================

/// Handle returned by [`transition_group`].
///
/// Dropping the handle stops tracking and unmounts the group.
pub struct TransitionGroupHandle<C: ChildDescriptor> {
    group: TransitionGroup<C>,
    cleanup: Option<Cleanup>,
}

impl<C: ChildDescriptor> TransitionGroupHandle<C> {
    pub fn group(&self) -> &TransitionGroup<C> {
        &self.group
    }

    pub fn commit_queue(&self) -> CommitQueue {
        self.group.commit_queue()
    }

    /// Run the transition work scheduled by past commits.
    pub fn flush(&self) -> usize {
        self.group.commit_queue().flush()
    }

    /// Stop tracking and unmount the group.
    pub fn cleanup(mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl<C: ChildDescriptor> Drop for TransitionGroupHandle<C> {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

// =============================================================================
// transition_group()
// =============================================================================

/// Render a keyed child list with enter/leave transitions.
///
/// # Arguments
///
/// * `children_getter` - Getter returning the current children (creates
///   reactive dependency)
/// * `props` - Wrapper element and child transform
/// * `commit` - Mounts a render output, binding each child's handle
///
/// # Example
///
/// ```ignore
/// use spark_signals::signal;
/// use spark_transition::{transition_group, Child, TransitionGroupProps};
///
/// let items = signal(vec!["hello", "world"]);
/// let items_clone = items.clone();
///
/// let handle = transition_group(
///     move || items_clone.get().into_iter().map(|s| Child::keyed(s, s)).collect(),
///     TransitionGroupProps::default(),
///     move |output| host.mount(output),
/// );
/// handle.flush();
///
/// // "world" starts leaving after the next flush, and is dropped from the
/// // output once its leave completes
/// items.set(vec!["hello"]);
/// handle.flush();
/// ```
pub fn transition_group<C, G, R>(
    children_getter: G,
    props: TransitionGroupProps<C>,
    commit: R,
) -> TransitionGroupHandle<C>
where
    C: ChildDescriptor,
    G: Fn() -> Vec<C> + 'static,
    R: Fn(RenderOutput<C>) + 'static,
{
    let group = TransitionGroup::new(&[], props);
    let commit = Rc::new(commit);

    // List effect - initial mount on first run, updates afterwards
    let group_for_list = group.clone();
    let commit_for_list = commit.clone();
    let mounted = Rc::new(Cell::new(false));
    let mounted_for_list = mounted.clone();

    let stop_list = effect(move || {
        let children = children_getter();

        if let Err(err) = group_for_list.set_children(&children) {
            tracing::debug!(%err, "child list update skipped");
            return;
        }

        commit_for_list(group_for_list.render());

        let result = if mounted_for_list.get() {
            group_for_list.did_update()
        } else {
            mounted_for_list.set(true);
            group_for_list.did_mount()
        };
        if let Err(err) = result {
            tracing::debug!(%err, "transition group commit skipped");
        }
    });

    // Revision effect - re-render after the group evicted a child
    let group_for_revision = group.clone();
    let revision = group.revision();

    let stop_revision = effect(move || {
        let current = revision.get();
        if current == 0 || !mounted.get() || !group_for_revision.is_mounted() {
            return;
        }

        commit(group_for_revision.render());
        if let Err(err) = group_for_revision.did_update() {
            tracing::debug!(%err, "transition group commit skipped");
        }
    });

    let group_for_cleanup = group.clone();
    let cleanup: Cleanup = Box::new(move || {
        stop_list();
        stop_revision();
        group_for_cleanup.unmount();
    });

    TransitionGroupHandle {
        group,
        cleanup: Some(cleanup),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use spark_signals::signal;

    use crate::group::{Done, TransitionHooks};
    use crate::types::{Child, Key};

    /// Leaves only when released.
    #[derive(Default)]
    struct SlowLeave {
        pending: RefCell<Option<Done>>,
    }

    impl TransitionHooks for SlowLeave {
        fn will_leave(&self, done: Done) {
            *self.pending.borrow_mut() = Some(done);
        }
    }

    type Outputs = Rc<RefCell<Vec<Vec<String>>>>;

    fn recording_commit(
        outputs: Outputs,
        instances: Rc<RefCell<Vec<(Key, Rc<SlowLeave>)>>>,
    ) -> impl Fn(RenderOutput<Child<&'static str>>) + 'static {
        move |output| {
            let mut instances = instances.borrow_mut();
            for child in &output.children {
                if !instances.iter().any(|(key, _)| *key == child.key) {
                    instances.push((child.key.clone(), Rc::new(SlowLeave::default())));
                }
                if let Some((_, instance)) = instances.iter().find(|(key, _)| *key == child.key) {
                    child.handle.bind(instance);
                }
            }
            outputs
                .borrow_mut()
                .push(output.keys().map(|k| k.to_string()).collect());
        }
    }

    #[test]
    fn test_transition_group_renders_initial_list() {
        let items = signal(vec!["a", "b", "c"]);
        let items_clone = items.clone();
        let outputs: Outputs = Rc::new(RefCell::new(Vec::new()));
        let instances = Rc::new(RefCell::new(Vec::new()));

        let handle = transition_group(
            move || items_clone.get().into_iter().map(|s| Child::keyed(s, s)).collect(),
            TransitionGroupProps::default(),
            recording_commit(outputs.clone(), instances.clone()),
        );

        assert!(handle.group().is_mounted());
        assert_eq!(outputs.borrow().len(), 1, "first run commits once");
        assert_eq!(outputs.borrow()[0], vec!["a", "b", "c"]);
    }

    #[test]
    fn test_transition_group_keeps_leaving_child_until_done() {
        let items = signal(vec!["a", "b"]);
        let items_clone = items.clone();
        let outputs: Outputs = Rc::new(RefCell::new(Vec::new()));
        let instances = Rc::new(RefCell::new(Vec::new()));

        let handle = transition_group(
            move || items_clone.get().into_iter().map(|s| Child::keyed(s, s)).collect(),
            TransitionGroupProps::default(),
            recording_commit(outputs.clone(), instances.clone()),
        );
        handle.flush();

        items.set(vec!["a"]);
        assert_eq!(
            outputs.borrow().last().cloned(),
            Some(vec!["a".to_string(), "b".to_string()]),
            "leaving child still rendered"
        );

        handle.flush();
        let done = instances
            .borrow()
            .iter()
            .find(|(key, _)| key.as_str() == "b")
            .and_then(|(_, instance)| instance.pending.borrow_mut().take())
            .expect("leave should have started");
        done.complete();

        assert_eq!(
            outputs.borrow().last().cloned(),
            Some(vec!["a".to_string()]),
            "evicted child dropped by the revision re-render"
        );
    }

    #[test]
    fn test_cleanup_unmounts_group() {
        let items = signal(vec!["a"]);
        let items_clone = items.clone();
        let outputs: Outputs = Rc::new(RefCell::new(Vec::new()));
        let instances = Rc::new(RefCell::new(Vec::new()));

        let handle = transition_group(
            move || items_clone.get().into_iter().map(|s| Child::keyed(s, s)).collect(),
            TransitionGroupProps::default(),
            recording_commit(outputs.clone(), instances.clone()),
        );
        let group = handle.group().clone();

        handle.cleanup();
        assert!(!group.is_mounted());

        items.set(vec!["a", "b"]);
        assert_eq!(outputs.borrow().len(), 1, "no renders after cleanup");
    }
}
