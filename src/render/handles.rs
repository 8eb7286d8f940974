//! Handle registry - Weak references from keys to mounted children.
//!
//! The render collaborator owns mounted children. When it mounts the child for
//! a [`RenderedChild`](super::RenderedChild) it binds the instance through the
//! child's [`HandleBinding`]. The group only ever reads the registry, and a
//! binding never keeps a child alive.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::group::TransitionHooks;
use crate::types::Key;

type HandleMap = RefCell<HashMap<Key, Weak<dyn TransitionHooks>>>;

/// Key → mounted child lookup shared by a group and its render output.
#[derive(Clone, Default)]
pub struct HandleRegistry {
    handles: Rc<HandleMap>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live child bound to `key`. `None` if nothing is bound or the child was
    /// dropped.
    pub fn get(&self, key: &Key) -> Option<Rc<dyn TransitionHooks>> {
        self.handles.borrow().get(key).and_then(Weak::upgrade)
    }

    pub fn is_bound(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// Bind `handle` to `key`, replacing any previous binding.
    pub fn bind<H: TransitionHooks + 'static>(&self, key: Key, handle: &Rc<H>) {
        let weak: Weak<dyn TransitionHooks> = Rc::downgrade(handle) as Weak<dyn TransitionHooks>;
        self.handles.borrow_mut().insert(key, weak);
    }

    pub fn unbind(&self, key: &Key) {
        self.handles.borrow_mut().remove(key);
    }

    /// Drop every binding whose key fails `keep`.
    pub fn retain(&self, mut keep: impl FnMut(&Key) -> bool) {
        self.handles.borrow_mut().retain(|key, _| keep(key));
    }

    pub fn clear(&self) {
        self.handles.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.handles.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.borrow().is_empty()
    }

    /// Binding slot for `key`, handed to the render collaborator.
    pub fn binding(&self, key: Key) -> HandleBinding {
        HandleBinding {
            key,
            registry: Rc::downgrade(&self.handles),
        }
    }
}

impl fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("bound", &self.len())
            .finish()
    }
}

// =============================================================================
// HandleBinding
// =============================================================================

/// Where the render collaborator registers the child it mounted for one key.
///
/// Outlives its registry harmlessly: binding into a dropped registry is a
/// no-op.
#[derive(Clone)]
pub struct HandleBinding {
    key: Key,
    registry: Weak<HandleMap>,
}

impl HandleBinding {
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Register the mounted child for this key.
    pub fn bind<H: TransitionHooks + 'static>(&self, handle: &Rc<H>) {
        if let Some(registry) = self.registry.upgrade() {
            let weak: Weak<dyn TransitionHooks> =
                Rc::downgrade(handle) as Weak<dyn TransitionHooks>;
            registry.borrow_mut().insert(self.key.clone(), weak);
        }
    }

    /// Forget the child for this key (it was unmounted).
    pub fn unbind(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().remove(&self.key);
        }
    }
}

impl fmt::Debug for HandleBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandleBinding").field(&self.key).finish()
    }
}
