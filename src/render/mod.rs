//! Render projection - From keyed mapping to render instructions.
//!
//! The group does not render anything itself. [`project`] turns its current
//! mapping into a [`RenderOutput`]: the wrapper element plus one
//! [`RenderedChild`] per rendered key, in mapping order. The render
//! collaborator mounts those children, reusing the instance it already has for
//! a key, and binds each instance through its [`HandleBinding`].
//!
//! # Example
//!
//! ```ignore
//! let output = group.render();
//! for child in &output.children {
//!     let instance = host.instance_for(&child.key, &child.content);
//!     child.handle.bind(&instance);
//! }
//! ```

mod handles;

pub use handles::{HandleBinding, HandleRegistry};

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::mapping::KeyedMapping;
use crate::types::{ChildDescriptor, Key};

// =============================================================================
// Props
// =============================================================================

/// Per-child transform applied right before rendering.
pub type ChildTransform<C> = Rc<dyn Fn(&C) -> C>;

/// Configuration for a transition group.
///
/// Construct with struct update syntax or the `with_*` helpers:
///
/// ```ignore
/// let props = TransitionGroupProps {
///     wrapper_tag: "ul".into(),
///     ..Default::default()
/// }
/// .with_attribute("class", "todo-list");
/// ```
pub struct TransitionGroupProps<C> {
    /// Element type of the wrapping container.
    pub wrapper_tag: String,
    /// Passed through unchanged to the wrapping container.
    pub attributes: IndexMap<String, String>,
    /// Applied to each child before it is rendered. Identity by default.
    pub child_transform: ChildTransform<C>,
}

impl<C: Clone + 'static> Default for TransitionGroupProps<C> {
    fn default() -> Self {
        TransitionGroupProps {
            wrapper_tag: "span".to_string(),
            attributes: IndexMap::new(),
            child_transform: Rc::new(|child: &C| child.clone()),
        }
    }
}

impl<C> Clone for TransitionGroupProps<C> {
    fn clone(&self) -> Self {
        TransitionGroupProps {
            wrapper_tag: self.wrapper_tag.clone(),
            attributes: self.attributes.clone(),
            child_transform: self.child_transform.clone(),
        }
    }
}

impl<C> fmt::Debug for TransitionGroupProps<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionGroupProps")
            .field("wrapper_tag", &self.wrapper_tag)
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

impl<C> TransitionGroupProps<C> {
    pub fn with_wrapper_tag(mut self, tag: impl Into<String>) -> Self {
        self.wrapper_tag = tag.into();
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child_transform(mut self, transform: impl Fn(&C) -> C + 'static) -> Self {
        self.child_transform = Rc::new(transform);
        self
    }
}

// =============================================================================
// Output
// =============================================================================

/// One child to render.
#[derive(Clone, Debug)]
pub struct RenderedChild<C> {
    pub key: Key,
    /// The descriptor after the child transform.
    pub content: C,
    /// Bind the mounted instance here so its hooks can be reached.
    pub handle: HandleBinding,
}

/// Everything the render collaborator needs for one commit.
#[derive(Clone, Debug)]
pub struct RenderOutput<C> {
    pub wrapper_tag: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<RenderedChild<C>>,
}

impl<C> RenderOutput<C> {
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.children.iter().map(|c| &c.key)
    }
}

// =============================================================================
// Projection
// =============================================================================

/// Project `mapping` into render instructions.
///
/// Placeholders are skipped. Bindings for keys that no longer render are
/// dropped from `handles`.
pub fn project<C: ChildDescriptor>(
    mapping: &KeyedMapping<C>,
    props: &TransitionGroupProps<C>,
    handles: &HandleRegistry,
) -> RenderOutput<C> {
    handles.retain(|key| mapping.has_child(key));

    let children = mapping
        .iter()
        .filter_map(|(key, child)| {
            let child = child?;
            Some(RenderedChild {
                key: key.clone(),
                content: (props.child_transform)(child),
                handle: handles.binding(key.clone()),
            })
        })
        .collect();

    RenderOutput {
        wrapper_tag: props.wrapper_tag.clone(),
        attributes: props.attributes.clone(),
        children,
    }
}
