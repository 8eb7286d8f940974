//! Core types - Keys, child descriptors, and transition phases.
//!
//! A transition group never looks inside the children it renders. All it needs
//! from a child descriptor is its key (and whether it is a placeholder), so
//! that is the whole of the [`ChildDescriptor`] contract.

use std::borrow::Borrow;
use std::fmt;

// =============================================================================
// Key
// =============================================================================

/// Stable identity of a child across renders.
///
/// Explicit keys come from the descriptor. Children without one fall back to
/// their position in the list, rendered as a decimal string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);

impl Key {
    /// Create a key from anything string-like.
    pub fn new(key: impl Into<String>) -> Self {
        Key(key.into())
    }

    /// Key used for a child without an explicit key at `index`.
    pub fn positional(index: usize) -> Self {
        Key(index.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key(value)
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key::positional(value)
    }
}

// =============================================================================
// Child Descriptor
// =============================================================================

/// A child handed to a transition group by its owner.
///
/// The group only ever reads the key. Everything else is opaque and passed
/// through to the render projection untouched (apart from the configured
/// child transform).
pub trait ChildDescriptor: Clone + 'static {
    /// Explicit key, if the child has one.
    fn key(&self) -> Option<Key>;

    /// Placeholders hold a slot (and a key) but are never rendered.
    fn is_placeholder(&self) -> bool {
        false
    }
}

/// Ready-made descriptor wrapping arbitrary content.
///
/// `content: None` marks a placeholder, the equivalent of a conditional child
/// that evaluated to nothing.
#[derive(Clone, Debug, PartialEq)]
pub struct Child<T> {
    pub key: Option<Key>,
    pub content: Option<T>,
}

impl<T> Child<T> {
    /// Child with an explicit key.
    pub fn keyed(key: impl Into<Key>, content: T) -> Self {
        Child {
            key: Some(key.into()),
            content: Some(content),
        }
    }

    /// Child keyed by its position in the list.
    pub fn unkeyed(content: T) -> Self {
        Child {
            key: None,
            content: Some(content),
        }
    }

    /// Empty slot with an explicit key.
    pub fn placeholder(key: impl Into<Key>) -> Self {
        Child {
            key: Some(key.into()),
            content: None,
        }
    }
}

impl<T: Clone + 'static> ChildDescriptor for Child<T> {
    fn key(&self) -> Option<Key> {
        self.key.clone()
    }

    fn is_placeholder(&self) -> bool {
        self.content.is_none()
    }
}

// =============================================================================
// Phase
// =============================================================================

/// Transition phase a key can be in while it is transitioning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Child present at initial mount.
    Appear,
    /// Child added by a later update.
    Enter,
    /// Child removed from the list.
    Leave,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Appear => "appear",
            Phase::Enter => "enter",
            Phase::Leave => "leave",
        };
        f.write_str(name)
    }
}
