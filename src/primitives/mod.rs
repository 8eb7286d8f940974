//! Reactive primitives - Signal-driven transition groups.
//!
//! - [`transition_group`] - Keyed list rendering with enter/leave transitions
//!
//! # Reactivity
//!
//! The child list is read through a getter inside an effect, so any signal the
//! getter touches drives the group:
//!
//! ```ignore
//! // CORRECT - the getter reads the signal, updates propagate
//! transition_group(move || todos.get(), props, commit);
//!
//! // WRONG - the list is read once, the group never updates
//! let snapshot = todos.get();
//! transition_group(move || snapshot.clone(), props, commit);
//! ```

mod control_flow;

pub use control_flow::{transition_group, TransitionGroupHandle};

/// Cleanup function returned by primitives.
///
/// Call this to stop tracking and release resources.
pub type Cleanup = Box<dyn FnOnce()>;
