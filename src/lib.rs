//! # spark-transition
//!
//! Keyed enter/leave transitions for reactive UI trees.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! reactivity.
//!
//! ## Architecture
//!
//! A transition group renders a dynamic, keyed set of children and lets each
//! child animate in and out. Removed children keep rendering until their leave
//! transition completes:
//!
//! ```text
//! child list → compute_mapping → merge_mappings → TransitionGroup → project → RenderOutput
//!                                                        ▲                         │
//!                                                        └── Done ◀── child hooks ◀┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Keys, child descriptors, phases
//! - [`mapping`] - Ordered keyed mappings and their merge
//! - [`group`] - The transition orchestrator, hooks and commit queue
//! - [`render`] - Render projection and handle registry
//! - [`primitives`] - Signal-driven `transition_group()`
//! - [`error`] - Lifecycle errors

pub mod error;
pub mod group;
pub mod mapping;
pub mod primitives;
pub mod render;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::TransitionError;

pub use mapping::{compute_mapping, merge_mappings, KeyedMapping};

pub use group::{CommitQueue, Done, KeyFlags, TransitionGroup, TransitionHooks};

pub use render::{
    project, ChildTransform, HandleBinding, HandleRegistry, RenderOutput, RenderedChild,
    TransitionGroupProps,
};

pub use primitives::{transition_group, Cleanup, TransitionGroupHandle};
