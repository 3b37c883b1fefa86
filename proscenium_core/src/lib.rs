// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Actor tree and alpha-driven behaviours for a retained-mode scene graph.
//!
//! `proscenium_core` provides the structural and animation-driving core of a
//! scene graph: an ordered tree of paintable actors, and the machinery that
//! animates their properties from shared time-varying values. It is `no_std`
//! compatible (with `alloc`) and stores actors in struct-of-arrays layout
//! behind generational handles.
//!
//! # Architecture
//!
//! ```text
//!   Host frame loop
//!       │
//!       ▼
//!   Stage::advance(dt) ──► Timeline ──► alpha sources ──► behaviours
//!                                                              │
//!                 ┌────────────────────────────────────────────┘
//!                 ▼
//!   ActorTree (setters, structural ops) ──► take_changes() ──► paint system
//! ```
//!
//! **[`actor`]**: Struct-of-arrays actor tree with generational handles,
//! floating-reference ownership, ordered sibling lists, structural mutation
//! (insert, remove, replace, reorder), and post-commit change notification.
//!
//! **[`alpha`]**: Alpha sources, the scalar values behaviours read, and the
//! [`AlphaMode`](alpha::AlphaMode) easing curves that map timeline progress
//! onto them.
//!
//! **[`behaviour`]**: The [`BehaviourKind`](behaviour::BehaviourKind) hook
//! and the built-in opacity, rotation, scale, depth, path, and ellipse
//! behaviours.
//!
//! **[`timeline`]**: Host-advanced clocks with looping and auto-reverse.
//!
//! **[`stage`]**: The [`Stage`](stage::Stage) owning all of the above and
//! dispatching alpha changes.
//!
//! **[`dirty`]**: Multi-channel dirty tracking via `understory_dirty`, drained
//! by [`ActorTree::take_changes`](actor::ActorTree::take_changes).
//!
//! **[`error`]**: Error types for rejected tree and behaviour operations.
//!
//! # Errors and diagnostics
//!
//! Rejected operations return an error and change nothing. They are also
//! reported through the [`log`] facade: structural precondition violations at
//! `error`, subscription policy violations at `warn`. Using a handle to an
//! entity that no longer exists as the subject of an operation panics.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod actor;
pub mod alpha;
pub mod behaviour;
pub mod dirty;
pub mod error;
pub mod stage;
pub mod timeline;

mod arena;
mod ownership;
