// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Actor tree data model.
//!
//! An *actor* is a node in the scene graph. Each actor has:
//!
//! - An identity ([`ActorId`]): a generational handle that becomes stale when
//!   the actor is destroyed, so use-after-destroy is caught at the API level.
//! - Topology: a parent, and an ordered, doubly linked list of children.
//!   Sibling order is paint order, first child at the bottom.
//! - **Paint state** set by callers and behaviours: name, position, size,
//!   depth, per-axis rotation, scale, opacity, and a visible flag.
//! - **Inherited state** produced by [`take_changes`](ActorTree::take_changes):
//!   effective opacity and effective visibility.
//!
//! Actors are stored in struct-of-arrays layout with index-based handles.
//!
//! # Ownership
//!
//! A new actor holds one floating reference. Adding it to a parent sinks that
//! reference, so the parent becomes the owner. Removing it releases the
//! parent's reference, and an actor whose last reference is released is
//! destroyed together with the children it owns.
//!
//! # Dirty tracking
//!
//! Property mutations mark the matching dirty channel (see
//! [`dirty`](crate::dirty)):
//!
//! - **OPACITY** / **VISIBILITY**: propagate to all descendants, since
//!   effective values are inherited.
//! - **GEOMETRY** / **TRANSFORM**: local-only.
//! - **TOPOLOGY**: structural changes that trigger a paint-order rebuild.

mod evaluate;
mod id;
mod observer;
mod store;
mod traverse;
mod tree;

pub use evaluate::SceneChanges;
pub use id::{ActorId, INVALID, RotateAxis};
pub use observer::{ObserverId, TreeObserver};
pub use store::ActorTree;
pub use traverse::Children;
