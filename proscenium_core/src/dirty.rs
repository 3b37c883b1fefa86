// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Proscenium uses multi-channel dirty tracking (via [`understory_dirty`]) to
//! tell the external paint system which actors changed since it last looked.
//! Each channel represents an independent category of change.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`OPACITY`] and [`VISIBILITY`] use
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and have dependency
//!   edges from child to parent. Marking a parent dirty marks every
//!   descendant, because effective opacity and effective visibility are
//!   inherited.
//!
//! - **Local-only**: [`GEOMETRY`] and [`TRANSFORM`] are marked with the
//!   default policy. Only the mutated actor appears in the drain output; the
//!   paint system owns coordinate math and composes ancestors itself.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on every structural mutation
//!   (add/insert/remove/replace/reorder, create/destroy). It triggers a
//!   paint-order rebuild but does not propagate.
//!
//! # Consumption
//!
//! Callers never query dirty state directly. Each
//! [`ActorTree::take_changes`](crate::actor::ActorTree::take_changes) call
//! drains all channels and reports the result as
//! [`SceneChanges`](crate::actor::SceneChanges).

use understory_dirty::Channel;

/// Position, size, or depth changed.
pub const GEOMETRY: Channel = Channel::new(0);

/// Rotation or scale changed.
pub const TRANSFORM: Channel = Channel::new(1);

/// Opacity changed; effective opacity of the subtree must be recomputed.
pub const OPACITY: Channel = Channel::new(2);

/// Visible flag changed; effective visibility of the subtree must be
/// recomputed.
pub const VISIBILITY: Channel = Channel::new(3);

/// Tree topology changed; triggers a paint-order rebuild.
pub const TOPOLOGY: Channel = Channel::new(4);
