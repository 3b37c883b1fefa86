// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for tree and behaviour operations.
//!
//! Every failing call is a no-op: the tree, alpha sources, and behaviours are
//! left exactly as they were. [`TreeError`]s are precondition violations and
//! are logged at `error` level. [`BehaviourError::AlreadySubscribed`] and
//! [`BehaviourError::NotSubscribed`] are policy violations and are logged at
//! `warn` level.
//!
//! Stale handles are not reported here. Passing a destroyed [`ActorId`] or
//! [`BehaviourId`] as the subject of an operation panics, the same way an
//! out-of-bounds index does.

use thiserror::Error;

use crate::actor::ActorId;
use crate::alpha::AlphaId;
use crate::behaviour::BehaviourId;

/// An invalid structural operation on the actor tree.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// An actor cannot be its own child.
    #[error("cannot add {actor:?} as a child of itself")]
    SelfParenting {
        /// The offending actor.
        actor: ActorId,
    },

    /// The child is already attached somewhere and must be removed first.
    #[error("{child:?} already has parent {parent:?}")]
    AlreadyParented {
        /// The actor being inserted.
        child: ActorId,
        /// Its current parent.
        parent: ActorId,
    },

    /// Inserting the child would make it an ancestor of itself.
    #[error("adding {child:?} to {parent:?} would create a cycle")]
    Cycle {
        /// The intended parent.
        parent: ActorId,
        /// The actor being inserted.
        child: ActorId,
    },

    /// The actor is not a direct child of the given parent.
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// The stated parent.
        parent: ActorId,
        /// The actor expected to be its child.
        child: ActorId,
    },

    /// A reorder was requested for an actor with no parent.
    #[error("{actor:?} has no parent")]
    NoParent {
        /// The detached actor.
        actor: ActorId,
    },

    /// Two actors passed to a reorder do not share a parent.
    #[error("{actor:?} and {sibling:?} are not siblings")]
    NotSiblings {
        /// The actor being moved.
        actor: ActorId,
        /// The reference sibling.
        sibling: ActorId,
    },

    /// An actor was used as its own reference sibling.
    #[error("{actor:?} cannot be positioned relative to itself")]
    SelfSibling {
        /// The offending actor.
        actor: ActorId,
    },
}

/// An invalid operation on a behaviour.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum BehaviourError {
    /// The alpha handle does not refer to a live alpha source.
    #[error("{alpha:?} is not a live alpha source")]
    InvalidAlpha {
        /// The stale alpha handle.
        alpha: AlphaId,
    },

    /// The actor is already driven by the behaviour.
    #[error("{behaviour:?} already applies to {actor:?}")]
    AlreadySubscribed {
        /// The behaviour.
        behaviour: BehaviourId,
        /// The actor.
        actor: ActorId,
    },

    /// The actor is not driven by the behaviour.
    #[error("{behaviour:?} does not apply to {actor:?}")]
    NotSubscribed {
        /// The behaviour.
        behaviour: BehaviourId,
        /// The actor.
        actor: ActorId,
    },
}
