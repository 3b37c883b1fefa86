// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Actor identity.

use core::fmt;

/// Sentinel value indicating "no actor" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to an actor in an [`ActorTree`](super::ActorTree).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after an actor is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorId {
    /// Slot index into the tree's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the tree's generation for this slot.
    pub(crate) generation: u32,
}

impl ActorId {
    /// Returns the raw slot index.
    ///
    /// Raw indices are what [`SceneChanges`](super::SceneChanges) and
    /// [`paint_order`](super::ActorTree::paint_order) report.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({}@gen{})", self.idx, self.generation)
    }
}

/// Rotation axis for [`ActorTree::set_rotation`](super::ActorTree::set_rotation).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RotateAxis {
    /// Rotation around the X axis.
    X,
    /// Rotation around the Y axis.
    Y,
    /// Rotation around the Z axis.
    Z,
}

impl RotateAxis {
    #[inline]
    pub(crate) const fn slot(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}
