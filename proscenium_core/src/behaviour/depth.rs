// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::{BehaviourKind, lerp};
use crate::actor::{ActorId, ActorTree};

/// Moves actors along the z axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Depth {
    /// Depth at alpha 0.0.
    pub start: f64,
    /// Depth at alpha 1.0.
    pub end: f64,
}

impl Depth {
    /// Creates a depth animation from `start` to `end`.
    #[must_use]
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

impl BehaviourKind for Depth {
    fn alpha_notify(&mut self, alpha: f64, actors: &[ActorId], tree: &mut ActorTree) {
        let depth = lerp(self.start, self.end, alpha);
        for &actor in actors {
            tree.set_depth(actor, depth);
        }
    }
}
