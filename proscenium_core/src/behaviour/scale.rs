// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Vec2;

use super::BehaviourKind;
use crate::actor::{ActorId, ActorTree};

/// Scales actors between two pairs of factors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale {
    /// Scale at alpha 0.0.
    pub start: Vec2,
    /// Scale at alpha 1.0.
    pub end: Vec2,
}

impl Scale {
    /// Creates a scale animation from `start` to `end`.
    #[must_use]
    pub const fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    /// Creates a scale animation that keeps the aspect ratio.
    #[must_use]
    pub const fn uniform(start: f64, end: f64) -> Self {
        Self::new(Vec2::new(start, start), Vec2::new(end, end))
    }
}

impl BehaviourKind for Scale {
    fn alpha_notify(&mut self, alpha: f64, actors: &[ActorId], tree: &mut ActorTree) {
        let scale = self.start.lerp(self.end, alpha);
        for &actor in actors {
            tree.set_scale(actor, scale);
        }
    }
}
