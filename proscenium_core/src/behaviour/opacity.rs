// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use super::{BehaviourKind, lerp};
use crate::actor::{ActorId, ActorTree};

/// Fades actors between two opacities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opacity {
    /// Opacity at alpha 0.0.
    pub start: u8,
    /// Opacity at alpha 1.0.
    pub end: u8,
}

impl Opacity {
    /// Creates a fade from `start` to `end`.
    #[must_use]
    pub const fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }
}

impl BehaviourKind for Opacity {
    fn alpha_notify(&mut self, alpha: f64, actors: &[ActorId], tree: &mut ActorTree) {
        let value = lerp(f64::from(self.start), f64::from(self.end), alpha)
            .clamp(0.0, 255.0)
            .round();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "value is clamped to the u8 range"
        )]
        let opacity = value as u8;
        for &actor in actors {
            tree.set_opacity(actor, opacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fades_every_actor() {
        let mut tree = ActorTree::new();
        let a = tree.create_actor();
        let b = tree.create_actor();
        let mut fade = Opacity::new(255, 0);

        fade.alpha_notify(0.5, &[a, b], &mut tree);
        assert_eq!(tree.opacity(a), 128);
        assert_eq!(tree.opacity(b), 128);

        fade.alpha_notify(1.0, &[a, b], &mut tree);
        assert_eq!(tree.opacity(a), 0);
    }

    #[test]
    fn overshoot_saturates() {
        let mut tree = ActorTree::new();
        let a = tree.create_actor();
        let mut fade = Opacity::new(0, 200);
        fade.alpha_notify(2.0, &[a], &mut tree);
        assert_eq!(tree.opacity(a), 255);
        fade.alpha_notify(-1.0, &[a], &mut tree);
        assert_eq!(tree.opacity(a), 0);
    }
}
