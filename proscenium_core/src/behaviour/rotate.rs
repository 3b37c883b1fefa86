// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::{BehaviourKind, sweep};
use crate::actor::{ActorId, ActorTree, RotateAxis};

/// Winding of a rotation or elliptic sweep.
///
/// Angles grow clockwise on screen (y points down).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RotateDirection {
    /// Angles increase from start to end.
    #[default]
    Cw,
    /// Angles decrease from start to end.
    Ccw,
}

/// Rotates actors around one axis.
///
/// Both angles are in degrees and are normalised into `[0, 360)` before
/// interpolating. When they are equal the actor makes a full turn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotate {
    /// Axis to rotate around.
    pub axis: RotateAxis,
    /// Winding of the sweep.
    pub direction: RotateDirection,
    /// Angle at alpha 0.0.
    pub start_angle: f64,
    /// Angle at alpha 1.0.
    pub end_angle: f64,
}

impl Rotate {
    /// Creates a rotation around `axis`.
    #[must_use]
    pub const fn new(
        axis: RotateAxis,
        direction: RotateDirection,
        start_angle: f64,
        end_angle: f64,
    ) -> Self {
        Self {
            axis,
            direction,
            start_angle,
            end_angle,
        }
    }
}

impl BehaviourKind for Rotate {
    fn alpha_notify(&mut self, alpha: f64, actors: &[ActorId], tree: &mut ActorTree) {
        let angle = sweep(self.start_angle, self.end_angle, self.direction, alpha);
        for &actor in actors {
            tree.set_rotation(actor, self.axis, angle);
        }
    }
}
