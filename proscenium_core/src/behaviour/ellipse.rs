// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Point;

use super::{BehaviourKind, RotateDirection, sweep};
use crate::actor::{ActorId, ActorTree};

/// Moves actors along an axis-aligned ellipse.
///
/// Angles are in degrees, measured from the positive x axis and growing
/// clockwise on screen. They are normalised into `[0, 360)` first; equal
/// angles make a full orbit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipse {
    /// Center of the ellipse, in parent coordinates.
    pub center: Point,
    /// Full width of the ellipse.
    pub width: f64,
    /// Full height of the ellipse.
    pub height: f64,
    /// Angle at alpha 0.0.
    pub start_angle: f64,
    /// Angle at alpha 1.0.
    pub end_angle: f64,
    /// Winding of the orbit.
    pub direction: RotateDirection,
}

impl Ellipse {
    /// Creates a full clockwise orbit starting and ending at angle 0.
    #[must_use]
    pub const fn new(center: Point, width: f64, height: f64) -> Self {
        Self {
            center,
            width,
            height,
            start_angle: 0.0,
            end_angle: 0.0,
            direction: RotateDirection::Cw,
        }
    }

    /// Returns the point on the ellipse at `alpha`.
    #[must_use]
    pub fn point_at(&self, alpha: f64) -> Point {
        let angle = sweep(self.start_angle, self.end_angle, self.direction, alpha).to_radians();
        Point::new(
            self.center.x + self.width / 2.0 * angle.cos(),
            self.center.y + self.height / 2.0 * angle.sin(),
        )
    }
}

impl BehaviourKind for Ellipse {
    fn alpha_notify(&mut self, alpha: f64, actors: &[ActorId], tree: &mut ActorTree) {
        let point = self.point_at(alpha);
        for &actor in actors {
            tree.set_position(actor, point);
        }
    }
}
