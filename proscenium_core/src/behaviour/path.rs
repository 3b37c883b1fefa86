// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use kurbo::{BezPath, ParamCurve, ParamCurveArclen, PathEl, Point};

use super::BehaviourKind;
use crate::actor::{ActorId, ActorTree};

/// Arc-length accuracy used when measuring and walking the path.
const ACCURACY: f64 = 1e-6;

/// Moves actors along a Bézier path at constant speed.
///
/// Alpha 0.0 puts an actor at the start of the path and 1.0 at the end;
/// values in between are mapped by arc length, so equal alpha steps cover
/// equal distances. Alpha outside the unit range is clamped to the ends.
#[derive(Clone, Debug)]
pub struct Path {
    path: BezPath,
    /// Arc length of each segment, in `path.segments()` order.
    lengths: Vec<f64>,
    total: f64,
}

impl Path {
    /// Creates a path animation, measuring the path up front.
    #[must_use]
    pub fn new(path: BezPath) -> Self {
        let lengths: Vec<f64> = path.segments().map(|seg| seg.arclen(ACCURACY)).collect();
        let total: f64 = lengths.iter().sum();
        Self {
            path,
            lengths,
            total,
        }
    }

    /// Returns the path being followed.
    #[must_use]
    pub fn path(&self) -> &BezPath {
        &self.path
    }

    /// Replaces the path being followed.
    pub fn set_path(&mut self, path: BezPath) {
        *self = Self::new(path);
    }

    /// Returns the total arc length of the path.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.total
    }

    /// Returns the point at `alpha` along the path, or `None` for an empty
    /// path.
    #[must_use]
    pub fn point_at(&self, alpha: f64) -> Option<Point> {
        if self.lengths.is_empty() {
            // A lone move-to is a fixed point.
            return self.path.elements().iter().find_map(|el| match el {
                PathEl::MoveTo(p) => Some(*p),
                _ => None,
            });
        }

        let mut remaining = alpha.clamp(0.0, 1.0) * self.total;
        for (seg, &len) in self.path.segments().zip(&self.lengths) {
            if remaining <= len {
                let t = if len > 0.0 {
                    seg.inv_arclen(remaining, ACCURACY)
                } else {
                    0.0
                };
                return Some(seg.eval(t));
            }
            remaining -= len;
        }
        self.path.segments().last().map(|seg| seg.eval(1.0))
    }
}

impl BehaviourKind for Path {
    fn alpha_notify(&mut self, alpha: f64, actors: &[ActorId], tree: &mut ActorTree) {
        let Some(point) = self.point_at(alpha) else {
            return;
        };
        for &actor in actors {
            tree.set_position(actor, point);
        }
    }
}
