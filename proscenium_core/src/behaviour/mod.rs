// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Behaviours: reusable animation policies driven by an alpha source.
//!
//! A behaviour is bound to at most one alpha source and applies to an ordered
//! set of distinct actors. Every time the alpha's value changes, the
//! behaviour's [`BehaviourKind::alpha_notify`] hook runs once with the new
//! value and the full actor list, and writes whatever property it animates
//! onto each actor.
//!
//! The hook is the only thing a behaviour kind provides. The bookkeeping
//! (alpha binding, subscription, actor ownership) lives in
//! [`Stage`](crate::stage::Stage) and is shared by every kind.
//!
//! Built-in kinds:
//!
//! - [`Opacity`]: fades between two opacities.
//! - [`Rotate`]: turns around one axis.
//! - [`Scale`]: scales between two factors.
//! - [`Depth`]: moves along the z axis.
//! - [`Path`]: moves along a Bézier path at constant speed.
//! - [`Ellipse`]: moves along an axis-aligned ellipse.

mod depth;
mod ellipse;
mod opacity;
mod path;
mod rotate;
mod scale;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

pub use depth::Depth;
pub use ellipse::Ellipse;
pub use opacity::Opacity;
pub use path::Path;
pub use rotate::{Rotate, RotateDirection};
pub use scale::Scale;

use crate::actor::{ActorId, ActorTree};
use crate::alpha::{AlphaId, SubscriptionId};
use crate::arena::Key;

/// A handle to a behaviour in a [`Stage`](crate::stage::Stage).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BehaviourId(pub(crate) Key);

impl fmt::Debug for BehaviourId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BehaviourId({}@gen{})", self.0.idx, self.0.generation)
    }
}

/// The per-kind part of a behaviour.
///
/// Implement this to add a new kind of animation. Parameters live on the
/// implementing type and can be reached later through
/// [`Stage::behaviour_kind`](crate::stage::Stage::behaviour_kind) and
/// [`Stage::behaviour_kind_mut`](crate::stage::Stage::behaviour_kind_mut).
pub trait BehaviourKind: Any + fmt::Debug {
    /// Called once per alpha change with the new value and every actor the
    /// behaviour applies to, in the order they were applied.
    ///
    /// `actors` only holds live handles.
    fn alpha_notify(&mut self, alpha: f64, actors: &[ActorId], tree: &mut ActorTree);
}

#[derive(Debug)]
pub(crate) struct BehaviourSlot {
    pub(crate) kind: Box<dyn BehaviourKind>,
    pub(crate) actors: Vec<ActorId>,
    pub(crate) binding: Option<(AlphaId, SubscriptionId)>,
}

impl BehaviourSlot {
    pub(crate) fn new(kind: Box<dyn BehaviourKind>) -> Self {
        Self {
            kind,
            actors: Vec::new(),
            binding: None,
        }
    }
}

/// `start + (end - start) * alpha`, unclamped.
pub(crate) fn lerp(start: f64, end: f64, alpha: f64) -> f64 {
    start + (end - start) * alpha
}

/// Interpolates between two angles in degrees, winding in `direction`.
///
/// Both ends are first normalised into `[0, 360)`. The end is then moved by
/// a full turn if needed so that the sweep goes the requested way.
pub(crate) fn sweep(start: f64, end: f64, direction: RotateDirection, alpha: f64) -> f64 {
    let start = normalize_degrees(start);
    let mut end = normalize_degrees(end);
    match direction {
        RotateDirection::Cw if start >= end => end += 360.0,
        RotateDirection::Ccw if start <= end => end -= 360.0,
        _ => {}
    }
    lerp(start, end, alpha)
}

/// Wraps an angle into `[0, 360)`.
pub(crate) fn normalize_degrees(angle: f64) -> f64 {
    let mut wrapped = angle % 360.0;
    if wrapped < 0.0 {
        wrapped += 360.0;
    }
    // Tiny negative inputs round up to exactly 360.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
