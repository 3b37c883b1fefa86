// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Alpha sources: time-driven scalar values that drive behaviours.
//!
//! An alpha source holds a single `f64`, nominally in 0.0 to 1.0 but never
//! clamped. Its value changes either directly through
//! [`Stage::set_alpha_value`](crate::stage::Stage::set_alpha_value) or by
//! binding it to a [`Timeline`](crate::timeline::Timeline), in which case
//! every [`Stage::advance_timeline`](crate::stage::Stage::advance_timeline)
//! evaluates the source's [`AlphaMode`] at the timeline's progress.
//!
//! Changes are observable only through notification. Subscribers are either
//! behaviours (bound with
//! [`Stage::set_behaviour_alpha`](crate::stage::Stage::set_behaviour_alpha))
//! or closures (attached with
//! [`Stage::connect_alpha`](crate::stage::Stage::connect_alpha)), and are run
//! synchronously in subscription order.
//!
//! # Ownership
//!
//! Like actors, a new alpha source holds one floating reference. The first
//! behaviour bound to it sinks that reference; later ones add a count. The
//! source is freed when the last behaviour lets go of it. Closure subscribers
//! do not keep a source alive.

mod mode;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

pub use mode::AlphaMode;

use crate::arena::Key;
use crate::behaviour::BehaviourId;
use crate::ownership::Ownership;
use crate::stage::Stage;
use crate::timeline::TimelineId;

/// A handle to an alpha source in a [`Stage`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlphaId(pub(crate) Key);

impl fmt::Debug for AlphaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AlphaId({}@gen{})", self.0.idx, self.0.generation)
    }
}

/// A handle to one subscription on an alpha source.
///
/// Returned by [`Stage::connect_alpha`] and accepted by
/// [`Stage::disconnect_alpha`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Closure subscriber signature: the stage and the new value.
pub(crate) type AlphaCallback = Box<dyn FnMut(&mut Stage, f64)>;

pub(crate) enum Target {
    Behaviour(BehaviourId),
    /// `None` while the closure is running.
    Closure(Option<AlphaCallback>),
}

pub(crate) struct Subscriber {
    pub(crate) id: SubscriptionId,
    pub(crate) target: Target,
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Subscriber");
        s.field("id", &self.id);
        match &self.target {
            Target::Behaviour(b) => s.field("behaviour", b),
            Target::Closure(c) => s.field("running", &c.is_none()),
        };
        s.finish()
    }
}

#[derive(Debug)]
pub(crate) struct AlphaSlot {
    pub(crate) value: f64,
    pub(crate) mode: AlphaMode,
    pub(crate) clock: Option<TimelineId>,
    pub(crate) ownership: Ownership,
    pub(crate) subscribers: Vec<Subscriber>,
}

impl AlphaSlot {
    pub(crate) fn new(mode: AlphaMode) -> Self {
        Self {
            value: 0.0,
            mode,
            clock: None,
            ownership: Ownership::floating(),
            subscribers: Vec::new(),
        }
    }

    pub(crate) fn subscriber_mut(&mut self, id: SubscriptionId) -> Option<&mut Subscriber> {
        self.subscribers.iter_mut().find(|s| s.id == id)
    }
}
