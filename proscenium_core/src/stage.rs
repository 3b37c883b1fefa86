// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stage: owner of every actor, alpha source, behaviour, and timeline.
//!
//! Entities refer to each other by handle only, and all of them live in one
//! [`Stage`]. That is what lets an alpha change run arbitrary behaviours
//! against the actor tree without shared mutable references: the stage lends
//! each behaviour hook its own `&mut ActorTree` for the duration of the call.
//!
//! ```text
//!   Host frame loop
//!       │ advance_timeline(dt)
//!       ▼
//!   Timeline ──progress──► AlphaMode::apply ──► set_alpha_value
//!                                                    │ notify, in order
//!                         ┌──────────────────────────┤
//!                         ▼                          ▼
//!              BehaviourKind::alpha_notify    connect_alpha closures
//!                         │
//!                         ▼
//!                  ActorTree setters ──► take_changes ──► paint system
//! ```
//!
//! # Alpha dispatch
//!
//! [`set_alpha_value`](Stage::set_alpha_value) runs every subscriber of the
//! source synchronously, in subscription order, before returning. A closure
//! subscriber may call back into the stage, including setting the same
//! source again. Such a nested update runs its own dispatch to completion
//! before control returns to the closure; a closure that is still executing
//! further up the stack is skipped by the nested dispatch. Subscribers see
//! the source's value at the moment they are called, so the last update
//! always wins.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::time::Duration;

use crate::actor::{ActorId, ActorTree};
use crate::alpha::{AlphaId, AlphaMode, AlphaSlot, SubscriptionId, Subscriber, Target};
use crate::arena::Arena;
use crate::behaviour::{BehaviourId, BehaviourKind, BehaviourSlot};
use crate::error::BehaviourError;
use crate::timeline::{Timeline, TimelineConfig, TimelineId};

/// Owner of the actor tree and of the animation machinery driving it.
#[derive(Debug, Default)]
pub struct Stage {
    tree: ActorTree,
    alphas: Arena<AlphaSlot>,
    behaviours: Arena<BehaviourSlot>,
    timelines: Arena<Timeline>,
    next_subscription: u64,
    /// The tree's teardown count when behaviours were last pruned.
    pruned_at: u64,
}

impl Stage {
    /// Creates an empty stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Actors --

    /// Returns the actor tree.
    #[must_use]
    pub fn tree(&self) -> &ActorTree {
        &self.tree
    }

    /// Returns the actor tree for structural and property mutation.
    pub fn tree_mut(&mut self) -> &mut ActorTree {
        &mut self.tree
    }

    /// Destroys an actor and drops it, along with any descendant torn down
    /// with it, from every behaviour that applied to it.
    ///
    /// See [`ActorTree::destroy_actor`] for the teardown itself. Destroying
    /// through [`tree_mut`](Self::tree_mut) has the same effect on
    /// behaviours.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy_actor(&mut self, actor: ActorId) {
        self.tree.destroy_actor(actor);
        self.prune_destroyed();
    }

    // -- Alpha sources --

    /// Creates an unbound alpha source with value 0.0.
    ///
    /// The source holds a floating reference that the first behaviour bound
    /// to it takes over. If it is never bound, release it with
    /// [`release_alpha`](Self::release_alpha).
    pub fn create_alpha(&mut self, mode: AlphaMode) -> AlphaId {
        let id = AlphaId(self.alphas.insert(AlphaSlot::new(mode)));
        log::trace!("created {id:?}");
        id
    }

    /// Creates an alpha source already driven by `timeline`.
    ///
    /// # Panics
    ///
    /// Panics if the timeline handle is stale.
    pub fn create_alpha_for(&mut self, timeline: TimelineId, mode: AlphaMode) -> AlphaId {
        let id = self.create_alpha(mode);
        self.bind_clock(id, timeline);
        id
    }

    /// Returns whether the handle refers to a live alpha source.
    #[must_use]
    pub fn is_alpha_alive(&self, alpha: AlphaId) -> bool {
        self.alphas.contains(alpha.0)
    }

    /// Adds a strong reference to an alpha source.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn retain_alpha(&mut self, alpha: AlphaId) {
        self.alpha_mut(alpha).ownership.retain();
    }

    /// Drops a strong reference to an alpha source, freeing it if none
    /// remain.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn release_alpha(&mut self, alpha: AlphaId) {
        if self.alpha_mut(alpha).ownership.release() {
            self.free_alpha(alpha);
        }
    }

    /// Returns the current value of an alpha source.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn alpha_value(&self, alpha: AlphaId) -> f64 {
        self.alpha(alpha).value
    }

    /// Sets the value of an alpha source and notifies its subscribers.
    ///
    /// Setting the value it already has (bit for bit) notifies nobody. See
    /// the [module docs](self) for re-entrancy rules.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set_alpha_value(&mut self, alpha: AlphaId, value: f64) {
        let slot = self.alpha_mut(alpha);
        if slot.value.to_bits() == value.to_bits() {
            return;
        }
        slot.value = value;
        self.prune_destroyed();
        self.dispatch(alpha);
    }

    /// Returns the alpha function of a source.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn alpha_mode(&self, alpha: AlphaId) -> AlphaMode {
        self.alpha(alpha).mode
    }

    /// Replaces the alpha function used when a timeline drives the source.
    ///
    /// Takes effect on the next timeline advance.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set_alpha_mode(&mut self, alpha: AlphaId, mode: AlphaMode) {
        self.alpha_mut(alpha).mode = mode;
    }

    /// Returns the timeline driving a source, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn alpha_clock(&self, alpha: AlphaId) -> Option<TimelineId> {
        self.alpha(alpha).clock
    }

    /// Lets `timeline` drive the alpha source, replacing any previous clock.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn bind_clock(&mut self, alpha: AlphaId, timeline: TimelineId) {
        self.validate_timeline(timeline);
        self.alpha_mut(alpha).clock = Some(timeline);
    }

    /// Detaches the alpha source from its timeline. Its value is kept.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn unbind_clock(&mut self, alpha: AlphaId) {
        self.alpha_mut(alpha).clock = None;
    }

    /// Subscribes a closure to value changes of an alpha source.
    ///
    /// The closure runs after the subscribers registered before it and
    /// receives the stage and the new value. It does not keep the source
    /// alive.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn connect_alpha(
        &mut self,
        alpha: AlphaId,
        callback: impl FnMut(&mut Self, f64) + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription_id();
        self.alpha_mut(alpha).subscribers.push(Subscriber {
            id,
            target: Target::Closure(Some(Box::new(callback))),
        });
        id
    }

    /// Removes a closure subscription. Returns `false` if it was not found.
    ///
    /// A closure may disconnect itself while running.
    ///
    /// # Panics
    ///
    /// Panics if the alpha handle is stale.
    pub fn disconnect_alpha(&mut self, alpha: AlphaId, subscription: SubscriptionId) -> bool {
        let slot = self.alpha_mut(alpha);
        let before = slot.subscribers.len();
        slot.subscribers
            .retain(|s| !(s.id == subscription && matches!(s.target, Target::Closure(_))));
        slot.subscribers.len() != before
    }

    // -- Timelines --

    /// Creates a stopped timeline.
    pub fn create_timeline(&mut self, config: TimelineConfig) -> TimelineId {
        TimelineId(self.timelines.insert(Timeline::new(config)))
    }

    /// Returns a timeline.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn timeline(&self, timeline: TimelineId) -> &Timeline {
        let Some(t) = self.timelines.get(timeline.0) else {
            panic!("stale TimelineId: {timeline:?}");
        };
        t
    }

    /// Returns a timeline for playback control.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn timeline_mut(&mut self, timeline: TimelineId) -> &mut Timeline {
        let Some(t) = self.timelines.get_mut(timeline.0) else {
            panic!("stale TimelineId: {timeline:?}");
        };
        t
    }

    /// Destroys a timeline, unbinding every alpha source it drives.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy_timeline(&mut self, timeline: TimelineId) {
        self.validate_timeline(timeline);
        for (_, slot) in self.alphas.iter_mut() {
            if slot.clock == Some(timeline) {
                slot.clock = None;
            }
        }
        let _ = self.timelines.remove(timeline.0);
    }

    /// Advances a playing timeline by `dt` and drives every alpha source
    /// bound to it.
    ///
    /// Each bound source is set to its alpha function evaluated at the new
    /// progress, in source creation order. A paused timeline does nothing.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn advance_timeline(&mut self, timeline: TimelineId, dt: Duration) {
        let t = self.timeline_mut(timeline);
        if !t.is_playing() {
            return;
        }
        let progress = t.advance(dt);

        let bound: Vec<AlphaId> = self
            .alphas
            .iter()
            .filter(|(_, slot)| slot.clock == Some(timeline))
            .map(|(key, _)| AlphaId(key))
            .collect();
        for alpha in bound {
            // Earlier subscribers may have freed or rebound later sources.
            let Some(slot) = self.alphas.get(alpha.0) else {
                continue;
            };
            if slot.clock != Some(timeline) {
                continue;
            }
            let value = slot.mode.apply(progress);
            self.set_alpha_value(alpha, value);
        }
    }

    /// Advances every playing timeline by `dt`, in creation order.
    pub fn advance(&mut self, dt: Duration) {
        let ids: Vec<TimelineId> = self
            .timelines
            .iter()
            .map(|(key, _)| TimelineId(key))
            .collect();
        for id in ids {
            if self.timelines.contains(id.0) {
                self.advance_timeline(id, dt);
            }
        }
    }

    // -- Behaviours --

    /// Creates a behaviour with no alpha and no actors.
    pub fn create_behaviour(&mut self, kind: impl BehaviourKind) -> BehaviourId {
        let id = BehaviourId(self.behaviours.insert(BehaviourSlot::new(Box::new(kind))));
        log::trace!("created {id:?}");
        id
    }

    /// Creates a behaviour bound to `alpha`.
    ///
    /// # Errors
    ///
    /// Fails with [`BehaviourError::InvalidAlpha`], creating nothing, if
    /// `alpha` is stale.
    pub fn create_behaviour_with_alpha(
        &mut self,
        kind: impl BehaviourKind,
        alpha: AlphaId,
    ) -> Result<BehaviourId, BehaviourError> {
        if !self.alphas.contains(alpha.0) {
            return Err(invalid_alpha(alpha));
        }
        let id = self.create_behaviour(kind);
        self.set_behaviour_alpha(id, Some(alpha))?;
        Ok(id)
    }

    /// Returns whether the handle refers to a live behaviour.
    #[must_use]
    pub fn is_behaviour_alive(&self, behaviour: BehaviourId) -> bool {
        self.behaviours.contains(behaviour.0)
    }

    /// Destroys a behaviour.
    ///
    /// The alpha subscription is torn down and the alpha reference released
    /// first, then every actor reference is released in apply order.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy_behaviour(&mut self, behaviour: BehaviourId) {
        self.validate_behaviour(behaviour);
        self.prune_destroyed();
        self.unbind_behaviour(behaviour);
        let Some(slot) = self.behaviours.remove(behaviour.0) else {
            return;
        };
        for actor in slot.actors {
            self.tree.release_actor(actor);
        }
        log::trace!("destroyed {behaviour:?}");
    }

    /// Returns the alpha source a behaviour is bound to.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn behaviour_alpha(&self, behaviour: BehaviourId) -> Option<AlphaId> {
        self.behaviour(behaviour).binding.map(|(alpha, _)| alpha)
    }

    /// Binds a behaviour to `alpha`, or unbinds it with `None`.
    ///
    /// The previous binding, if any, is torn down completely (unsubscribed,
    /// then released) before the new one is made. Binding takes ownership of
    /// the alpha, sinking its floating reference. Rebinding the current
    /// alpha does nothing.
    ///
    /// # Errors
    ///
    /// Fails with [`BehaviourError::InvalidAlpha`], leaving the current
    /// binding in place, if `alpha` is stale.
    ///
    /// # Panics
    ///
    /// Panics if the behaviour handle is stale.
    pub fn set_behaviour_alpha(
        &mut self,
        behaviour: BehaviourId,
        alpha: Option<AlphaId>,
    ) -> Result<(), BehaviourError> {
        self.validate_behaviour(behaviour);
        if let Some(alpha) = alpha
            && !self.alphas.contains(alpha.0)
        {
            return Err(invalid_alpha(alpha));
        }
        if self.behaviour_alpha(behaviour) == alpha {
            return Ok(());
        }

        self.unbind_behaviour(behaviour);

        if let Some(alpha) = alpha {
            let id = self.next_subscription_id();
            let slot = self.alpha_mut(alpha);
            slot.ownership.sink();
            slot.subscribers.push(Subscriber {
                id,
                target: Target::Behaviour(behaviour),
            });
            self.behaviour_mut(behaviour).binding = Some((alpha, id));
        }
        Ok(())
    }

    /// Makes a behaviour apply to `actor`, keeping the actor alive while it
    /// does.
    ///
    /// # Errors
    ///
    /// Fails with [`BehaviourError::AlreadySubscribed`] (logged as a warning)
    /// if the behaviour already applies to `actor`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn apply_behaviour(
        &mut self,
        behaviour: BehaviourId,
        actor: ActorId,
    ) -> Result<(), BehaviourError> {
        self.validate_behaviour(behaviour);
        self.tree.validate(actor);
        self.prune_destroyed();
        if self.behaviour(behaviour).actors.contains(&actor) {
            let err = BehaviourError::AlreadySubscribed { behaviour, actor };
            log::warn!("{err}");
            return Err(err);
        }
        self.tree.retain_actor(actor);
        self.behaviour_mut(behaviour).actors.push(actor);
        Ok(())
    }

    /// Stops a behaviour from applying to `actor` and releases its
    /// reference, which may destroy the actor.
    ///
    /// # Errors
    ///
    /// Fails with [`BehaviourError::NotSubscribed`] (logged as a warning) if
    /// the behaviour does not apply to `actor`, which includes every
    /// destroyed actor.
    ///
    /// # Panics
    ///
    /// Panics if the behaviour handle is stale.
    pub fn remove_behaviour_actor(
        &mut self,
        behaviour: BehaviourId,
        actor: ActorId,
    ) -> Result<(), BehaviourError> {
        self.validate_behaviour(behaviour);
        self.prune_destroyed();
        let slot = self.behaviour_mut(behaviour);
        let Some(pos) = slot.actors.iter().position(|&a| a == actor) else {
            let err = BehaviourError::NotSubscribed { behaviour, actor };
            log::warn!("{err}");
            return Err(err);
        };
        slot.actors.remove(pos);
        self.tree.release_actor(actor);
        Ok(())
    }

    /// Returns whether a behaviour applies to `actor`. Always `false` for a
    /// destroyed actor.
    ///
    /// # Panics
    ///
    /// Panics if the behaviour handle is stale.
    #[must_use]
    pub fn is_applied(&self, behaviour: BehaviourId, actor: ActorId) -> bool {
        self.tree.is_alive(actor) && self.behaviour(behaviour).actors.contains(&actor)
    }

    /// Returns the live actors a behaviour applies to, in apply order.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn behaviour_actors(&self, behaviour: BehaviourId) -> Vec<ActorId> {
        self.behaviour(behaviour)
            .actors
            .iter()
            .copied()
            .filter(|&actor| self.tree.is_alive(actor))
            .collect()
    }

    /// Calls `f` with the tree and each actor a behaviour applies to, in
    /// apply order.
    ///
    /// `f` can change actor properties and structure but cannot change which
    /// actors the behaviour applies to.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn for_each_behaviour_actor(
        &mut self,
        behaviour: BehaviourId,
        mut f: impl FnMut(&mut ActorTree, ActorId),
    ) {
        self.prune_destroyed();
        let Some(slot) = self.behaviours.get(behaviour.0) else {
            panic!("stale BehaviourId: {behaviour:?}");
        };
        for &actor in &slot.actors {
            if self.tree.is_alive(actor) {
                f(&mut self.tree, actor);
            }
        }
    }

    /// Returns the behaviour's kind as `K`, or `None` if it is another kind.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn behaviour_kind<K: BehaviourKind>(&self, behaviour: BehaviourId) -> Option<&K> {
        let kind: &dyn Any = &*self.behaviour(behaviour).kind;
        kind.downcast_ref()
    }

    /// Returns the behaviour's kind as `K` for changing its parameters, or
    /// `None` if it is another kind.
    ///
    /// Changes take effect on the next alpha notification.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn behaviour_kind_mut<K: BehaviourKind>(
        &mut self,
        behaviour: BehaviourId,
    ) -> Option<&mut K> {
        let kind: &mut dyn Any = &mut *self.behaviour_mut(behaviour).kind;
        kind.downcast_mut()
    }

    // -- Internal helpers --

    fn alpha(&self, alpha: AlphaId) -> &AlphaSlot {
        let Some(slot) = self.alphas.get(alpha.0) else {
            panic!("stale AlphaId: {alpha:?}");
        };
        slot
    }

    fn alpha_mut(&mut self, alpha: AlphaId) -> &mut AlphaSlot {
        let Some(slot) = self.alphas.get_mut(alpha.0) else {
            panic!("stale AlphaId: {alpha:?}");
        };
        slot
    }

    fn behaviour(&self, behaviour: BehaviourId) -> &BehaviourSlot {
        let Some(slot) = self.behaviours.get(behaviour.0) else {
            panic!("stale BehaviourId: {behaviour:?}");
        };
        slot
    }

    fn behaviour_mut(&mut self, behaviour: BehaviourId) -> &mut BehaviourSlot {
        let Some(slot) = self.behaviours.get_mut(behaviour.0) else {
            panic!("stale BehaviourId: {behaviour:?}");
        };
        slot
    }

    fn validate_behaviour(&self, behaviour: BehaviourId) {
        assert!(
            self.behaviours.contains(behaviour.0),
            "stale BehaviourId: {behaviour:?}"
        );
    }

    fn validate_timeline(&self, timeline: TimelineId) {
        assert!(
            self.timelines.contains(timeline.0),
            "stale TimelineId: {timeline:?}"
        );
    }

    fn next_subscription_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        id
    }

    fn free_alpha(&mut self, alpha: AlphaId) {
        let _ = self.alphas.remove(alpha.0);
        log::trace!("freed {alpha:?}");
    }

    /// Unsubscribes a behaviour from its alpha and releases the alpha.
    fn unbind_behaviour(&mut self, behaviour: BehaviourId) {
        let Some((alpha, subscription)) = self.behaviour_mut(behaviour).binding.take() else {
            return;
        };
        let Some(slot) = self.alphas.get_mut(alpha.0) else {
            return;
        };
        slot.subscribers.retain(|s| s.id != subscription);
        if slot.ownership.release() {
            self.free_alpha(alpha);
        }
    }

    /// Runs every subscriber of `alpha` that existed when dispatch started.
    fn dispatch(&mut self, alpha: AlphaId) {
        let subscriptions: Vec<SubscriptionId> = self
            .alpha(alpha)
            .subscribers
            .iter()
            .map(|s| s.id)
            .collect();

        for subscription in subscriptions {
            // A subscriber may have freed the source.
            let Some(slot) = self.alphas.get_mut(alpha.0) else {
                return;
            };
            let value = slot.value;
            let Some(subscriber) = slot.subscriber_mut(subscription) else {
                continue;
            };
            match &mut subscriber.target {
                Target::Behaviour(behaviour) => {
                    let behaviour = *behaviour;
                    self.run_behaviour(behaviour, value);
                }
                Target::Closure(callback) => {
                    // Taken while running, so a nested dispatch skips it.
                    let Some(mut callback) = callback.take() else {
                        continue;
                    };
                    callback(self, value);
                    if let Some(subscriber) = self
                        .alphas
                        .get_mut(alpha.0)
                        .and_then(|slot| slot.subscriber_mut(subscription))
                    {
                        subscriber.target = Target::Closure(Some(callback));
                    }
                }
            }
        }
    }

    fn run_behaviour(&mut self, behaviour: BehaviourId, value: f64) {
        // An earlier subscriber may have destroyed actors.
        self.prune_destroyed();
        let Some(slot) = self.behaviours.get_mut(behaviour.0) else {
            return;
        };
        slot.kind.alpha_notify(value, &slot.actors, &mut self.tree);
    }

    /// Drops destroyed actors from every behaviour, if any were destroyed
    /// since the last call.
    fn prune_destroyed(&mut self) {
        if self.pruned_at == self.tree.destroyed {
            return;
        }
        self.pruned_at = self.tree.destroyed;
        let tree = &self.tree;
        for (_, slot) in self.behaviours.iter_mut() {
            slot.actors.retain(|&actor| tree.is_alive(actor));
        }
    }
}

fn invalid_alpha(alpha: AlphaId) -> BehaviourError {
    let err = BehaviourError::InvalidAlpha { alpha };
    log::error!("{err}");
    err
}
