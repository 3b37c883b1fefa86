// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays actor storage with allocation, ownership, and property
//! management.
//!
//! Structural mutation lives in `tree.rs`; this file owns the slots.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Point, Size, Vec2};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{ActorId, INVALID, RotateAxis};
use super::observer::{ObserverId, Observers, TreeEvent, TreeObserver};
use super::traverse::Children;
use crate::dirty;
use crate::ownership::Ownership;

/// Struct-of-arrays storage for all actors.
///
/// Actors are addressed by [`ActorId`] handles. Internally, each actor
/// occupies a slot in parallel arrays. Destroyed actors are recycled via a
/// free list, and generation counters prevent stale handle access.
///
/// A parent owns its children. Removing a child releases that ownership and
/// destroys the child unless something else (a behaviour, or an explicit
/// [`retain_actor`](Self::retain_actor)) still holds it.
#[derive(Debug)]
pub struct ActorTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) last_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,
    pub(crate) n_children: Vec<u32>,

    // -- Paint state (set by callers and behaviours) --
    pub(crate) name: Vec<Option<String>>,
    pub(crate) position: Vec<Point>,
    pub(crate) size: Vec<Size>,
    pub(crate) depth: Vec<f64>,
    pub(crate) rotation: Vec<[f64; 3]>,
    pub(crate) scale: Vec<Vec2>,
    pub(crate) opacity: Vec<u8>,
    pub(crate) visible: Vec<bool>,

    // -- Inherited state (written by take_changes) --
    pub(crate) effective_opacity: Vec<u8>,
    pub(crate) effective_visible: Vec<bool>,

    // -- Allocation --
    pub(crate) ownership: Vec<Ownership>,
    pub(crate) generation: Vec<u32>,
    /// Whether each slot holds a live actor; freed slots are `false`.
    pub(crate) live: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
    /// Bumped on every actor teardown.
    pub(crate) destroyed: u64,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Paint order cache --
    pub(crate) paint_order: Vec<u32>,
    pub(crate) paint_order_dirty: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,

    // -- Notification --
    pub(crate) observers: Observers,
}

impl Default for ActorTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            last_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            n_children: Vec::new(),
            name: Vec::new(),
            position: Vec::new(),
            size: Vec::new(),
            depth: Vec::new(),
            rotation: Vec::new(),
            scale: Vec::new(),
            opacity: Vec::new(),
            visible: Vec::new(),
            effective_opacity: Vec::new(),
            effective_visible: Vec::new(),
            ownership: Vec::new(),
            generation: Vec::new(),
            live: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            destroyed: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            paint_order: Vec::new(),
            paint_order_dirty: true,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            observers: Observers::default(),
        }
    }

    // -- Allocation API --

    /// Creates a new detached actor and returns its handle.
    ///
    /// The actor starts at the origin with zero size, depth 0, no rotation,
    /// unit scale, full opacity, visible, and no parent. It holds a single
    /// floating reference: the first parent it is added to takes that
    /// reference over. A floating actor that is never parented must be
    /// released with [`release_actor`](Self::release_actor) or
    /// [`destroy_actor`](Self::destroy_actor).
    pub fn create_actor(&mut self) -> ActorId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot. The generation was bumped on destroy.
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.last_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.n_children[i] = 0;
            self.name[i] = None;
            self.position[i] = Point::ORIGIN;
            self.size[i] = Size::ZERO;
            self.depth[i] = 0.0;
            self.rotation[i] = [0.0; 3];
            self.scale[i] = Vec2::new(1.0, 1.0);
            self.opacity[i] = u8::MAX;
            self.visible[i] = true;
            self.effective_opacity[i] = u8::MAX;
            self.effective_visible[i] = true;
            self.ownership[i] = Ownership::floating();
            self.live[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.last_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.n_children.push(0);
            self.name.push(None);
            self.position.push(Point::ORIGIN);
            self.size.push(Size::ZERO);
            self.depth.push(0.0);
            self.rotation.push([0.0; 3]);
            self.scale.push(Vec2::new(1.0, 1.0));
            self.opacity.push(u8::MAX);
            self.visible.push(true);
            self.effective_opacity.push(u8::MAX);
            self.effective_visible.push(true);
            self.ownership.push(Ownership::floating());
            self.generation.push(0);
            self.live.push(true);
            idx
        };

        self.paint_order_dirty = true;
        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);

        ActorId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Creates a new detached actor with a name.
    ///
    /// Names are for diagnostics and lookup only and need not be unique.
    pub fn create_named_actor(&mut self, name: impl Into<String>) -> ActorId {
        let id = self.create_actor();
        self.name[id.idx as usize] = Some(name.into());
        id
    }

    /// Destroys an actor regardless of who still references it.
    ///
    /// Children are detached in order and released; each one is destroyed
    /// in turn unless something else still owns it, in which case it
    /// survives as a detached root. The actor is then removed from its
    /// parent and its slot is recycled. Observers see `child_removed` for
    /// every unlink and `actor_destroyed` for every freed actor once the
    /// whole teardown has finished.
    ///
    /// Behaviours holding the actor stop applying to it: a
    /// [`Stage`](crate::stage::Stage) never reports or touches a destroyed
    /// actor.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy_actor(&mut self, id: ActorId) {
        self.validate(id);
        self.teardown(id.idx);
        self.observers.flush();
    }

    /// Returns whether the given handle refers to a live actor.
    #[must_use]
    pub fn is_alive(&self, id: ActorId) -> bool {
        (id.idx < self.len)
            && self.live[id.idx as usize]
            && self.generation[id.idx as usize] == id.generation
    }

    /// Adds a strong reference to an actor.
    ///
    /// Use this to keep an actor alive across
    /// [`remove_child`](Self::remove_child). Balance every call with
    /// [`release_actor`](Self::release_actor).
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn retain_actor(&mut self, id: ActorId) {
        self.validate(id);
        self.ownership[id.idx as usize].retain();
    }

    /// Drops a strong reference to an actor, destroying it if none remain.
    ///
    /// Releasing a floating actor that was never parented drops its floating
    /// reference.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn release_actor(&mut self, id: ActorId) {
        self.validate(id);
        if self.ownership[id.idx as usize].release() {
            self.teardown(id.idx);
        }
        self.observers.flush();
    }

    /// Returns the number of strong references held on an actor.
    #[must_use]
    pub fn reference_count(&self, id: ActorId) -> u32 {
        self.validate(id);
        self.ownership[id.idx as usize].count()
    }

    /// Returns whether the actor still holds its initial floating reference,
    /// meaning it has never been parented.
    #[must_use]
    pub fn is_floating(&self, id: ActorId) -> bool {
        self.validate(id);
        self.ownership[id.idx as usize].is_floating()
    }

    // -- Observers --

    /// Registers a structural-change observer.
    pub fn connect(&mut self, observer: impl TreeObserver + 'static) -> ObserverId {
        self.observers.connect(Box::new(observer))
    }

    /// Unregisters an observer. Returns `false` if it was not registered.
    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        self.observers.disconnect(id)
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the name of an actor, if it has one.
    #[must_use]
    pub fn name(&self, id: ActorId) -> Option<&str> {
        self.validate(id);
        self.name[id.idx as usize].as_deref()
    }

    /// Returns the position of an actor relative to its parent.
    #[must_use]
    pub fn position(&self, id: ActorId) -> Point {
        self.validate(id);
        self.position[id.idx as usize]
    }

    /// Returns the size of an actor.
    #[must_use]
    pub fn size(&self, id: ActorId) -> Size {
        self.validate(id);
        self.size[id.idx as usize]
    }

    /// Returns the depth (z position) of an actor.
    #[must_use]
    pub fn depth(&self, id: ActorId) -> f64 {
        self.validate(id);
        self.depth[id.idx as usize]
    }

    /// Returns the rotation of an actor around `axis`, in degrees.
    #[must_use]
    pub fn rotation(&self, id: ActorId, axis: RotateAxis) -> f64 {
        self.validate(id);
        self.rotation[id.idx as usize][axis.slot()]
    }

    /// Returns the scale factors of an actor.
    #[must_use]
    pub fn scale(&self, id: ActorId) -> Vec2 {
        self.validate(id);
        self.scale[id.idx as usize]
    }

    /// Returns the opacity of an actor (0 transparent, 255 opaque).
    #[must_use]
    pub fn opacity(&self, id: ActorId) -> u8 {
        self.validate(id);
        self.opacity[id.idx as usize]
    }

    /// Returns whether the actor's own visible flag is set.
    #[must_use]
    pub fn is_visible(&self, id: ActorId) -> bool {
        self.validate(id);
        self.visible[id.idx as usize]
    }

    /// Returns the opacity composed with every ancestor's opacity.
    ///
    /// Only valid after [`take_changes`](Self::take_changes) has been called.
    #[must_use]
    pub fn effective_opacity(&self, id: ActorId) -> u8 {
        self.validate(id);
        self.effective_opacity[id.idx as usize]
    }

    /// Returns whether the actor and all of its ancestors are visible.
    ///
    /// Only valid after [`take_changes`](Self::take_changes) has been called.
    #[must_use]
    pub fn is_effectively_visible(&self, id: ActorId) -> bool {
        self.validate(id);
        self.effective_visible[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets or clears the name of an actor.
    pub fn set_name(&mut self, id: ActorId, name: Option<String>) {
        self.validate(id);
        self.name[id.idx as usize] = name;
    }

    /// Sets the position of an actor relative to its parent.
    pub fn set_position(&mut self, id: ActorId, position: Point) {
        self.validate(id);
        self.position[id.idx as usize] = position;
        self.dirty.mark(id.idx, dirty::GEOMETRY);
    }

    /// Sets the size of an actor.
    pub fn set_size(&mut self, id: ActorId, size: Size) {
        self.validate(id);
        self.size[id.idx as usize] = size;
        self.dirty.mark(id.idx, dirty::GEOMETRY);
    }

    /// Sets the depth (z position) of an actor.
    pub fn set_depth(&mut self, id: ActorId, depth: f64) {
        self.validate(id);
        self.depth[id.idx as usize] = depth;
        self.dirty.mark(id.idx, dirty::GEOMETRY);
    }

    /// Sets the rotation of an actor around `axis`, in degrees.
    pub fn set_rotation(&mut self, id: ActorId, axis: RotateAxis, degrees: f64) {
        self.validate(id);
        self.rotation[id.idx as usize][axis.slot()] = degrees;
        self.dirty.mark(id.idx, dirty::TRANSFORM);
    }

    /// Sets the scale factors of an actor.
    pub fn set_scale(&mut self, id: ActorId, scale: Vec2) {
        self.validate(id);
        self.scale[id.idx as usize] = scale;
        self.dirty.mark(id.idx, dirty::TRANSFORM);
    }

    /// Sets the opacity of an actor.
    ///
    /// Marks the OPACITY channel dirty with eager propagation to descendants.
    pub fn set_opacity(&mut self, id: ActorId, opacity: u8) {
        self.validate(id);
        self.opacity[id.idx as usize] = opacity;
        self.dirty.mark_with(id.idx, dirty::OPACITY, &EagerPolicy);
    }

    /// Shows or hides an actor and, through inheritance, its subtree.
    ///
    /// Marks the VISIBILITY channel dirty with eager propagation to
    /// descendants.
    pub fn set_visible(&mut self, id: ActorId, visible: bool) {
        self.validate(id);
        self.visible[id.idx as usize] = visible;
        self.dirty.mark_with(id.idx, dirty::VISIBILITY, &EagerPolicy);
    }

    // -- Raw-index access for the paint system --

    /// Converts a raw slot index (as found in
    /// [`SceneChanges`](super::SceneChanges) or
    /// [`paint_order`](Self::paint_order)) back into a live handle.
    ///
    /// Returns `None` for indices of freed or never-allocated slots.
    #[must_use]
    pub fn actor_at(&self, idx: u32) -> Option<ActorId> {
        let id = ActorId {
            idx,
            generation: *self.generation.get(idx as usize)?,
        };
        self.is_alive(id).then_some(id)
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: ActorId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale ActorId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Rebuilds a handle for a live slot.
    pub(crate) fn handle(&self, idx: u32) -> ActorId {
        ActorId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns an iterator over the direct children of `idx`.
    pub(crate) fn children_of(&self, idx: u32) -> Children<'_> {
        Children::new(self, self.first_child[idx as usize], self.n_children[idx as usize])
    }

    /// Tears down the subtree rooted at `idx` and frees its slot.
    ///
    /// Events are queued; the caller flushes them.
    pub(crate) fn teardown(&mut self, idx: u32) {
        let me = self.handle(idx);

        // Detach children first so none is left pointing at a freed parent.
        while self.first_child[idx as usize] != INVALID {
            let child = self.first_child[idx as usize];
            let child_id = self.handle(child);
            self.detach(child);
            self.observers.queue(TreeEvent::ChildRemoved {
                parent: me,
                child: child_id,
            });
            if self.ownership[child as usize].release() {
                self.teardown(child);
            }
        }

        if self.parent[idx as usize] != INVALID {
            let parent = self.handle(self.parent[idx as usize]);
            self.detach(idx);
            self.observers.queue(TreeEvent::ChildRemoved { parent, child: me });
        }

        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.name[idx as usize] = None;
        self.live[idx as usize] = false;
        self.destroyed += 1;

        self.free_list.push(idx);
        self.paint_order_dirty = true;
        self.pending_removed.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);

        log::trace!("destroyed {me:?}");
        self.observers.queue(TreeEvent::ActorDestroyed { actor: me });
    }

    /// Marks the subtree rooted at `idx` dirty for inherited channels.
    pub(crate) fn mark_subtree_inherited_dirty(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::OPACITY, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::VISIBILITY, &EagerPolicy);
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Destroyed(Rc<RefCell<Vec<ActorId>>>);

    impl TreeObserver for Destroyed {
        fn actor_destroyed(&mut self, actor: ActorId) {
            self.0.borrow_mut().push(actor);
        }
    }

    #[test]
    fn create_and_destroy() {
        let mut tree = ActorTree::new();
        let id = tree.create_actor();
        assert!(tree.is_alive(id));
        tree.destroy_actor(id);
        assert!(!tree.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut tree = ActorTree::new();
        let id1 = tree.create_actor();
        tree.destroy_actor(id1);
        let id2 = tree.create_actor();
        // id2 reuses the same slot but has a different generation.
        assert!(!tree.is_alive(id1));
        assert!(tree.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn reused_slot_starts_from_defaults() {
        let mut tree = ActorTree::new();
        let id1 = tree.create_named_actor("old");
        tree.set_opacity(id1, 10);
        tree.set_position(id1, Point::new(3.0, 4.0));
        tree.destroy_actor(id1);

        let id2 = tree.create_actor();
        assert_eq!(tree.name(id2), None);
        assert_eq!(tree.opacity(id2), 255);
        assert_eq!(tree.position(id2), Point::ORIGIN);
        assert!(tree.is_floating(id2));
    }

    #[test]
    fn properties_round_trip() {
        let mut tree = ActorTree::new();
        let id = tree.create_named_actor("hero");
        tree.set_position(id, Point::new(10.0, 20.0));
        tree.set_size(id, Size::new(64.0, 32.0));
        tree.set_depth(id, -5.0);
        tree.set_rotation(id, RotateAxis::Z, 90.0);
        tree.set_scale(id, Vec2::new(2.0, 0.5));
        tree.set_opacity(id, 128);
        tree.set_visible(id, false);

        assert_eq!(tree.name(id), Some("hero"));
        assert_eq!(tree.position(id), Point::new(10.0, 20.0));
        assert_eq!(tree.size(id), Size::new(64.0, 32.0));
        assert_eq!(tree.depth(id), -5.0);
        assert_eq!(tree.rotation(id, RotateAxis::Z), 90.0);
        assert_eq!(tree.rotation(id, RotateAxis::X), 0.0);
        assert_eq!(tree.scale(id), Vec2::new(2.0, 0.5));
        assert_eq!(tree.opacity(id), 128);
        assert!(!tree.is_visible(id));
    }

    #[test]
    fn release_floating_actor_destroys_it() {
        let mut tree = ActorTree::new();
        let id = tree.create_actor();
        assert_eq!(tree.reference_count(id), 1);
        tree.release_actor(id);
        assert!(!tree.is_alive(id));
    }

    #[test]
    fn retained_actor_survives_one_release() {
        let mut tree = ActorTree::new();
        let id = tree.create_actor();
        tree.retain_actor(id);
        tree.release_actor(id);
        assert!(tree.is_alive(id));
        tree.release_actor(id);
        assert!(!tree.is_alive(id));
    }

    #[test]
    fn destroy_tears_down_owned_children() {
        let mut tree = ActorTree::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        tree.connect(Destroyed(log.clone()));

        let root = tree.create_actor();
        let a = tree.create_actor();
        let b = tree.create_actor();
        let grandchild = tree.create_actor();
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();
        tree.add_child(a, grandchild).unwrap();

        tree.destroy_actor(root);

        assert!(!tree.is_alive(root));
        assert!(!tree.is_alive(a));
        assert!(!tree.is_alive(b));
        assert!(!tree.is_alive(grandchild));
        assert_eq!(*log.borrow(), vec![grandchild, a, b, root]);
    }

    #[test]
    fn destroy_keeps_retained_children_as_roots() {
        let mut tree = ActorTree::new();
        let root = tree.create_actor();
        let kept = tree.create_actor();
        tree.add_child(root, kept).unwrap();
        tree.retain_actor(kept);

        tree.destroy_actor(root);

        assert!(tree.is_alive(kept));
        assert_eq!(tree.parent(kept), None);
        assert!(tree.roots().contains(&kept));
    }

    #[test]
    fn liveness_tracks_free_and_reuse() {
        let mut tree = ActorTree::new();
        let ids: Vec<_> = (0..8).map(|_| tree.create_actor()).collect();
        for &id in ids.iter().step_by(2) {
            tree.destroy_actor(id);
        }
        let live: Vec<_> = ids.iter().copied().skip(1).step_by(2).collect();
        assert_eq!(tree.roots(), live);

        let reused = tree.create_actor();
        assert!(tree.is_alive(reused));
        assert!(ids.iter().step_by(2).all(|&id| !tree.is_alive(id)));
        assert_eq!(tree.roots().len(), live.len() + 1);

        let _ = tree.take_changes();
        assert_eq!(tree.paint_order().len(), live.len() + 1);
        assert!(tree.paint_order().contains(&reused.idx));
    }

    #[test]
    fn actor_at_maps_live_slots_only() {
        let mut tree = ActorTree::new();
        let a = tree.create_actor();
        let b = tree.create_actor();
        tree.destroy_actor(a);

        assert_eq!(tree.actor_at(a.index()), None);
        assert_eq!(tree.actor_at(b.index()), Some(b));
        assert_eq!(tree.actor_at(99), None);
    }

    #[test]
    #[should_panic(expected = "stale ActorId")]
    fn destroyed_handle_panics_on_get_position() {
        let mut tree = ActorTree::new();
        let id = tree.create_actor();
        tree.destroy_actor(id);
        let _ = tree.position(id);
    }

    #[test]
    #[should_panic(expected = "stale ActorId")]
    fn destroyed_handle_panics_on_set_opacity() {
        let mut tree = ActorTree::new();
        let id = tree.create_actor();
        tree.destroy_actor(id);
        tree.set_opacity(id, 0);
    }

    #[test]
    #[should_panic(expected = "stale ActorId")]
    fn destroyed_handle_panics_on_add_child() {
        let mut tree = ActorTree::new();
        let root = tree.create_actor();
        let id = tree.create_actor();
        tree.destroy_actor(id);
        let _ = tree.add_child(root, id);
    }

    #[test]
    fn set_opacity_marks_dirty() {
        let mut tree = ActorTree::new();
        let id = tree.create_actor();
        // Consume initial creation dirtiness.
        let _ = tree.take_changes();

        tree.set_opacity(id, 100);
        let changes = tree.take_changes();
        assert!(
            changes.opacities.contains(&id.idx),
            "opacity channel should contain the actor"
        );
    }

    #[test]
    fn set_position_marks_geometry_only() {
        let mut tree = ActorTree::new();
        let id = tree.create_actor();
        let _ = tree.take_changes();

        tree.set_position(id, Point::new(1.0, 1.0));
        let changes = tree.take_changes();
        assert!(changes.geometry.contains(&id.idx), "geometry channel");
        assert!(changes.transforms.is_empty(), "transform channel untouched");
        assert!(changes.opacities.is_empty(), "opacity channel untouched");
    }
}
