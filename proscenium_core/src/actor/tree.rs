// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural mutation and queries.
//!
//! Children of an actor form a doubly linked list in paint order: the first
//! child is painted first (bottom of the stack) and the last child is painted
//! last (top). "Above" and "raise" move towards the last child, "below" and
//! "lower" towards the first.
//!
//! Every mutation validates its preconditions before touching any link, so a
//! failed call leaves the tree unchanged. Observers are notified once the
//! whole operation has been committed.

use alloc::vec::Vec;

use super::id::{ActorId, INVALID};
use super::observer::TreeEvent;
use super::store::ActorTree;
use super::traverse::Children;
use crate::dirty;
use crate::error::TreeError;

/// Logs a rejected operation and returns it as an error.
fn reject<T>(err: TreeError) -> Result<T, TreeError> {
    log::error!("invalid tree operation: {err}");
    Err(err)
}

impl ActorTree {
    // -- Insertion --

    /// Adds `child` as the last child of `parent`.
    ///
    /// `parent` takes ownership of `child`, sinking its floating reference.
    ///
    /// # Errors
    ///
    /// Fails if `child` is `parent`, already has a parent, or is an ancestor
    /// of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn add_child(&mut self, parent: ActorId, child: ActorId) -> Result<(), TreeError> {
        self.validate(parent);
        self.validate(child);
        self.check_insertable(parent, child)?;

        let last = self.last_child[parent.idx as usize];
        self.attach(parent.idx, child.idx, last);
        self.observers.flush();
        Ok(())
    }

    /// Inserts `child` so that it ends up at position `index` among the
    /// children of `parent` (0 is the first child).
    ///
    /// A negative `index`, or one not smaller than the current number of
    /// children, appends.
    ///
    /// # Errors
    ///
    /// Same as [`add_child`](Self::add_child).
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn insert_child_at_index(
        &mut self,
        parent: ActorId,
        child: ActorId,
        index: isize,
    ) -> Result<(), TreeError> {
        self.validate(parent);
        self.validate(child);
        self.check_insertable(parent, child)?;

        let p = parent.idx;
        let prev = self.prev_for_index(p, index);
        self.attach(p, child.idx, prev);
        self.observers.flush();
        Ok(())
    }

    /// Inserts `child` immediately above `sibling`, or as the last child when
    /// `sibling` is `None`.
    ///
    /// # Errors
    ///
    /// Same as [`add_child`](Self::add_child), plus
    /// [`TreeError::NotAChild`] if `sibling` is not a child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if any handle is stale.
    pub fn insert_child_above(
        &mut self,
        parent: ActorId,
        child: ActorId,
        sibling: Option<ActorId>,
    ) -> Result<(), TreeError> {
        self.validate(parent);
        self.validate(child);
        self.check_insertable(parent, child)?;

        let p = parent.idx;
        let prev = match sibling {
            None => self.last_child[p as usize],
            Some(sibling) => {
                self.check_child(parent, sibling)?;
                sibling.idx
            }
        };
        self.attach(p, child.idx, prev);
        self.observers.flush();
        Ok(())
    }

    /// Inserts `child` immediately below `sibling`, or as the first child
    /// when `sibling` is `None`.
    ///
    /// # Errors
    ///
    /// Same as [`insert_child_above`](Self::insert_child_above).
    ///
    /// # Panics
    ///
    /// Panics if any handle is stale.
    pub fn insert_child_below(
        &mut self,
        parent: ActorId,
        child: ActorId,
        sibling: Option<ActorId>,
    ) -> Result<(), TreeError> {
        self.validate(parent);
        self.validate(child);
        self.check_insertable(parent, child)?;

        let p = parent.idx;
        let prev = match sibling {
            None => INVALID,
            Some(sibling) => {
                self.check_child(parent, sibling)?;
                self.prev_sibling[sibling.idx as usize]
            }
        };
        self.attach(p, child.idx, prev);
        self.observers.flush();
        Ok(())
    }

    // -- Removal --

    /// Removes `child` from `parent` and releases the parent's ownership.
    ///
    /// The child is destroyed unless something else still holds it.
    ///
    /// # Errors
    ///
    /// Fails with [`TreeError::NotAChild`] if `child`'s parent is not
    /// `parent`, including when it was already removed.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn remove_child(&mut self, parent: ActorId, child: ActorId) -> Result<(), TreeError> {
        self.validate(parent);
        self.validate(child);
        self.check_child(parent, child)?;

        let c = child.idx;
        self.detach(c);
        self.observers
            .queue(TreeEvent::ChildRemoved { parent, child });
        if self.ownership[c as usize].release() {
            self.teardown(c);
        }
        self.observers.flush();
        Ok(())
    }

    /// Removes every child of `parent` in one batch.
    ///
    /// All children are unlinked before any of them is released, and
    /// observers receive one `child_removed` per child, first to last, after
    /// the batch is committed. The end state matches calling
    /// [`remove_child`](Self::remove_child) for each child.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove_all_children(&mut self, parent: ActorId) {
        self.validate(parent);
        let p = parent.idx;

        let mut removed = Vec::with_capacity(self.n_children[p as usize] as usize);
        while self.first_child[p as usize] != INVALID {
            let c = self.first_child[p as usize];
            let child = self.handle(c);
            self.detach(c);
            self.observers
                .queue(TreeEvent::ChildRemoved { parent, child });
            removed.push(c);
        }

        for c in removed {
            if self.ownership[c as usize].release() {
                self.teardown(c);
            }
        }
        self.observers.flush();
    }

    /// Replaces `old_child` with `new_child` at the same position.
    ///
    /// Observers see `child_removed(old_child)` followed by
    /// `child_added(new_child)` only after the swap is complete, so the gap
    /// is never observable. `old_child` is released afterwards.
    ///
    /// # Errors
    ///
    /// Fails with [`TreeError::NotAChild`] if `old_child` is not a child of
    /// `parent`, or with any [`add_child`](Self::add_child) error for
    /// `new_child`.
    ///
    /// # Panics
    ///
    /// Panics if any handle is stale.
    pub fn replace_child(
        &mut self,
        parent: ActorId,
        old_child: ActorId,
        new_child: ActorId,
    ) -> Result<(), TreeError> {
        self.validate(parent);
        self.validate(old_child);
        self.validate(new_child);
        self.check_child(parent, old_child)?;
        self.check_insertable(parent, new_child)?;

        let old = old_child.idx;
        let prev = self.prev_sibling[old as usize];
        self.detach(old);
        self.observers.queue(TreeEvent::ChildRemoved {
            parent,
            child: old_child,
        });
        self.attach(parent.idx, new_child.idx, prev);

        if self.ownership[old as usize].release() {
            self.teardown(old);
        }
        self.observers.flush();
        Ok(())
    }

    // -- Reordering --

    /// Moves `actor` immediately above `sibling`.
    ///
    /// # Errors
    ///
    /// Fails if `actor` is `sibling`, if `actor` has no parent, or if the two
    /// do not share a parent.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn raise(&mut self, actor: ActorId, sibling: ActorId) -> Result<(), TreeError> {
        let p = self.check_siblings(actor, sibling)?;
        let a = actor.idx;
        if self.next_sibling[sibling.idx as usize] == a {
            return Ok(());
        }
        self.splice_out(a);
        self.splice_after(p, a, sibling.idx);
        self.reordered(p);
        Ok(())
    }

    /// Moves `actor` immediately below `sibling`.
    ///
    /// # Errors
    ///
    /// Same as [`raise`](Self::raise).
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn lower(&mut self, actor: ActorId, sibling: ActorId) -> Result<(), TreeError> {
        let p = self.check_siblings(actor, sibling)?;
        let a = actor.idx;
        if self.prev_sibling[sibling.idx as usize] == a {
            return Ok(());
        }
        self.splice_out(a);
        let prev = self.prev_sibling[sibling.idx as usize];
        self.splice_after(p, a, prev);
        self.reordered(p);
        Ok(())
    }

    /// Moves `actor` to be the last child of its parent.
    ///
    /// # Errors
    ///
    /// Fails with [`TreeError::NoParent`] if `actor` is detached.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn raise_top(&mut self, actor: ActorId) -> Result<(), TreeError> {
        let p = self.check_parented(actor)?;
        let a = actor.idx;
        if self.last_child[p as usize] == a {
            return Ok(());
        }
        self.splice_out(a);
        let last = self.last_child[p as usize];
        self.splice_after(p, a, last);
        self.reordered(p);
        Ok(())
    }

    /// Moves `actor` to be the first child of its parent.
    ///
    /// # Errors
    ///
    /// Fails with [`TreeError::NoParent`] if `actor` is detached.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn lower_bottom(&mut self, actor: ActorId) -> Result<(), TreeError> {
        let p = self.check_parented(actor)?;
        let a = actor.idx;
        if self.first_child[p as usize] == a {
            return Ok(());
        }
        self.splice_out(a);
        self.splice_after(p, a, INVALID);
        self.reordered(p);
        Ok(())
    }

    /// Moves an existing child of `parent` to position `index`.
    ///
    /// Out-of-range and negative indices move the child to the end, the same
    /// as [`insert_child_at_index`](Self::insert_child_at_index).
    ///
    /// # Errors
    ///
    /// Fails with [`TreeError::NotAChild`] if `child` is not a child of
    /// `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn set_child_at_index(
        &mut self,
        parent: ActorId,
        child: ActorId,
        index: isize,
    ) -> Result<(), TreeError> {
        self.validate(parent);
        self.validate(child);
        self.check_child(parent, child)?;

        let (p, c) = (parent.idx, child.idx);
        let old_prev = self.prev_sibling[c as usize];
        self.splice_out(c);
        let prev = self.prev_for_index(p, index);
        self.splice_after(p, c, prev);
        if prev != old_prev {
            self.reordered(p);
        }
        Ok(())
    }

    // -- Queries --

    /// Returns the parent of an actor, if any.
    #[must_use]
    pub fn parent(&self, id: ActorId) -> Option<ActorId> {
        self.validate(id);
        self.link(self.parent[id.idx as usize])
    }

    /// Returns an iterator over the direct children of an actor.
    #[must_use]
    pub fn children(&self, id: ActorId) -> Children<'_> {
        self.validate(id);
        self.children_of(id.idx)
    }

    /// Returns the first (bottom-most) child of an actor.
    #[must_use]
    pub fn first_child(&self, id: ActorId) -> Option<ActorId> {
        self.validate(id);
        self.link(self.first_child[id.idx as usize])
    }

    /// Returns the last (top-most) child of an actor.
    #[must_use]
    pub fn last_child(&self, id: ActorId) -> Option<ActorId> {
        self.validate(id);
        self.link(self.last_child[id.idx as usize])
    }

    /// Returns the sibling immediately above an actor.
    #[must_use]
    pub fn next_sibling(&self, id: ActorId) -> Option<ActorId> {
        self.validate(id);
        self.link(self.next_sibling[id.idx as usize])
    }

    /// Returns the sibling immediately below an actor.
    #[must_use]
    pub fn previous_sibling(&self, id: ActorId) -> Option<ActorId> {
        self.validate(id);
        self.link(self.prev_sibling[id.idx as usize])
    }

    /// Returns the number of direct children of an actor.
    #[must_use]
    pub fn n_children(&self, id: ActorId) -> usize {
        self.validate(id);
        self.n_children[id.idx as usize] as usize
    }

    /// Returns the child at position `index`, or `None` if out of range.
    ///
    /// Walks from whichever end of the sibling list is nearer.
    #[must_use]
    pub fn child_at_index(&self, parent: ActorId, index: usize) -> Option<ActorId> {
        self.validate(parent);
        if index >= self.n_children[parent.idx as usize] as usize {
            return None;
        }
        Some(self.handle(self.nth_child(parent.idx, index)))
    }

    /// Returns the position of `child` among the children of `parent`, or
    /// `None` if it is not a child of `parent`.
    #[must_use]
    pub fn child_index(&self, parent: ActorId, child: ActorId) -> Option<usize> {
        self.validate(parent);
        self.validate(child);
        if self.parent[child.idx as usize] != parent.idx {
            return None;
        }
        self.children_of(parent.idx).position(|c| c == child)
    }

    /// Returns whether `descendant` is `ancestor` or lies in its subtree.
    #[must_use]
    pub fn contains(&self, ancestor: ActorId, descendant: ActorId) -> bool {
        self.validate(ancestor);
        self.validate(descendant);
        self.is_ancestor(ancestor.idx, descendant.idx)
    }

    /// Returns the first direct child of `parent` with the given name.
    #[must_use]
    pub fn find_child_by_name(&self, parent: ActorId, name: &str) -> Option<ActorId> {
        self.validate(parent);
        self.children_of(parent.idx)
            .find(|c| self.name[c.idx as usize].as_deref() == Some(name))
    }

    /// Returns the live actors that have no parent, in slot order.
    #[must_use]
    pub fn roots(&self) -> Vec<ActorId> {
        let mut roots = Vec::new();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && self.live[idx as usize] {
                roots.push(self.handle(idx));
            }
        }
        roots
    }

    // -- Internal helpers --

    /// Converts a raw link into an optional handle.
    fn link(&self, idx: u32) -> Option<ActorId> {
        (idx != INVALID).then(|| self.handle(idx))
    }

    fn check_insertable(&self, parent: ActorId, child: ActorId) -> Result<(), TreeError> {
        if parent == child {
            return reject(TreeError::SelfParenting { actor: child });
        }
        let current = self.parent[child.idx as usize];
        if current != INVALID {
            return reject(TreeError::AlreadyParented {
                child,
                parent: self.handle(current),
            });
        }
        if self.is_ancestor(child.idx, parent.idx) {
            return reject(TreeError::Cycle { parent, child });
        }
        Ok(())
    }

    fn check_child(&self, parent: ActorId, child: ActorId) -> Result<(), TreeError> {
        self.validate(child);
        if self.parent[child.idx as usize] != parent.idx {
            return reject(TreeError::NotAChild { parent, child });
        }
        Ok(())
    }

    fn check_parented(&self, actor: ActorId) -> Result<u32, TreeError> {
        self.validate(actor);
        let p = self.parent[actor.idx as usize];
        if p == INVALID {
            return reject(TreeError::NoParent { actor });
        }
        Ok(p)
    }

    fn check_siblings(&self, actor: ActorId, sibling: ActorId) -> Result<u32, TreeError> {
        self.validate(sibling);
        if actor == sibling {
            return reject(TreeError::SelfSibling { actor });
        }
        let p = self.check_parented(actor)?;
        if self.parent[sibling.idx as usize] != p {
            return reject(TreeError::NotSiblings { actor, sibling });
        }
        Ok(p)
    }

    /// Whether `ancestor` is `idx` or one of its ancestors.
    fn is_ancestor(&self, ancestor: u32, mut idx: u32) -> bool {
        while idx != INVALID {
            if idx == ancestor {
                return true;
            }
            idx = self.parent[idx as usize];
        }
        false
    }

    /// Returns the raw index of child `n` of `p`, walking from the nearer end.
    ///
    /// `n` must be in range.
    fn nth_child(&self, p: u32, n: usize) -> u32 {
        let count = self.n_children[p as usize] as usize;
        debug_assert!(n < count, "child index {n} out of range ({count})");
        if n <= count / 2 {
            let mut idx = self.first_child[p as usize];
            for _ in 0..n {
                idx = self.next_sibling[idx as usize];
            }
            idx
        } else {
            let mut idx = self.last_child[p as usize];
            for _ in 0..(count - 1 - n) {
                idx = self.prev_sibling[idx as usize];
            }
            idx
        }
    }

    /// The sibling that should precede a child placed at `index` under `p`.
    fn prev_for_index(&self, p: u32, index: isize) -> u32 {
        match usize::try_from(index) {
            Ok(0) if self.n_children[p as usize] > 0 => INVALID,
            Ok(i) if i < self.n_children[p as usize] as usize => self.nth_child(p, i - 1),
            _ => self.last_child[p as usize],
        }
    }

    /// Links `c` into the sibling list of `p` right after `prev`
    /// (`INVALID` makes it the first child).
    fn splice_after(&mut self, p: u32, c: u32, prev: u32) {
        let next = if prev == INVALID {
            self.first_child[p as usize]
        } else {
            self.next_sibling[prev as usize]
        };

        self.prev_sibling[c as usize] = prev;
        self.next_sibling[c as usize] = next;

        if prev == INVALID {
            self.first_child[p as usize] = c;
        } else {
            self.next_sibling[prev as usize] = c;
        }
        if next == INVALID {
            self.last_child[p as usize] = c;
        } else {
            self.prev_sibling[next as usize] = c;
        }

        self.n_children[p as usize] += 1;
        self.paint_order_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Unlinks `c` from its parent's sibling list, leaving `parent[c]` set.
    fn splice_out(&mut self, c: u32) {
        let p = self.parent[c as usize];
        let prev = self.prev_sibling[c as usize];
        let next = self.next_sibling[c as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        } else {
            self.last_child[p as usize] = prev;
        }

        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;
        self.n_children[p as usize] -= 1;
        self.paint_order_dirty = true;
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Parents `c` under `p` after `prev` and takes ownership of it.
    fn attach(&mut self, p: u32, c: u32, prev: u32) {
        self.parent[c as usize] = p;
        self.splice_after(p, c, prev);

        // Inherited paint state of the child depends on the parent.
        let _ = self.dirty.add_dependency(c, p, dirty::OPACITY);
        let _ = self.dirty.add_dependency(c, p, dirty::VISIBILITY);
        self.mark_subtree_inherited_dirty(c);

        self.ownership[c as usize].sink();
        self.observers.queue(TreeEvent::ChildAdded {
            parent: self.handle(p),
            child: self.handle(c),
        });
    }

    /// Unparents `c` without touching ownership or queueing events.
    pub(crate) fn detach(&mut self, c: u32) {
        let p = self.parent[c as usize];
        self.splice_out(c);
        self.parent[c as usize] = INVALID;

        self.dirty.remove_dependency(c, p, dirty::OPACITY);
        self.dirty.remove_dependency(c, p, dirty::VISIBILITY);
        self.mark_subtree_inherited_dirty(c);
    }

    fn reordered(&mut self, p: u32) {
        let parent = self.handle(p);
        self.observers
            .queue(TreeEvent::ChildrenReordered { parent });
        self.observers.flush();
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;

    use super::*;
    use crate::actor::TreeObserver;

    fn parent_with(tree: &mut ActorTree, names: &[&str]) -> (ActorId, Vec<ActorId>) {
        let parent = tree.create_actor();
        let kids = names
            .iter()
            .map(|name| {
                let kid = tree.create_named_actor(*name);
                tree.add_child(parent, kid).unwrap();
                kid
            })
            .collect();
        (parent, kids)
    }

    fn names(tree: &ActorTree, parent: ActorId) -> Vec<&str> {
        tree.children(parent)
            .map(|c| tree.name(c).unwrap_or("?"))
            .collect()
    }

    /// Checks the sibling-list invariants of `parent` in both directions.
    fn assert_links(tree: &ActorTree, parent: ActorId) {
        let forward: Vec<_> = tree.children(parent).collect();
        assert_eq!(forward.len(), tree.n_children(parent), "child count");

        let mut backward = Vec::new();
        let mut cur = tree.last_child(parent);
        while let Some(c) = cur {
            backward.push(c);
            cur = tree.previous_sibling(c);
        }
        backward.reverse();
        assert_eq!(forward, backward, "forward and backward walks agree");

        if let Some(first) = tree.first_child(parent) {
            assert_eq!(tree.previous_sibling(first), None, "first has no prev");
        }
        if let Some(last) = tree.last_child(parent) {
            assert_eq!(tree.next_sibling(last), None, "last has no next");
        }
        for c in forward {
            assert_eq!(tree.parent(c), Some(parent), "parent link");
        }
    }

    #[derive(Default)]
    struct Recorder(Rc<RefCell<Vec<TreeEvent>>>);

    impl TreeObserver for Recorder {
        fn child_added(&mut self, parent: ActorId, child: ActorId) {
            self.0
                .borrow_mut()
                .push(TreeEvent::ChildAdded { parent, child });
        }

        fn child_removed(&mut self, parent: ActorId, child: ActorId) {
            self.0
                .borrow_mut()
                .push(TreeEvent::ChildRemoved { parent, child });
        }

        fn children_reordered(&mut self, parent: ActorId) {
            self.0
                .borrow_mut()
                .push(TreeEvent::ChildrenReordered { parent });
        }

        fn actor_destroyed(&mut self, actor: ActorId) {
            self.0
                .borrow_mut()
                .push(TreeEvent::ActorDestroyed { actor });
        }
    }

    #[test]
    fn add_child_appends_in_order() {
        let mut tree = ActorTree::new();
        let (parent, kids) = parent_with(&mut tree, &["foo", "bar", "baz"]);

        assert_eq!(tree.n_children(parent), 3);
        assert_eq!(tree.first_child(parent), Some(kids[0]));
        assert_eq!(tree.last_child(parent), Some(kids[2]));
        assert_eq!(tree.next_sibling(kids[0]), Some(kids[1]));
        assert_eq!(tree.next_sibling(kids[1]), Some(kids[2]));
        assert_eq!(tree.next_sibling(kids[2]), None);
        assert_eq!(tree.previous_sibling(kids[2]), Some(kids[1]));
        assert_eq!(tree.previous_sibling(kids[0]), None);
        assert_eq!(names(&tree, parent), ["foo", "bar", "baz"]);
        assert_links(&tree, parent);
    }

    #[test]
    fn forward_walk_takes_n_minus_one_steps() {
        let mut tree = ActorTree::new();
        let (parent, _) = parent_with(&mut tree, &["a", "b", "c", "d", "e"]);

        let mut steps = 0;
        let mut cur = tree.first_child(parent).unwrap();
        while let Some(next) = tree.next_sibling(cur) {
            cur = next;
            steps += 1;
        }
        assert_eq!(steps, tree.n_children(parent) - 1);
        assert_eq!(Some(cur), tree.last_child(parent));
    }

    #[test]
    fn insert_child_at_index_and_siblings() {
        let mut tree = ActorTree::new();
        let parent = tree.create_actor();
        let foo = tree.create_named_actor("foo");
        tree.insert_child_at_index(parent, foo, 0).unwrap();
        assert_eq!(tree.first_child(parent), Some(foo));
        assert_eq!(tree.child_at_index(parent, 0), Some(foo));

        let bar = tree.create_named_actor("bar");
        tree.insert_child_below(parent, bar, Some(foo)).unwrap();
        assert_eq!(tree.n_children(parent), 2);
        assert_eq!(names(&tree, parent), ["bar", "foo"]);
        assert_eq!(tree.child_at_index(parent, 1), Some(foo));

        let baz = tree.create_named_actor("baz");
        tree.insert_child_above(parent, baz, Some(bar)).unwrap();
        assert_eq!(names(&tree, parent), ["bar", "baz", "foo"]);
        assert_links(&tree, parent);
    }

    #[test]
    fn insert_at_index_round_trips_for_every_position() {
        for i in 0..=4 {
            let mut tree = ActorTree::new();
            let (parent, _) = parent_with(&mut tree, &["a", "b", "c", "d"]);
            let x = tree.create_named_actor("x");
            tree.insert_child_at_index(parent, x, i).unwrap();
            assert_eq!(tree.child_at_index(parent, i as usize), Some(x), "index {i}");
            assert_links(&tree, parent);
        }
    }

    #[test]
    fn out_of_range_insert_appends() {
        let mut tree = ActorTree::new();
        let (parent, _) = parent_with(&mut tree, &["a", "b"]);
        let neg = tree.create_named_actor("neg");
        let big = tree.create_named_actor("big");
        tree.insert_child_at_index(parent, neg, -1).unwrap();
        tree.insert_child_at_index(parent, big, 100).unwrap();
        assert_eq!(names(&tree, parent), ["a", "b", "neg", "big"]);
    }

    #[test]
    fn insert_into_empty_parent_at_any_index() {
        let mut tree = ActorTree::new();
        let parent = tree.create_actor();
        let only = tree.create_actor();
        tree.insert_child_at_index(parent, only, 5).unwrap();
        assert_eq!(tree.first_child(parent), Some(only));
        assert_eq!(tree.last_child(parent), Some(only));
    }

    #[test]
    fn insert_relative_to_none_appends_or_prepends() {
        let mut tree = ActorTree::new();
        let (parent, _) = parent_with(&mut tree, &["mid"]);
        let top = tree.create_named_actor("top");
        let bottom = tree.create_named_actor("bottom");
        tree.insert_child_above(parent, top, None).unwrap();
        tree.insert_child_below(parent, bottom, None).unwrap();
        assert_eq!(names(&tree, parent), ["bottom", "mid", "top"]);
    }

    #[test]
    fn insert_relative_to_foreign_sibling_fails() {
        let mut tree = ActorTree::new();
        let (parent, _) = parent_with(&mut tree, &["a"]);
        let (_, other_kids) = parent_with(&mut tree, &["elsewhere"]);
        let x = tree.create_actor();

        let err = tree.insert_child_above(parent, x, Some(other_kids[0]));
        assert_eq!(
            err,
            Err(TreeError::NotAChild {
                parent,
                child: other_kids[0]
            })
        );
        assert_eq!(tree.parent(x), None);
        assert_eq!(tree.n_children(parent), 1);
    }

    #[test]
    fn remove_child_updates_links() {
        let mut tree = ActorTree::new();
        let (parent, kids) = parent_with(&mut tree, &["foo", "bar"]);
        assert_ne!(tree.first_child(parent), tree.last_child(parent));

        tree.remove_child(parent, kids[0]).unwrap();
        assert_eq!(tree.n_children(parent), 1);
        assert_eq!(names(&tree, parent), ["bar"]);
        assert_eq!(tree.first_child(parent), tree.last_child(parent));

        tree.remove_child(parent, kids[1]).unwrap();
        assert_eq!(tree.n_children(parent), 0);
        assert_eq!(tree.first_child(parent), None);
        assert_eq!(tree.last_child(parent), None);
    }

    #[test]
    fn remove_child_destroys_unowned_child() {
        let mut tree = ActorTree::new();
        let (parent, kids) = parent_with(&mut tree, &["gone"]);
        tree.remove_child(parent, kids[0]).unwrap();
        assert!(!tree.is_alive(kids[0]));
    }

    #[test]
    fn remove_child_keeps_retained_child() {
        let mut tree = ActorTree::new();
        let (parent, kids) = parent_with(&mut tree, &["kept"]);
        tree.retain_actor(kids[0]);
        tree.remove_child(parent, kids[0]).unwrap();
        assert!(tree.is_alive(kids[0]));
        assert_eq!(tree.parent(kids[0]), None);

        // It can be parented again.
        tree.add_child(parent, kids[0]).unwrap();
        assert_eq!(tree.reference_count(kids[0]), 2);
    }

    #[test]
    fn second_remove_reports_not_a_child() {
        let mut tree = ActorTree::new();
        let (parent, kids) = parent_with(&mut tree, &["a", "b"]);
        tree.retain_actor(kids[0]);
        tree.remove_child(parent, kids[0]).unwrap();
        assert_eq!(
            tree.remove_child(parent, kids[0]),
            Err(TreeError::NotAChild {
                parent,
                child: kids[0]
            })
        );
        assert_eq!(tree.n_children(parent), 1);
    }

    #[test]
    fn remove_all_children_empties_parent() {
        let mut tree = ActorTree::new();
        let (parent, kids) = parent_with(&mut tree, &["foo", "bar", "baz"]);
        assert_eq!(tree.n_children(parent), 3);

        tree.remove_all_children(parent);

        assert_eq!(tree.n_children(parent), 0);
        assert_eq!(tree.first_child(parent), None);
        assert_eq!(tree.last_child(parent), None);
        for kid in kids {
            assert!(!tree.is_alive(kid));
        }
    }

    #[test]
    fn remove_all_children_notifies_after_commit() {
        let mut tree = ActorTree::new();
        let (parent, kids) = parent_with(&mut tree, &["a", "b"]);
        let log = Rc::new(RefCell::new(Vec::new()));
        tree.connect(Recorder(log.clone()));

        tree.remove_all_children(parent);

        assert_eq!(
            *log.borrow(),
            vec![
                TreeEvent::ChildRemoved {
                    parent,
                    child: kids[0]
                },
                TreeEvent::ChildRemoved {
                    parent,
                    child: kids[1]
                },
                TreeEvent::ActorDestroyed { actor: kids[0] },
                TreeEvent::ActorDestroyed { actor: kids[1] },
            ]
        );
    }

    #[test]
    fn replace_child_keeps_position() {
        let mut tree = ActorTree::new();
        let (parent, kids) = parent_with(&mut tree, &["foo", "bar"]);

        let baz = tree.create_named_actor("baz");
        tree.replace_child(parent, kids[0], baz).unwrap();
        assert_eq!(names(&tree, parent), ["baz", "bar"]);

        let qux = tree.create_named_actor("qux");
        tree.replace_child(parent, kids[1], qux).unwrap();
        assert_eq!(names(&tree, parent), ["baz", "qux"]);

        let foo = tree.create_named_actor("foo");
        tree.add_child(parent, foo).unwrap();
        let bar = tree.create_named_actor("bar");
        tree.replace_child(parent, qux, bar).unwrap();
        assert_eq!(names(&tree, parent), ["baz", "bar", "foo"]);
        assert_links(&tree, parent);
        assert!(!tree.is_alive(kids[0]));
        assert!(!tree.is_alive(qux));
    }

    #[test]
    fn replace_child_events_see_final_state() {
        let mut tree = ActorTree::new();
        let (parent, kids) = parent_with(&mut tree, &["old"]);
        tree.retain_actor(kids[0]);
        let log = Rc::new(RefCell::new(Vec::new()));
        tree.connect(Recorder(log.clone()));

        let new = tree.create_actor();
        tree.replace_child(parent, kids[0], new).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                TreeEvent::ChildRemoved {
                    parent,
                    child: kids[0]
                },
                TreeEvent::ChildAdded { parent, child: new },
            ]
        );
    }

    #[test]
    fn replace_with_parented_actor_fails_without_change() {
        let mut tree = ActorTree::new();
        let (parent, kids) = parent_with(&mut tree, &["a", "b"]);
        let err = tree.replace_child(parent, kids[0], kids[1]);
        assert_eq!(
            err,
            Err(TreeError::AlreadyParented {
                child: kids[1],
                parent
            })
        );
        assert_eq!(names(&tree, parent), ["a", "b"]);
    }

    #[test]
    fn raise_and_raise_top() {
        let mut tree = ActorTree::new();
        let (parent, _) = parent_with(&mut tree, &["foo", "bar", "baz"]);
        assert_eq!(tree.n_children(parent), 3);

        let bar = tree.child_at_index(parent, 1).unwrap();
        assert_eq!(tree.name(bar), Some("bar"));
        let baz = tree.child_at_index(parent, 2).unwrap();
        tree.raise(bar, baz).unwrap();
        assert_eq!(names(&tree, parent), ["foo", "baz", "bar"]);

        let foo = tree.child_at_index(parent, 0).unwrap();
        tree.raise_top(foo).unwrap();
        assert_eq!(names(&tree, parent), ["baz", "bar", "foo"]);
        assert_links(&tree, parent);
    }

    #[test]
    fn lower_and_lower_bottom() {
        let mut tree = ActorTree::new();
        let (parent, _) = parent_with(&mut tree, &["foo", "bar", "baz"]);

        let bar = tree.child_at_index(parent, 1).unwrap();
        let foo = tree.child_at_index(parent, 0).unwrap();
        tree.lower(bar, foo).unwrap();
        assert_eq!(names(&tree, parent), ["bar", "foo", "baz"]);

        let baz = tree.child_at_index(parent, 2).unwrap();
        tree.lower_bottom(baz).unwrap();
        assert_eq!(names(&tree, parent), ["baz", "bar", "foo"]);
        assert_links(&tree, parent);
    }

    #[test]
    fn raise_leaves_other_siblings_in_order() {
        let mut tree = ActorTree::new();
        let (parent, kids) = parent_with(&mut tree, &["a", "b", "c", "d", "e"]);
        tree.raise(kids[1], kids[3]).unwrap();
        assert_eq!(names(&tree, parent), ["a", "c", "d", "b", "e"]);
        tree.lower(kids[4], kids[0]).unwrap();
        assert_eq!(names(&tree, parent), ["e", "a", "c", "d", "b"]);
        assert_links(&tree, parent);
    }

    #[test]
    fn reorder_in_place_emits_nothing() {
        let mut tree = ActorTree::new();
        let (_, kids) = parent_with(&mut tree, &["a", "b"]);
        let log = Rc::new(RefCell::new(Vec::new()));
        tree.connect(Recorder(log.clone()));

        tree.raise(kids[1], kids[0]).unwrap();
        tree.raise_top(kids[1]).unwrap();
        tree.lower_bottom(kids[0]).unwrap();
        assert!(log.borrow().is_empty());

        tree.raise_top(kids[0]).unwrap();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn reorder_requires_shared_parent() {
        let mut tree = ActorTree::new();
        let (_, kids) = parent_with(&mut tree, &["a"]);
        let (_, others) = parent_with(&mut tree, &["b"]);
        let loose = tree.create_actor();

        assert_eq!(
            tree.raise(kids[0], others[0]),
            Err(TreeError::NotSiblings {
                actor: kids[0],
                sibling: others[0]
            })
        );
        assert_eq!(
            tree.lower(kids[0], kids[0]),
            Err(TreeError::SelfSibling { actor: kids[0] })
        );
        assert_eq!(
            tree.raise_top(loose),
            Err(TreeError::NoParent { actor: loose })
        );
        assert_eq!(
            tree.lower(loose, kids[0]),
            Err(TreeError::NoParent { actor: loose })
        );
    }

    #[test]
    fn set_child_at_index_moves_existing_child() {
        let mut tree = ActorTree::new();
        let (parent, kids) = parent_with(&mut tree, &["a", "b", "c"]);
        tree.set_child_at_index(parent, kids[0], 2).unwrap();
        assert_eq!(names(&tree, parent), ["b", "c", "a"]);
        tree.set_child_at_index(parent, kids[0], 0).unwrap();
        assert_eq!(names(&tree, parent), ["a", "b", "c"]);
        tree.set_child_at_index(parent, kids[1], -1).unwrap();
        assert_eq!(names(&tree, parent), ["a", "c", "b"]);
        assert_links(&tree, parent);
    }

    #[test]
    fn self_parenting_is_rejected() {
        let mut tree = ActorTree::new();
        let a = tree.create_actor();
        assert_eq!(
            tree.add_child(a, a),
            Err(TreeError::SelfParenting { actor: a })
        );
        assert_eq!(tree.n_children(a), 0);
    }

    #[test]
    fn adding_parented_child_is_rejected() {
        let mut tree = ActorTree::new();
        let (first, kids) = parent_with(&mut tree, &["kid"]);
        let second = tree.create_actor();
        assert_eq!(
            tree.add_child(second, kids[0]),
            Err(TreeError::AlreadyParented {
                child: kids[0],
                parent: first
            })
        );
        assert_eq!(tree.parent(kids[0]), Some(first));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut tree = ActorTree::new();
        let root = tree.create_actor();
        let mid = tree.create_actor();
        let leaf = tree.create_actor();
        tree.add_child(root, mid).unwrap();
        tree.add_child(mid, leaf).unwrap();

        assert_eq!(
            tree.add_child(leaf, root),
            Err(TreeError::Cycle {
                parent: leaf,
                child: root
            })
        );
        assert!(tree.contains(root, leaf));
        assert!(!tree.contains(leaf, root));
    }

    #[test]
    fn every_insertion_path_rejects_cycles_and_self_parenting() {
        let mut tree = ActorTree::new();
        let root = tree.create_actor();
        let mid = tree.create_actor();
        let leaf = tree.create_actor();
        tree.add_child(root, mid).unwrap();
        tree.add_child(mid, leaf).unwrap();
        let loose = tree.create_actor();
        let log = Rc::new(RefCell::new(Vec::new()));
        tree.connect(Recorder(log.clone()));

        assert_eq!(
            tree.replace_child(mid, leaf, root),
            Err(TreeError::Cycle {
                parent: mid,
                child: root
            })
        );
        assert_eq!(
            tree.insert_child_at_index(loose, loose, 0),
            Err(TreeError::SelfParenting { actor: loose })
        );
        assert_eq!(
            tree.insert_child_above(leaf, root, None),
            Err(TreeError::Cycle {
                parent: leaf,
                child: root
            })
        );

        assert!(log.borrow().is_empty());
        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.parent(leaf), Some(mid));
        assert_eq!(tree.children(mid).collect::<Vec<_>>(), [leaf]);
        assert_eq!(tree.n_children(loose), 0);
        assert_links(&tree, mid);
    }

    #[test]
    fn queries_return_none_out_of_range() {
        let mut tree = ActorTree::new();
        let (parent, kids) = parent_with(&mut tree, &["a", "b", "c"]);
        assert_eq!(tree.child_at_index(parent, 3), None);
        assert_eq!(tree.child_at_index(kids[0], 0), None);
        assert_eq!(tree.child_index(parent, kids[2]), Some(2));
        assert_eq!(tree.child_index(kids[0], kids[2]), None);
    }

    #[test]
    fn child_at_index_walks_from_both_ends() {
        let mut tree = ActorTree::new();
        let labels = ["0", "1", "2", "3", "4", "5", "6"];
        let (parent, kids) = parent_with(&mut tree, &labels);
        for (i, kid) in kids.iter().enumerate() {
            assert_eq!(tree.child_at_index(parent, i), Some(*kid));
        }
    }

    #[test]
    fn find_child_by_name_returns_first_match() {
        let mut tree = ActorTree::new();
        let (parent, kids) = parent_with(&mut tree, &["dup", "other", "dup"]);
        assert_eq!(tree.find_child_by_name(parent, "dup"), Some(kids[0]));
        assert_eq!(tree.find_child_by_name(parent, "missing"), None);
    }

    #[test]
    fn add_child_notifies_observer() {
        let mut tree = ActorTree::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = tree.connect(Recorder(log.clone()));
        let parent = tree.create_actor();
        let child = tree.create_actor();
        tree.add_child(parent, child).unwrap();
        assert_eq!(*log.borrow(), vec![TreeEvent::ChildAdded { parent, child }]);

        assert!(tree.disconnect(id));
        assert!(!tree.disconnect(id));
        let other = tree.create_actor();
        tree.add_child(parent, other).unwrap();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn failed_operation_emits_nothing() {
        let mut tree = ActorTree::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        tree.connect(Recorder(log.clone()));
        let a = tree.create_actor();
        let _ = tree.add_child(a, a);
        assert!(log.borrow().is_empty());
    }
}
