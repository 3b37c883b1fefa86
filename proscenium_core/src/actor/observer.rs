// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural-change notification.
//!
//! A [`TreeObserver`] is told about structural mutations after they are
//! committed. Mutations queue their events while the tree is being edited and
//! the tree delivers the queue, in registration order, once the operation has
//! finished. Observers only see handles, never the tree itself, so they
//! cannot witness or cause a half-applied mutation.
//!
//! Handles in events may already be stale by the time they are delivered
//! (for example the parent in a `child_removed` emitted while that parent is
//! being destroyed).

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use super::id::ActorId;

/// Receives structural-change notifications from an
/// [`ActorTree`](super::ActorTree).
///
/// All methods default to no-ops, so implementing only the events you care
/// about is fine.
pub trait TreeObserver {
    /// `child` was attached to `parent`.
    fn child_added(&mut self, parent: ActorId, child: ActorId) {
        _ = (parent, child);
    }

    /// `child` was detached from `parent`.
    fn child_removed(&mut self, parent: ActorId, child: ActorId) {
        _ = (parent, child);
    }

    /// The sibling order under `parent` changed without adding or removing
    /// children.
    fn children_reordered(&mut self, parent: ActorId) {
        _ = parent;
    }

    /// `actor` was destroyed and its handle is now stale.
    fn actor_destroyed(&mut self, actor: ActorId) {
        _ = actor;
    }
}

/// Handle returned by [`ActorTree::connect`](super::ActorTree::connect).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TreeEvent {
    ChildAdded { parent: ActorId, child: ActorId },
    ChildRemoved { parent: ActorId, child: ActorId },
    ChildrenReordered { parent: ActorId },
    ActorDestroyed { actor: ActorId },
}

/// Registered observers plus the events waiting to be delivered to them.
#[derive(Default)]
pub(crate) struct Observers {
    entries: Vec<(ObserverId, Box<dyn TreeObserver>)>,
    next_id: u64,
    pending: Vec<TreeEvent>,
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.entries.len())
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl Observers {
    pub(crate) fn connect(&mut self, observer: Box<dyn TreeObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    pub(crate) fn disconnect(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn queue(&mut self, event: TreeEvent) {
        self.pending.push(event);
    }

    /// Delivers every queued event to every observer.
    pub(crate) fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let events = core::mem::take(&mut self.pending);
        for event in &events {
            for (_, observer) in &mut self.entries {
                match *event {
                    TreeEvent::ChildAdded { parent, child } => observer.child_added(parent, child),
                    TreeEvent::ChildRemoved { parent, child } => {
                        observer.child_removed(parent, child);
                    }
                    TreeEvent::ChildrenReordered { parent } => observer.children_reordered(parent),
                    TreeEvent::ActorDestroyed { actor } => observer.actor_destroyed(actor),
                }
            }
        }
        // Hand the allocation back for the next mutation.
        let mut events = events;
        events.clear();
        self.pending = events;
    }
}
