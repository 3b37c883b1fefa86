// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{ActorId, INVALID};
use super::store::ActorTree;

/// An iterator over the direct children of an actor, first to last.
///
/// Created by [`ActorTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a ActorTree,
    current: u32,
    remaining: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a ActorTree, first: u32, count: u32) -> Self {
        Self {
            tree,
            current: first,
            remaining: count,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = ActorId;

    fn next(&mut self) -> Option<ActorId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        self.remaining -= 1;
        Some(self.tree.handle(idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining as usize, Some(self.remaining as usize))
    }
}

impl ExactSizeIterator for Children<'_> {}
