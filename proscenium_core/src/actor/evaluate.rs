// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change collection for the paint system.
//!
//! [`ActorTree::take_changes`] follows a drain-recompute pattern for each
//! dirty channel:
//!
//! 1. **OPACITY**: drain dirty indices with their descendants and recompute
//!    each actor's `effective_opacity` as `parent_effective * opacity / 255`.
//! 2. **VISIBILITY**: drain dirty indices with their descendants and
//!    recompute `effective_visible` as `parent_effective && visible`,
//!    recording actors that flipped.
//! 3. **GEOMETRY** / **TRANSFORM**: drain dirty indices (no recomputation;
//!    painters read the current values directly from the tree).
//! 4. **TOPOLOGY**: drain and discard (the paint order was already rebuilt
//!    at the start if needed).
//!
//! [`SceneChanges`] uses raw slot indices (`u32`) rather than [`ActorId`]
//! handles. Use [`ActorTree::actor_at`] to turn one back into a handle.
//!
//! [`ActorId`]: super::ActorId

use alloc::vec::Vec;

use super::id::INVALID;
use super::store::ActorTree;
use crate::dirty;

/// The set of changes produced by a single [`ActorTree::take_changes`] call.
///
/// Each list holds the raw slot indices of actors that changed in the
/// corresponding category, parents before children.
#[derive(Clone, Debug, Default)]
pub struct SceneChanges {
    /// Actors whose position, size, or depth changed.
    pub geometry: Vec<u32>,
    /// Actors whose rotation or scale changed.
    pub transforms: Vec<u32>,
    /// Actors whose effective opacity was recomputed.
    pub opacities: Vec<u32>,
    /// Actors whose effective visibility was recomputed.
    pub visibility: Vec<u32>,
    /// Actors that went from effectively visible to hidden.
    pub hidden: Vec<u32>,
    /// Actors that went from effectively hidden to visible.
    pub shown: Vec<u32>,
    /// Actors created since the last call.
    pub added: Vec<u32>,
    /// Actors destroyed since the last call.
    pub removed: Vec<u32>,
    /// Whether the tree structure changed (paint order was rebuilt).
    pub topology_changed: bool,
}

impl SceneChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.geometry.clear();
        self.transforms.clear();
        self.opacities.clear();
        self.visibility.clear();
        self.hidden.clear();
        self.shown.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
            && self.transforms.is_empty()
            && self.opacities.is_empty()
            && self.visibility.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl ActorTree {
    /// Collects everything that changed since the last call, recomputing
    /// inherited opacity and visibility on the way.
    pub fn take_changes(&mut self) -> SceneChanges {
        let mut changes = SceneChanges::default();
        self.take_changes_into(&mut changes);
        changes
    }

    /// Like [`take_changes`](Self::take_changes), but reuses a
    /// caller-provided buffer to avoid allocation.
    pub fn take_changes_into(&mut self, changes: &mut SceneChanges) {
        changes.clear();

        if self.paint_order_dirty {
            self.rebuild_paint_order();
            changes.topology_changed = true;
            self.paint_order_dirty = false;
        }

        let dirty_opacities: Vec<u32> = self
            .dirty
            .drain(dirty::OPACITY)
            .affected()
            .deterministic()
            .run()
            .filter(|&idx| self.live[idx as usize])
            .collect();
        for &idx in &dirty_opacities {
            let parent = self.parent[idx as usize];
            let inherited = if parent != INVALID {
                self.effective_opacity[parent as usize]
            } else {
                u8::MAX
            };
            let composed = u16::from(inherited) * u16::from(self.opacity[idx as usize]) / 255;
            self.effective_opacity[idx as usize] = u8::try_from(composed).unwrap_or(u8::MAX);
        }
        changes.opacities = dirty_opacities;

        let dirty_visibility: Vec<u32> = self
            .dirty
            .drain(dirty::VISIBILITY)
            .affected()
            .deterministic()
            .run()
            .filter(|&idx| self.live[idx as usize])
            .collect();
        for &idx in &dirty_visibility {
            let parent = self.parent[idx as usize];
            let inherited = parent == INVALID || self.effective_visible[parent as usize];
            let now = inherited && self.visible[idx as usize];
            let before = self.effective_visible[idx as usize];
            if now != before {
                if now {
                    changes.shown.push(idx);
                } else {
                    changes.hidden.push(idx);
                }
                self.effective_visible[idx as usize] = now;
            }
        }
        changes.visibility = dirty_visibility;

        changes.geometry = self
            .dirty
            .drain(dirty::GEOMETRY)
            .deterministic()
            .run()
            .filter(|&idx| self.live[idx as usize])
            .collect();

        changes.transforms = self
            .dirty
            .drain(dirty::TRANSFORM)
            .deterministic()
            .run()
            .filter(|&idx| self.live[idx as usize])
            .collect();

        let _: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    /// Returns every live actor in paint order: roots in slot order, each
    /// followed by its subtree depth-first, children first to last.
    ///
    /// Only valid after [`take_changes`](Self::take_changes) has been called.
    #[must_use]
    pub fn paint_order(&self) -> &[u32] {
        &self.paint_order
    }

    fn rebuild_paint_order(&mut self) {
        self.paint_order.clear();
        let mut stack = Vec::new();
        for root in 0..self.len {
            if !self.live[root as usize] || self.parent[root as usize] != INVALID {
                continue;
            }
            stack.push(root);
            while let Some(idx) = stack.pop() {
                self.paint_order.push(idx);
                // Push last to first so the first child is visited next.
                let mut child = self.last_child[idx as usize];
                while child != INVALID {
                    stack.push(child);
                    child = self.prev_sibling[child as usize];
                }
            }
        }
    }
}
