// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational slot storage for alphas, behaviours, and timelines.
//!
//! Actors use dedicated struct-of-arrays storage; the other entities are few
//! and heterogeneous, so they live in a plain array of slots. A slot's
//! generation is bumped when its value is removed, which invalidates every
//! outstanding [`Key`] for it.

use alloc::vec::Vec;

/// Slot index plus generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Key {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

#[derive(Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }
}

impl<T> Arena<T> {
    pub(crate) fn insert(&mut self, value: T) -> Key {
        if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.value = Some(value);
            return Key {
                idx,
                generation: slot.generation,
            };
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "slot count is bounded well below u32::MAX"
        )]
        let idx = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        Key { idx, generation: 0 }
    }

    pub(crate) fn get(&self, key: Key) -> Option<&T> {
        let slot = self.slots.get(key.idx as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub(crate) fn get_mut(&mut self, key: Key) -> Option<&mut T> {
        let slot = self.slots.get_mut(key.idx as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.value.as_mut()
    }

    pub(crate) fn contains(&self, key: Key) -> bool {
        self.get(key).is_some()
    }

    pub(crate) fn remove(&mut self, key: Key) -> Option<T> {
        let slot = self.slots.get_mut(key.idx as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation += 1;
        self.free_list.push(key.idx);
        Some(value)
    }

    /// Iterates over live entries in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (Key, &T)> {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "slot count is bounded well below u32::MAX"
            )]
            let idx = idx as u32;
            let key = Key {
                idx,
                generation: slot.generation,
            };
            slot.value.as_ref().map(|value| (key, value))
        })
    }

    /// Iterates mutably over live entries in slot order.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (Key, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(idx, slot)| {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "slot count is bounded well below u32::MAX"
            )]
            let idx = idx as u32;
            let key = Key {
                idx,
                generation: slot.generation,
            };
            slot.value.as_mut().map(|value| (key, value))
        })
    }
}
