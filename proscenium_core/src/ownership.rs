// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Strong-count bookkeeping for arena entities.
//!
//! Actors and alpha sources are created holding a single *floating*
//! reference. The first owner to take the entity (a parent for actors, a
//! behaviour for alphas) sinks that reference instead of adding a new one,
//! so a freshly created entity handed straight to an owner is released
//! together with it. Plain retains never sink.

/// Strong count plus floating flag for one arena slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Ownership {
    count: u32,
    floating: bool,
}

impl Ownership {
    /// A fresh entity owned only by its floating reference.
    pub(crate) const fn floating() -> Self {
        Self {
            count: 1,
            floating: true,
        }
    }

    /// Takes ownership: converts the floating reference, or adds a count.
    pub(crate) fn sink(&mut self) {
        if self.floating {
            self.floating = false;
        } else {
            self.count += 1;
        }
    }

    /// Adds a strong count without touching the floating reference.
    pub(crate) fn retain(&mut self) {
        self.count += 1;
    }

    /// Drops one strong count. Returns `true` when none remain.
    ///
    /// # Panics
    ///
    /// Panics if the count is already zero.
    #[must_use]
    pub(crate) fn release(&mut self) -> bool {
        assert!(self.count > 0, "released an entity with no references");
        self.count -= 1;
        self.count == 0
    }

    pub(crate) const fn is_floating(self) -> bool {
        self.floating
    }

    pub(crate) const fn count(self) -> u32 {
        self.count
    }
}
