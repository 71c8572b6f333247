//! Identity cache: one live wrapper per native pointer.
//!
//! Each parent (configuration, chip, feature) owns an [`IdentityCache`]
//! mapping the address of a borrowed native descriptor to a weak handle on
//! the wrapper created for it. Looking an address up again yields the very
//! same wrapper as long as somebody still holds it; once every strong
//! reference is gone the entry is dead and behaves as a miss.
//!
//! The cache never keeps a wrapper alive, and it lives inside its parent, so
//! it disappears together with the parent without any explicit cleanup.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::trace;

/// Address-keyed map of weak wrapper handles.
pub struct IdentityCache<T> {
    entries: RefCell<Option<HashMap<usize, Weak<T>>>>,
}

impl<T> IdentityCache<T> {
    /// Create an empty cache. No map is allocated until first use.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: RefCell::new(None),
        }
    }

    /// Look up the live wrapper for `key`.
    ///
    /// Returns `None` if there is no entry or the wrapper has been dropped.
    pub fn get(&self, key: usize) -> Option<Rc<T>> {
        let mut entries = self.entries.borrow_mut();
        let map = entries.get_or_insert_with(HashMap::new);
        let live = map.get(&key).and_then(Weak::upgrade);
        trace!(key = format_args!("{key:#x}"), hit = live.is_some(), "cache lookup");
        live
    }

    /// Remember `wrapper` as the object for `key`, replacing any prior entry.
    pub fn set(&self, key: usize, wrapper: &Rc<T>) {
        let mut entries = self.entries.borrow_mut();
        let map = entries.get_or_insert_with(HashMap::new);
        if let Some(stale) = map.insert(key, Rc::downgrade(wrapper)) {
            trace!(
                key = format_args!("{key:#x}"),
                stale = stale.strong_count() == 0,
                "cache entry replaced"
            );
        }
    }

    /// Return the live wrapper for `key`, or create one with `make` and
    /// remember it.
    pub fn get_or_insert_with<F>(&self, key: usize, make: F) -> Rc<T>
    where
        F: FnOnce() -> T,
    {
        if let Some(live) = self.get(key) {
            return live;
        }
        let created = Rc::new(make());
        self.set(key, &created);
        created
    }

    /// Number of entries whose wrapper is still alive.
    pub fn live_len(&self) -> usize {
        self.entries
            .borrow()
            .as_ref()
            .map_or(0, |map| map.values().filter(|w| w.strong_count() > 0).count())
    }

    #[cfg(test)]
    fn is_allocated(&self) -> bool {
        self.entries.borrow().is_some()
    }
}

impl<T> Default for IdentityCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for IdentityCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityCache")
            .field("live", &self.live_len())
            .finish()
    }
}
