//! Native enumeration cursor.
//!
//! libsensors enumerates through an opaque `int` counter the caller passes
//! by reference. [`Cursor`] wraps that counter in an explicit state machine:
//!
//! ```text
//! Ready ──step: Some──▶ Yielding(n) ──step: Some──▶ Yielding(n')
//!   │                        │
//!   └──────step: None────────┴──────▶ Done (absorbing)
//! ```

use std::ffi::c_int;

/// State of a native enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    /// Nothing produced yet.
    #[default]
    Ready,
    /// At least one element produced; holds the native counter.
    Yielding(c_int),
    /// The native call returned null.
    Done,
}

impl Cursor {
    /// Advance with `next`, which receives the native counter.
    ///
    /// Once `next` returns `None` the cursor is `Done` and `next` is never
    /// called again.
    pub fn step<T, F>(&mut self, next: F) -> Option<T>
    where
        F: FnOnce(&mut c_int) -> Option<T>,
    {
        let mut nr = match *self {
            Self::Ready => 0,
            Self::Yielding(nr) => nr,
            Self::Done => return None,
        };
        let item = next(&mut nr);
        *self = if item.is_some() {
            Self::Yielding(nr)
        } else {
            Self::Done
        };
        item
    }

    /// Whether the enumeration has finished.
    #[must_use]
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}
