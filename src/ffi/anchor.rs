//! Borrowed native pointers anchored to their owner.
//!
//! A chip descriptor is memory owned by the native configuration, a feature
//! descriptor is scoped to its chip, and so on. [`Anchored`] stores such a
//! pointer together with a strong reference to the object it was borrowed
//! from, so the pointee stays valid for as long as the anchor exists.
//!
//! # Safety
//!
//! The only constructor, [`Anchored::try_project`], derives the reference
//! from a shared borrow of the owner under a higher-ranked lifetime. The
//! reference therefore cannot outlive the owner's allocation, and the owner
//! is only ever reachable through `Rc` (shared, never mutated in place).

use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

/// A pointer borrowed from `O`, kept valid by a strong reference to `O`.
pub struct Anchored<T, O> {
    ptr: NonNull<T>,
    owner: Rc<O>,
}

impl<T, O> Anchored<T, O> {
    /// Borrow a `T` out of `owner` and anchor it.
    ///
    /// Returns `None` if `project` does.
    pub fn try_project<F>(owner: Rc<O>, project: F) -> Option<Self>
    where
        F: for<'a> FnOnce(&'a O) -> Option<&'a T>,
    {
        let ptr = NonNull::from(project(&*owner)?);
        Some(Self { ptr, owner })
    }

    /// The borrowed value.
    pub fn get(&self) -> &T {
        // SAFETY: `ptr` was produced from a `&'a T` derived from `&'a O`
        // (see `try_project`), and `self.owner` keeps that `O` alive and
        // unmoved inside its `Rc` allocation for as long as `self` exists.
        unsafe { self.ptr.as_ref() }
    }

    /// The owner the value was borrowed from.
    pub fn owner(&self) -> &Rc<O> {
        &self.owner
    }

    /// Address of the borrowed value, used as identity key.
    pub fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }
}

impl<T, O> fmt::Debug for Anchored<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Anchored({:#x})", self.addr())
    }
}
