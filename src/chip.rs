//! Chip wrappers.
//!
//! A [`Chip`] is a cheap, clonable handle on a detected chip. Two handles
//! compare equal exactly when they wrap the same native chip descriptor of
//! the same configuration; enumerating twice while a handle is alive yields
//! that very handle again.

use crate::backend::{Backend, BusId, BusType};
use crate::cache::IdentityCache;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::feature::{Feature, FeatureNode, Features};
use crate::ffi::anchor::Anchored;
use crate::sensors::Context;
use std::borrow::Cow;
use std::ffi::c_int;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::ops::ControlFlow;
use std::rc::Rc;
use tracing::{instrument, trace, warn};

/// Shared state behind a [`Chip`].
pub(crate) struct ChipNode<B: Backend> {
    native: Anchored<B::Chip, Context<B>>,
    features: IdentityCache<FeatureNode<B>>,
}

impl<B: Backend> ChipNode<B> {
    pub(crate) fn native(&self) -> &B::Chip {
        self.native.get()
    }

    pub(crate) fn config(&self) -> &B::Config {
        self.native.owner().config()
    }

    pub(crate) const fn features(&self) -> &IdentityCache<FeatureNode<B>> {
        &self.features
    }
}

/// A detected chip.
pub struct Chip<B: Backend>(Rc<ChipNode<B>>);

impl<B: Backend> Chip<B> {
    /// Return the wrapper for `native`, creating it on a cache miss.
    fn resolve(native: Anchored<B::Chip, Context<B>>) -> Self {
        let key = native.addr();
        let context = Rc::clone(native.owner());
        let node = context.chips().get_or_insert_with(key, move || ChipNode {
            native,
            features: IdentityCache::new(),
        });
        Self(node)
    }

    pub(crate) const fn from_node(node: Rc<ChipNode<B>>) -> Self {
        Self(node)
    }

    /// Canonical chip name, such as `coretemp-isa-0000`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if the native formatter fails, for example
    /// because the chip name contains wildcards.
    #[instrument(level = "trace", skip(self))]
    pub fn name(&self) -> Result<String> {
        let native = self.0.native();
        let len = B::snprintf_chip_name(&mut [], native);
        let len = usize::try_from(len).map_err(|_| {
            warn!(code = len, "chip name cannot be formatted");
            Error::format(len, B::strerror(len))
        })?;

        let mut buf = vec![0_u8; len + 1];
        let written = B::snprintf_chip_name(&mut buf, native);
        if written < 0 {
            return Err(Error::format(written, B::strerror(written)));
        }
        buf.truncate(len);
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Device path of the chip in sysfs, empty if the library has none.
    #[must_use]
    pub fn path(&self) -> Cow<'_, str> {
        B::chip_id(self.0.native())
            .path
            .map_or(Cow::Borrowed(""), |path| path.to_string_lossy())
    }

    /// Name of the adapter the chip sits on, if the library knows one.
    #[must_use]
    pub fn adapter(&self) -> Option<Cow<'_, str>> {
        let bus = self.bus();
        B::adapter_name(self.0.config(), bus).map(|name| name.to_string_lossy())
    }

    /// Driver prefix, `None` for a wildcard.
    #[must_use]
    pub fn prefix(&self) -> Option<Cow<'_, str>> {
        B::chip_id(self.0.native())
            .prefix
            .map(|prefix| prefix.to_string_lossy())
    }

    /// Bus identifier.
    #[must_use]
    pub fn bus(&self) -> BusId {
        B::chip_id(self.0.native()).bus
    }

    /// Bus type, `None` if the library reports an unknown one.
    #[must_use]
    pub fn bus_type(&self) -> Option<BusType> {
        self.bus().bus_type()
    }

    /// Address on the bus.
    #[must_use]
    pub fn address(&self) -> c_int {
        B::chip_id(self.0.native()).addr
    }

    /// Iterate over the features of this chip.
    #[must_use]
    pub fn features(&self) -> Features<B> {
        Features::new(Rc::clone(&self.0))
    }

    /// Call `action` on each feature until it breaks.
    pub fn for_each_feature<F>(&self, mut action: F) -> ControlFlow<()>
    where
        F: FnMut(&Feature<B>) -> ControlFlow<()>,
    {
        self.features().try_for_each(|feature| action(&feature))
    }

    /// Number of feature wrappers of this chip currently alive.
    #[must_use]
    pub fn live_features(&self) -> usize {
        self.0.features().live_len()
    }

    fn addr(&self) -> usize {
        self.0.native.addr()
    }
}

impl<B: Backend> Clone for Chip<B> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<B: Backend> PartialEq for Chip<B> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<B: Backend> Eq for Chip<B> {}

impl<B: Backend> Hash for Chip<B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

impl<B: Backend> fmt::Debug for Chip<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chip")
            .field("native", &format_args!("{:#x}", self.addr()))
            .field("path", &self.path())
            .finish()
    }
}

impl<'a, B: Backend> IntoIterator for &'a Chip<B> {
    type Item = Feature<B>;
    type IntoIter = Features<B>;

    fn into_iter(self) -> Features<B> {
        self.features()
    }
}

/// Iterator over detected chips, see [`Sensors::chips`](crate::Sensors::chips).
pub struct Chips<B: Backend> {
    context: Option<Rc<Context<B>>>,
    cursor: Cursor,
}

impl<B: Backend> Chips<B> {
    pub(crate) const fn new(context: Option<Rc<Context<B>>>) -> Self {
        Self {
            context,
            cursor: Cursor::Ready,
        }
    }
}

impl<B: Backend> Iterator for Chips<B> {
    type Item = Chip<B>;

    fn next(&mut self) -> Option<Chip<B>> {
        let context = self.context.as_ref()?;
        let native = self.cursor.step(|nr| {
            Anchored::try_project(Rc::clone(context), |ctx| B::detected_chip(ctx.config(), nr))
        });
        let Some(native) = native else {
            trace!("chip enumeration finished");
            self.context = None;
            return None;
        };
        Some(Chip::resolve(native))
    }
}

impl<B: Backend> FusedIterator for Chips<B> {}

impl<B: Backend> fmt::Debug for Chips<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chips").field("cursor", &self.cursor).finish()
    }
}
