//! Subfeature wrappers.
//!
//! A subfeature is a single readable or writable value of a feature, such as
//! `temp1_input` or `temp1_crit`. Subfeature wrappers keep their feature
//! (and through it the chip and configuration) alive.

use crate::backend::Backend;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::feature::{Feature, FeatureNode};
use crate::ffi::anchor::Anchored;
use crate::quantity::{Quantity, SubfeatureFlags, SubfeatureType};
use std::borrow::Cow;
use std::ffi::c_int;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::rc::Rc;
use tracing::{debug, trace};

pub(crate) struct SubfeatureNode<B: Backend> {
    native: Anchored<B::Subfeature, FeatureNode<B>>,
}

/// A subfeature of a feature.
pub struct Subfeature<B: Backend>(Rc<SubfeatureNode<B>>);

impl<B: Backend> Subfeature<B> {
    fn resolve(native: Anchored<B::Subfeature, FeatureNode<B>>) -> Self {
        let key = native.addr();
        let feature = Rc::clone(native.owner());
        let node = feature
            .subfeatures()
            .get_or_insert_with(key, move || SubfeatureNode { native });
        Self(node)
    }

    fn native(&self) -> &B::Subfeature {
        self.0.native.get()
    }

    fn feature_node(&self) -> &Rc<FeatureNode<B>> {
        self.0.native.owner()
    }

    /// Subfeature name, such as `temp1_input`.
    #[must_use]
    pub fn name(&self) -> Cow<'_, str> {
        B::subfeature_info(self.native()).name.to_string_lossy()
    }

    /// Subfeature number, unique within the chip.
    #[must_use]
    pub fn number(&self) -> c_int {
        B::subfeature_info(self.native()).number
    }

    /// Subfeature type.
    #[must_use]
    pub fn kind(&self) -> SubfeatureType {
        B::subfeature_info(self.native()).kind
    }

    /// Number of the feature this subfeature maps to.
    #[must_use]
    pub fn mapping(&self) -> c_int {
        B::subfeature_info(self.native()).mapping
    }

    /// Access flags.
    #[must_use]
    pub fn flags(&self) -> SubfeatureFlags {
        B::subfeature_info(self.native()).flags
    }

    /// Whether the value can be read.
    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.flags().contains(SubfeatureFlags::READABLE)
    }

    /// Whether the value can be written.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.flags().contains(SubfeatureFlags::WRITABLE)
    }

    /// Physical quantity measured, derived from the subfeature type.
    #[must_use]
    pub fn quantity(&self) -> Quantity {
        self.kind().quantity()
    }

    /// Name of the measured quantity as the native library spells it.
    #[must_use]
    pub fn quantity_name(&self) -> Cow<'static, str> {
        B::quantity_name(self.kind())
    }

    /// Unit symbol of the value as the native library spells it, empty for
    /// dimensionless values.
    #[must_use]
    pub fn unit(&self) -> Cow<'static, str> {
        B::quantity_unit(self.kind())
    }

    /// Read the current value, with `compute` statements applied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] if the native library cannot read the value.
    pub fn value(&self) -> Result<f64> {
        let feature = self.feature_node();
        let number = self.number();
        B::value(feature.config(), feature.chip().native(), number).map_err(|code| {
            let message = B::strerror(code);
            debug!(subfeature = %self.name(), code, %message, "value read failed");
            Error::read(self.name(), code, message)
        })
    }

    /// The feature this subfeature belongs to.
    #[must_use]
    pub fn feature(&self) -> Feature<B> {
        Feature::from_node(Rc::clone(self.feature_node()))
    }
}

impl<B: Backend> Clone for Subfeature<B> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<B: Backend> PartialEq for Subfeature<B> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<B: Backend> Eq for Subfeature<B> {}

impl<B: Backend> Hash for Subfeature<B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

impl<B: Backend> fmt::Debug for Subfeature<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subfeature")
            .field("name", &self.name())
            .field("number", &self.number())
            .field("kind", &format_args!("{}", self.kind()))
            .field("flags", &self.flags())
            .finish()
    }
}

/// Iterator over the subfeatures of a feature, see [`Feature::subfeatures`].
pub struct Subfeatures<B: Backend> {
    feature: Option<Rc<FeatureNode<B>>>,
    cursor: Cursor,
}

impl<B: Backend> Subfeatures<B> {
    pub(crate) const fn new(feature: Rc<FeatureNode<B>>) -> Self {
        Self {
            feature: Some(feature),
            cursor: Cursor::Ready,
        }
    }
}

impl<B: Backend> Iterator for Subfeatures<B> {
    type Item = Subfeature<B>;

    fn next(&mut self) -> Option<Subfeature<B>> {
        let feature = self.feature.as_ref()?;
        let native = self.cursor.step(|nr| {
            Anchored::try_project(Rc::clone(feature), |feature| {
                B::subfeature(feature.config(), feature.chip().native(), feature.native(), nr)
            })
        });
        let Some(native) = native else {
            trace!("subfeature enumeration finished");
            self.feature = None;
            return None;
        };
        Some(Subfeature::resolve(native))
    }
}

impl<B: Backend> FusedIterator for Subfeatures<B> {}

impl<B: Backend> fmt::Debug for Subfeatures<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subfeatures")
            .field("cursor", &self.cursor)
            .finish()
    }
}
