//! Feature wrappers.
//!
//! A feature is one measured quantity of a chip (`temp1`, `fan2`, `in0`).
//! Feature wrappers keep their chip alive and are cached per chip, so the
//! same feature enumerated twice is the same [`Feature`].

use crate::backend::Backend;
use crate::cache::IdentityCache;
use crate::chip::{Chip, ChipNode};
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::ffi::anchor::Anchored;
use crate::quantity::FeatureType;
use crate::subfeature::{Subfeature, SubfeatureNode, Subfeatures};
use std::borrow::Cow;
use std::ffi::c_int;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::ops::ControlFlow;
use std::rc::Rc;
use tracing::{debug, trace};

pub(crate) struct FeatureNode<B: Backend> {
    native: Anchored<B::Feature, ChipNode<B>>,
    subfeatures: IdentityCache<SubfeatureNode<B>>,
}

impl<B: Backend> FeatureNode<B> {
    pub(crate) fn native(&self) -> &B::Feature {
        self.native.get()
    }

    pub(crate) fn chip(&self) -> &Rc<ChipNode<B>> {
        self.native.owner()
    }

    pub(crate) fn config(&self) -> &B::Config {
        self.chip().config()
    }

    pub(crate) const fn subfeatures(&self) -> &IdentityCache<SubfeatureNode<B>> {
        &self.subfeatures
    }
}

/// A feature of a chip.
pub struct Feature<B: Backend>(Rc<FeatureNode<B>>);

impl<B: Backend> Feature<B> {
    fn resolve(native: Anchored<B::Feature, ChipNode<B>>) -> Self {
        let key = native.addr();
        let chip = Rc::clone(native.owner());
        let node = chip.features().get_or_insert_with(key, move || FeatureNode {
            native,
            subfeatures: IdentityCache::new(),
        });
        Self(node)
    }

    pub(crate) const fn from_node(node: Rc<FeatureNode<B>>) -> Self {
        Self(node)
    }

    /// Feature name, such as `temp1`.
    #[must_use]
    pub fn name(&self) -> Cow<'_, str> {
        B::feature_info(self.0.native()).name.to_string_lossy()
    }

    /// Human-readable label, honoring `label` statements of the
    /// configuration. Falls back to the feature name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Label`] if the native library returns no label.
    pub fn label(&self) -> Result<String> {
        let node = &self.0;
        B::label(node.config(), node.chip().native(), node.native()).ok_or_else(|| {
            debug!(feature = %self.name(), "no label returned");
            Error::label(self.name())
        })
    }

    /// Feature number, unique within the chip.
    #[must_use]
    pub fn number(&self) -> c_int {
        B::feature_info(self.0.native()).number
    }

    /// Feature type.
    #[must_use]
    pub fn kind(&self) -> FeatureType {
        B::feature_info(self.0.native()).kind
    }

    /// The chip this feature belongs to.
    #[must_use]
    pub fn chip(&self) -> Chip<B> {
        Chip::from_node(Rc::clone(self.0.chip()))
    }

    /// Iterate over the subfeatures of this feature.
    #[must_use]
    pub fn subfeatures(&self) -> Subfeatures<B> {
        Subfeatures::new(Rc::clone(&self.0))
    }

    /// Call `action` on each subfeature until it breaks.
    pub fn for_each_subfeature<F>(&self, mut action: F) -> ControlFlow<()>
    where
        F: FnMut(&Subfeature<B>) -> ControlFlow<()>,
    {
        self.subfeatures().try_for_each(|sub| action(&sub))
    }

    /// Number of subfeature wrappers of this feature currently alive.
    #[must_use]
    pub fn live_subfeatures(&self) -> usize {
        self.0.subfeatures().live_len()
    }
}

impl<B: Backend> Clone for Feature<B> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<B: Backend> PartialEq for Feature<B> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<B: Backend> Eq for Feature<B> {}

impl<B: Backend> Hash for Feature<B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.0).hash(state);
    }
}

impl<B: Backend> fmt::Debug for Feature<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature")
            .field("name", &self.name())
            .field("number", &self.number())
            .field("kind", &self.kind())
            .finish()
    }
}

impl<'a, B: Backend> IntoIterator for &'a Feature<B> {
    type Item = Subfeature<B>;
    type IntoIter = Subfeatures<B>;

    fn into_iter(self) -> Subfeatures<B> {
        self.subfeatures()
    }
}

/// Iterator over the features of a chip, see [`Chip::features`].
pub struct Features<B: Backend> {
    chip: Option<Rc<ChipNode<B>>>,
    cursor: Cursor,
}

impl<B: Backend> Features<B> {
    pub(crate) const fn new(chip: Rc<ChipNode<B>>) -> Self {
        Self {
            chip: Some(chip),
            cursor: Cursor::Ready,
        }
    }
}

impl<B: Backend> Iterator for Features<B> {
    type Item = Feature<B>;

    fn next(&mut self) -> Option<Feature<B>> {
        let chip = self.chip.as_ref()?;
        let native = self.cursor.step(|nr| {
            Anchored::try_project(Rc::clone(chip), |chip| {
                B::feature(chip.config(), chip.native(), nr)
            })
        });
        let Some(native) = native else {
            trace!("feature enumeration finished");
            self.chip = None;
            return None;
        };
        Some(Feature::resolve(native))
    }
}

impl<B: Backend> FusedIterator for Features<B> {}

impl<B: Backend> fmt::Debug for Features<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Features").field("cursor", &self.cursor).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::simulated::testing::{fixture_file, Bare, FIXTURE};
    use crate::simulated::Simulated;
    use crate::Sensors;

    fn first_chip(json: &str) -> Chip<Simulated> {
        let file = fixture_file(json);
        let sensors = Sensors::<Simulated>::open(file.path()).unwrap();
        sensors.chips().next().unwrap()
    }

    #[test]
    fn test_missing_label_is_an_error() {
        let file = fixture_file(FIXTURE);
        let sensors = Sensors::<Bare>::open(file.path()).unwrap();
        let chip = sensors.chips().nth(1).unwrap();
        let feature = chip.features().next().unwrap();
        let err = feature.label().unwrap_err();
        assert_eq!(
            err,
            Error::Label {
                feature: "temp1".to_string()
            }
        );
        assert_eq!(feature.name(), "temp1");
    }

    #[test]
    fn test_names_and_labels() {
        let chip = first_chip(FIXTURE);
        let features: Vec<_> = chip.features().collect();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].name(), "temp1");
        assert_eq!(features[0].label().unwrap(), "Package id 0");
        assert_eq!(features[1].name(), "temp2");
        assert_eq!(features[1].label().unwrap(), "Core 0");
    }

    #[test]
    fn test_number_and_kind() {
        let chip = first_chip(FIXTURE);
        let numbers: Vec<_> = chip.features().map(|f| f.number()).collect();
        assert_eq!(numbers, [0, 1]);
        assert!(chip.features().all(|f| f.kind() == FeatureType::Temperature));
    }

    #[test]
    fn test_identity_per_chip() {
        let chip = first_chip(FIXTURE);
        let first: Vec<_> = chip.features().collect();
        let second: Vec<_> = chip.features().collect();
        assert_eq!(first, second);
        assert_eq!(chip.live_features(), 2);
    }

    #[test]
    fn test_parent_is_same_chip() {
        let chip = first_chip(FIXTURE);
        let feature = chip.features().next().unwrap();
        assert_eq!(feature.chip(), chip);
    }

    #[test]
    fn test_feature_keeps_chip_alive() {
        let chip = first_chip(FIXTURE);
        let feature = chip.features().next().unwrap();
        drop(chip);
        assert_eq!(feature.chip().name().unwrap(), "coretemp-isa-0000");
    }

    #[test]
    fn test_chip_without_features() {
        let chip = first_chip(r#"{"nct6775-isa-0290": {"Adapter": "ISA adapter"}}"#);
        assert_eq!(chip.features().count(), 0);
    }

    #[test]
    fn test_for_each_subfeature_stops() {
        let chip = first_chip(FIXTURE);
        let feature = chip.features().next().unwrap();
        let mut names = Vec::new();
        let flow = feature.for_each_subfeature(|sub| {
            names.push(sub.name().into_owned());
            if names.len() == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(flow, ControlFlow::Break(()));
        assert_eq!(names, ["temp1_input", "temp1_max"]);
    }

    #[test]
    fn test_debug_shows_name() {
        let chip = first_chip(FIXTURE);
        let feature = chip.features().next().unwrap();
        let debug = format!("{feature:?}");
        assert!(debug.contains("temp1"));
        assert!(debug.contains("Temperature"));
    }
}
