//! Configuration handle.
//!
//! A [`Sensors`] value is the entry point of the crate. It starts out empty,
//! is initialized exactly once from a configuration file, and from then on
//! enumerates the detected chips.
//!
//! # Example
//!
//! ```no_run
//! use lmsensors::{Sensors, Simulated};
//!
//! let sensors = Sensors::<Simulated>::open("sensors.json")?;
//! for chip in &sensors {
//!     println!("{}", chip.name()?);
//! }
//! # Ok::<(), lmsensors::Error>(())
//! ```
//!
//! # Lifetime
//!
//! The native configuration is released when the handle and every chip,
//! feature and subfeature obtained from it have been dropped. There is no
//! way to release it earlier, so no wrapper can ever observe a released
//! configuration.

use crate::backend::Backend;
use crate::cache::IdentityCache;
use crate::chip::{Chip, ChipNode, Chips};
use crate::error::{Error, Result};
use std::any::type_name;
use std::cell::OnceCell;
use std::fmt;
use std::fs::File;
use std::ops::ControlFlow;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, instrument, warn};

/// Default libsensors configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sensors3.conf";

/// Shared state of an initialized handle.
///
/// Every chip wrapper holds a strong reference to it, which keeps the native
/// configuration alive.
pub(crate) struct Context<B: Backend> {
    config: B::Config,
    chips: IdentityCache<ChipNode<B>>,
}

impl<B: Backend> Context<B> {
    pub(crate) const fn config(&self) -> &B::Config {
        &self.config
    }

    pub(crate) const fn chips(&self) -> &IdentityCache<ChipNode<B>> {
        &self.chips
    }
}

impl<B: Backend> Drop for Context<B> {
    fn drop(&mut self) {
        debug!(backend = type_name::<B>(), "releasing sensors configuration");
    }
}

/// Handle on a sensors configuration.
///
/// Not `Send` or `Sync`: native configurations are not safe for concurrent
/// use.
pub struct Sensors<B: Backend> {
    context: OnceCell<Rc<Context<B>>>,
}

impl<B: Backend> Sensors<B> {
    /// Create an uninitialized handle.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            context: OnceCell::new(),
        }
    }

    /// Create a handle and initialize it from `path`.
    ///
    /// # Errors
    ///
    /// See [`Sensors::initialize`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let sensors = Self::new();
        sensors.initialize(path)?;
        Ok(sensors)
    }

    /// Load the configuration file at `path` into this handle.
    ///
    /// A failed call leaves the handle uninitialized, so it may be retried.
    ///
    /// # Errors
    ///
    /// - [`Error::State`] if the handle is already initialized
    /// - [`Error::Io`] if the file cannot be opened
    /// - [`Error::Config`] if the native library rejects the contents
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn initialize(&self, path: impl AsRef<Path>) -> Result<&Self> {
        if self.is_initialized() {
            warn!("sensors configuration already initialized");
            return Err(Error::already_initialized());
        }

        let path = path.as_ref();
        let file = File::open(path).map_err(|err| Error::io(path, &err))?;
        let config = B::init(file).map_err(|code| {
            let message = B::strerror(code);
            warn!(code, %message, "sensors configuration rejected");
            Error::config(code, message)
        })?;

        let context = Rc::new(Context {
            config,
            chips: IdentityCache::new(),
        });
        self.context
            .set(context)
            .map_err(|_| Error::already_initialized())?;
        debug!("sensors configuration initialized");
        Ok(self)
    }

    /// Whether a configuration has been loaded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.context.get().is_some()
    }

    /// Version string of the native library.
    #[must_use]
    pub fn version() -> &'static str {
        B::version()
    }

    /// Iterate over the detected chips.
    ///
    /// An uninitialized handle yields nothing.
    pub fn chips(&self) -> Chips<B> {
        let context = self.context.get().cloned();
        if context.is_none() {
            debug!("enumerating chips of an uninitialized handle");
        }
        Chips::new(context)
    }

    /// Call `action` on each detected chip until it breaks.
    ///
    /// Returns [`ControlFlow::Break`] if `action` stopped the enumeration.
    pub fn for_each_chip<F>(&self, mut action: F) -> ControlFlow<()>
    where
        F: FnMut(&Chip<B>) -> ControlFlow<()>,
    {
        self.chips().try_for_each(|chip| action(&chip))
    }

    /// Number of chip wrappers currently alive.
    #[must_use]
    pub fn live_chips(&self) -> usize {
        self.context.get().map_or(0, |context| context.chips().live_len())
    }
}

impl<B: Backend> Default for Sensors<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> fmt::Debug for Sensors<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sensors")
            .field("backend", &type_name::<B>())
            .field("initialized", &self.is_initialized())
            .field("live_chips", &self.live_chips())
            .finish()
    }
}

impl<'a, B: Backend> IntoIterator for &'a Sensors<B> {
    type Item = Chip<B>;
    type IntoIter = Chips<B>;

    fn into_iter(self) -> Chips<B> {
        self.chips()
    }
}

/// Handle on the system libsensors.
#[cfg(feature = "libsensors")]
pub type System = Sensors<crate::ffi::libsensors::LibSensors>;

#[cfg(feature = "libsensors")]
impl Sensors<crate::ffi::libsensors::LibSensors> {
    /// Open the system configuration at [`DEFAULT_CONFIG_PATH`].
    ///
    /// # Errors
    ///
    /// See [`Sensors::initialize`].
    pub fn open_default() -> Result<Self> {
        Self::open(DEFAULT_CONFIG_PATH)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::simulated::testing::{fixture_file, FIXTURE};
    use crate::simulated::Simulated;
    use tracing_test::traced_test;

    #[test]
    fn test_new_is_uninitialized() {
        let sensors = Sensors::<Simulated>::new();
        assert!(!sensors.is_initialized());
        assert_eq!(sensors.chips().count(), 0);
    }

    #[test]
    fn test_initialize_once() {
        let file = fixture_file(FIXTURE);
        let sensors = Sensors::<Simulated>::new();
        sensors.initialize(file.path()).unwrap();
        assert!(sensors.is_initialized());

        let again = sensors.initialize(file.path()).unwrap_err();
        assert!(again.is_state());
        assert_eq!(sensors.chips().count(), 2);
    }

    #[test]
    fn test_missing_file_leaves_handle_usable() {
        let sensors = Sensors::<Simulated>::new();
        let err = sensors.initialize("/nonexistent/sensors3.conf").unwrap_err();
        assert!(err.is_io());
        assert!(!sensors.is_initialized());

        let file = fixture_file(FIXTURE);
        sensors.initialize(file.path()).unwrap();
        assert!(sensors.is_initialized());
    }

    #[test]
    fn test_rejected_config() {
        let file = fixture_file("not json");
        let err = Sensors::<Simulated>::open(file.path()).unwrap_err();
        assert!(err.is_config());
        assert_eq!(err.error_code(), Some(-8));
        assert!(err.to_string().contains("General parse error"));
    }

    #[test]
    fn test_for_each_chip_stops_early() {
        let file = fixture_file(FIXTURE);
        let sensors = Sensors::<Simulated>::open(file.path()).unwrap();
        let mut seen = 0;
        let flow = sensors.for_each_chip(|_| {
            seen += 1;
            ControlFlow::Break(())
        });
        assert_eq!(flow, ControlFlow::Break(()));
        assert_eq!(seen, 1);

        let mut all = 0;
        let flow = sensors.for_each_chip(|_| {
            all += 1;
            ControlFlow::Continue(())
        });
        assert_eq!(flow, ControlFlow::Continue(()));
        assert_eq!(all, 2);
    }

    #[test]
    fn test_for_each_chip_uninitialized() {
        let sensors = Sensors::<Simulated>::default();
        let flow = sensors.for_each_chip(|_| unreachable!("no chips"));
        assert_eq!(flow, ControlFlow::Continue(()));
    }

    #[test]
    fn test_live_chips() {
        let file = fixture_file(FIXTURE);
        let sensors = Sensors::<Simulated>::open(file.path()).unwrap();
        assert_eq!(sensors.live_chips(), 0);
        let chips: Vec<_> = sensors.chips().collect();
        assert_eq!(sensors.live_chips(), 2);
        drop(chips);
        assert_eq!(sensors.live_chips(), 0);
    }

    #[test]
    fn test_debug_output() {
        let sensors = Sensors::<Simulated>::new();
        let debug = format!("{sensors:?}");
        assert!(debug.contains("initialized: false"));
        assert!(debug.contains("Simulated"));
    }

    #[test]
    fn test_version_from_backend() {
        assert_eq!(Sensors::<Simulated>::version(), Simulated::version());
    }

    #[test]
    #[traced_test]
    fn test_lifecycle_is_logged() {
        let file = fixture_file(FIXTURE);
        let sensors = Sensors::<Simulated>::open(file.path()).unwrap();
        assert!(logs_contain("sensors configuration initialized"));

        let chip = sensors.chips().next().unwrap();
        drop(sensors);
        assert!(!logs_contain("releasing sensors configuration"));
        drop(chip);
        assert!(logs_contain("releasing sensors configuration"));
    }

    #[test]
    #[traced_test]
    fn test_uninitialized_enumeration_is_logged() {
        let sensors = Sensors::<Simulated>::new();
        assert_eq!(sensors.chips().count(), 0);
        assert!(logs_contain("uninitialized handle"));
    }
}
