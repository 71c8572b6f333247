//! lmsensors: Safe Rust Interfaces for lm-sensors
//!
//! lmsensors wraps the lm-sensors library (libsensors) that exposes the
//! hardware monitoring chips of a machine: temperatures, voltages, fan
//! speeds and the limits and alarms attached to them.
//!
//! # Object Model
//!
//! | Type | Native object | Obtained from |
//! |------|---------------|---------------|
//! | [`Sensors`] | `sensors_config` | [`Sensors::open`] |
//! | [`Chip`] | `sensors_chip_name` | [`Sensors::chips`] |
//! | [`Feature`] | `sensors_feature` | [`Chip::features`] |
//! | [`Subfeature`] | `sensors_subfeature` | [`Feature::subfeatures`] |
//!
//! Wrappers are identity-stable: while a [`Chip`] (or feature, or
//! subfeature) is alive, enumerating again returns a handle equal to it.
//! Every wrapper keeps its parents alive, and the native configuration is
//! released once the last handle obtained from it is dropped.
//!
//! # Quick Start
//!
//! ```no_run
//! use lmsensors::{Sensors, Simulated};
//!
//! let sensors = Sensors::<Simulated>::open("sensors.json")?;
//! for chip in &sensors {
//!     println!("{} ({})", chip.name()?, chip.adapter().unwrap_or_default());
//!     for feature in &chip {
//!         for sub in &feature {
//!             if let Ok(value) = sub.value() {
//!                 println!("  {}: {value:.1} {}", sub.name(), sub.unit());
//!             }
//!         }
//!     }
//! }
//! # Ok::<(), lmsensors::Error>(())
//! ```
//!
//! # Feature Flags
//!
//! - `libsensors` - Link the system libsensors and enable [`System`]
//!
//! Without `libsensors`, the [`Simulated`] backend reads the JSON printed by
//! `sensors -j` and needs no native library.
//!
//! # Safety Guarantees
//!
//! This crate uses `#![deny(unsafe_code)]` at the library level. All FFI
//! code is quarantined in the internal `ffi` module, which is not exported.
//!
//! # Error Handling
//!
//! All operations that can fail return [`Result<T, Error>`].
//!
//! # Thread Safety
//!
//! Handles are `!Send` and `!Sync`: a libsensors configuration must not be
//! used from several threads at once.

// SAFETY: This crate denies unsafe code at the library level.
// All unsafe FFI code is quarantined in src/ffi/, which is not exported.
// We use deny (not forbid) so it can be overridden in the ffi module.
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)] // Allow libsensors, hwmon, etc. without backticks

pub mod backend;
pub mod cache;
pub mod chip;
pub mod cursor;
pub mod error;
pub mod feature;
pub mod quantity;
pub mod sensors;
pub mod simulated;
pub mod subfeature;

// FFI module is internal only - not exported
mod ffi;

// Re-export main types for convenience
pub use backend::{Backend, BusId, BusType};
pub use chip::{Chip, Chips};
pub use error::{Error, NativeErrorCode, Result};
pub use feature::{Feature, Features};
#[cfg(feature = "libsensors")]
pub use ffi::libsensors::LibSensors;
pub use quantity::{FeatureType, Quantity, SubfeatureFlags, SubfeatureType};
#[cfg(feature = "libsensors")]
pub use sensors::System;
pub use sensors::{Sensors, DEFAULT_CONFIG_PATH};
pub use simulated::Simulated;
pub use subfeature::{Subfeature, Subfeatures};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the linked libsensors, `None` when built without it.
#[must_use]
pub fn library_version() -> Option<&'static str> {
    #[cfg(feature = "libsensors")]
    {
        Some(LibSensors::version())
    }
    #[cfg(not(feature = "libsensors"))]
    {
        None
    }
}
