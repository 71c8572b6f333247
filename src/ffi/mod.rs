//! FFI Quarantine Zone - All unsafe code isolated here.
//!
//! # Safety Architecture
//!
//! This module contains ALL unsafe code in the lmsensors crate. The public
//! API in `src/lib.rs` is compiled under `#![deny(unsafe_code)]`, ensuring
//! no unsafe code leaks into the user-facing interface.
//!
//! ## Safety Rules
//!
//! - Every `unsafe` block has a `// SAFETY:` comment
//! - No raw pointers escape this module; borrowed native pointers are
//!   wrapped in [`anchor::Anchored`] together with their owner
//! - C strings are exposed as `&CStr` and converted lossily by callers
//! - Strings allocated per call by libsensors are freed right after copying
//! - The native configuration is released exactly once, in `Drop`
//!
//! # Module Structure
//!
//! ```text
//! ffi/
//! ├── mod.rs          # This file - module router
//! ├── anchor.rs       # Borrowed pointer + owning Rc
//! └── libsensors.rs   # libsensors bindings (feature "libsensors")
//! ```

// Allow unsafe in this module only - quarantine zone
#![allow(unsafe_code)]

pub mod anchor;

#[cfg(feature = "libsensors")]
pub mod libsensors;
