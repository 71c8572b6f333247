//! libsensors bindings.
//!
//! Binds the reentrant (`_r`) libsensors API, where every call takes an
//! explicit `sensors_config` handle instead of using library-global state.
//!
//! # Safety
//!
//! This module contains unsafe FFI code. All unsafe blocks are documented
//! with SAFETY comments explaining why they are sound.
//!
//! # Thread Safety
//!
//! A `sensors_config` is not safe for concurrent use. [`RawConfig`] is
//! `!Send` and `!Sync`.

#![allow(non_camel_case_types)]

use crate::backend::{Backend, BusId, ChipId, FeatureInfo, SubfeatureInfo};
use crate::quantity::{FeatureType, SubfeatureFlags, SubfeatureType};
use std::borrow::Cow;
use std::ffi::{c_char, c_double, c_int, c_short, c_uint, CStr};
use std::fs::File;
use std::os::fd::IntoRawFd;
use std::ptr::{self, NonNull};
use tracing::{debug, warn};

/// Opaque `sensors_config`.
#[repr(C)]
pub struct sensors_config {
    _private: [u8; 0],
}

/// `sensors_bus_id`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct sensors_bus_id {
    pub kind: c_short,
    pub nr: c_short,
}

/// `sensors_chip_name`.
#[repr(C)]
pub struct sensors_chip_name {
    pub prefix: *mut c_char,
    pub bus: sensors_bus_id,
    pub addr: c_int,
    pub path: *mut c_char,
}

/// `sensors_feature`.
#[repr(C)]
pub struct sensors_feature {
    pub name: *mut c_char,
    pub number: c_int,
    pub kind: c_int,
    _first_subfeature: c_int,
    _padding1: c_int,
}

/// `sensors_subfeature`.
#[repr(C)]
pub struct sensors_subfeature {
    pub name: *mut c_char,
    pub number: c_int,
    pub kind: c_int,
    pub mapping: c_int,
    pub flags: c_uint,
}

#[link(name = "sensors")]
extern "C" {
    static libsensors_version: *const c_char;

    fn sensors_init_r(input: *mut libc::FILE, err: *mut c_int) -> *mut sensors_config;
    fn sensors_cleanup_r(config: *mut sensors_config);
    fn sensors_strerror(errnum: c_int) -> *const c_char;
    fn sensors_snprintf_chip_name(
        buf: *mut c_char,
        size: libc::size_t,
        chip: *const sensors_chip_name,
    ) -> c_int;
    fn sensors_get_detected_chips_r(
        config: *mut sensors_config,
        matching: *const sensors_chip_name,
        nr: *mut c_int,
    ) -> *const sensors_chip_name;
    fn sensors_get_features_r(
        config: *mut sensors_config,
        chip: *const sensors_chip_name,
        nr: *mut c_int,
    ) -> *const sensors_feature;
    fn sensors_get_all_subfeatures_r(
        config: *mut sensors_config,
        chip: *const sensors_chip_name,
        feature: *const sensors_feature,
        nr: *mut c_int,
    ) -> *const sensors_subfeature;
    fn sensors_get_adapter_name_r(
        config: *mut sensors_config,
        bus: *const sensors_bus_id,
    ) -> *const c_char;
    fn sensors_get_label_r(
        config: *mut sensors_config,
        chip: *const sensors_chip_name,
        feature: *const sensors_feature,
    ) -> *mut c_char;
    fn sensors_get_subfeature_quantity(kind: c_int) -> c_int;
    fn sensors_get_quantity_name(quantity: c_int) -> *const c_char;
    fn sensors_get_quantity_unit(quantity: c_int) -> *const c_char;
    fn sensors_get_value_r(
        config: *mut sensors_config,
        chip: *const sensors_chip_name,
        subfeat_nr: c_int,
        value: *mut c_double,
    ) -> c_int;
}

/// RAII wrapper for a `sensors_config`.
///
/// Calls `sensors_cleanup_r` on drop.
pub struct RawConfig {
    config: NonNull<sensors_config>,
}

impl RawConfig {
    const fn as_ptr(&self) -> *mut sensors_config {
        self.config.as_ptr()
    }
}

impl Drop for RawConfig {
    fn drop(&mut self) {
        debug!(config = ?self.config, "sensors_cleanup_r");
        // SAFETY: config was returned non-null by sensors_init_r and this is
        // the only place it is released; RawConfig is neither Clone nor Copy.
        unsafe { sensors_cleanup_r(self.config.as_ptr()) }
    }
}

/// Convert a possibly-null C string pointer into a borrowed `CStr`.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn opt_cstr<'a>(ptr: *const c_char) -> Option<&'a CStr> {
    if ptr.is_null() {
        None
    } else {
        // SAFETY: non-null and NUL-terminated per the function contract.
        Some(unsafe { CStr::from_ptr(ptr) })
    }
}

const EMPTY: &CStr = c"";

/// The system libsensors.
#[derive(Debug, Clone, Copy)]
pub struct LibSensors;

impl Backend for LibSensors {
    type Config = RawConfig;
    type Chip = sensors_chip_name;
    type Feature = sensors_feature;
    type Subfeature = sensors_subfeature;

    fn version() -> &'static str {
        // SAFETY: libsensors_version is a static NUL-terminated string
        // initialized by the library at load time.
        unsafe { opt_cstr(libsensors_version) }
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }

    fn init(input: File) -> Result<RawConfig, c_int> {
        let fd = input.into_raw_fd();
        // SAFETY: fd is a valid, open, readable descriptor we own; on success
        // its ownership passes to the returned FILE.
        let stream = unsafe { libc::fdopen(fd, c"r".as_ptr()) };
        if stream.is_null() {
            warn!(fd, "fdopen failed for sensors configuration");
            // SAFETY: fdopen failed, so fd is still ours to close.
            unsafe { libc::close(fd) };
            return Err(crate::error::NativeErrorCode::Io.negated());
        }

        let mut err: c_int = 0;
        // SAFETY: stream is a valid FILE opened for reading; err is a valid
        // out-pointer for the duration of the call.
        let config = unsafe { sensors_init_r(stream, &mut err) };
        // SAFETY: sensors_init_r is done with the stream once it returns.
        unsafe { libc::fclose(stream) };

        NonNull::new(config)
            .map(|config| RawConfig { config })
            .ok_or(err)
    }

    fn strerror(code: c_int) -> Cow<'static, str> {
        // SAFETY: sensors_strerror returns a pointer into a static table.
        match unsafe { opt_cstr(sensors_strerror(code)) } {
            Some(msg) => msg.to_string_lossy(),
            None => Cow::Borrowed(crate::error::NativeErrorCode::describe(code)),
        }
    }

    fn detected_chip<'c>(config: &'c RawConfig, nr: &mut c_int) -> Option<&'c sensors_chip_name> {
        // SAFETY: config is live for 'c; a null match pointer means "all
        // chips"; nr is a valid cursor.
        let chip = unsafe { sensors_get_detected_chips_r(config.as_ptr(), ptr::null(), nr) };
        // SAFETY: chip descriptors are owned by config and live until cleanup.
        unsafe { chip.as_ref() }
    }

    fn feature<'c>(
        config: &'c RawConfig,
        chip: &'c sensors_chip_name,
        nr: &mut c_int,
    ) -> Option<&'c sensors_feature> {
        // SAFETY: config and chip are live for 'c; nr is a valid cursor.
        let feature = unsafe { sensors_get_features_r(config.as_ptr(), chip, nr) };
        // SAFETY: feature descriptors are owned by config and live until cleanup.
        unsafe { feature.as_ref() }
    }

    fn subfeature<'c>(
        config: &'c RawConfig,
        chip: &'c sensors_chip_name,
        feature: &'c sensors_feature,
        nr: &mut c_int,
    ) -> Option<&'c sensors_subfeature> {
        // SAFETY: config, chip and feature are live for 'c; nr is a valid cursor.
        let sub = unsafe { sensors_get_all_subfeatures_r(config.as_ptr(), chip, feature, nr) };
        // SAFETY: subfeature descriptors are owned by config and live until cleanup.
        unsafe { sub.as_ref() }
    }

    fn chip_id(chip: &sensors_chip_name) -> ChipId<'_> {
        ChipId {
            // SAFETY: prefix and path are null or NUL-terminated strings
            // owned by the configuration, which outlives `chip`.
            prefix: unsafe { opt_cstr(chip.prefix) },
            bus: BusId {
                kind: chip.bus.kind,
                nr: chip.bus.nr,
            },
            addr: chip.addr,
            // SAFETY: as above.
            path: unsafe { opt_cstr(chip.path) },
        }
    }

    fn adapter_name(config: &RawConfig, bus: BusId) -> Option<&CStr> {
        let bus = sensors_bus_id {
            kind: bus.kind,
            nr: bus.nr,
        };
        // SAFETY: config is live; bus is a valid pointer for the call. The
        // result is null or a string owned by config.
        unsafe { opt_cstr(sensors_get_adapter_name_r(config.as_ptr(), &bus)) }
    }

    fn snprintf_chip_name(buf: &mut [u8], chip: &sensors_chip_name) -> c_int {
        let target = if buf.is_empty() {
            ptr::null_mut()
        } else {
            buf.as_mut_ptr().cast::<c_char>()
        };
        // SAFETY: target is null with size 0, or points to buf.len() writable bytes.
        unsafe { sensors_snprintf_chip_name(target, buf.len(), chip) }
    }

    fn feature_info(feature: &sensors_feature) -> FeatureInfo<'_> {
        FeatureInfo {
            // SAFETY: feature names are NUL-terminated and owned by the config.
            name: unsafe { opt_cstr(feature.name) }.unwrap_or(EMPTY),
            number: feature.number,
            kind: FeatureType::from_code(feature.kind),
        }
    }

    fn label(
        config: &RawConfig,
        chip: &sensors_chip_name,
        feature: &sensors_feature,
    ) -> Option<String> {
        // SAFETY: all pointers are live; the result is malloc'd and ours to free.
        let label = unsafe { sensors_get_label_r(config.as_ptr(), chip, feature) };
        // SAFETY: label is null or a NUL-terminated string we own.
        let copied = unsafe { opt_cstr(label) }.map(|l| l.to_string_lossy().into_owned());
        // SAFETY: label came from malloc in libsensors (or is null).
        unsafe { libc::free(label.cast()) };
        copied
    }

    fn subfeature_info(subfeature: &sensors_subfeature) -> SubfeatureInfo<'_> {
        SubfeatureInfo {
            // SAFETY: subfeature names are NUL-terminated and owned by the config.
            name: unsafe { opt_cstr(subfeature.name) }.unwrap_or(EMPTY),
            number: subfeature.number,
            kind: SubfeatureType::from_code(subfeature.kind),
            mapping: subfeature.mapping,
            flags: SubfeatureFlags::from_bits_truncate(subfeature.flags),
        }
    }

    fn quantity_name(kind: SubfeatureType) -> Cow<'static, str> {
        // SAFETY: both calls are pure table lookups; unknown codes map to the
        // library's own "unknown" entry or to null.
        let name = unsafe {
            let quantity = sensors_get_subfeature_quantity(kind.code());
            opt_cstr(sensors_get_quantity_name(quantity))
        };
        name.map_or(Cow::Borrowed(kind.quantity().name()), CStr::to_string_lossy)
    }

    fn quantity_unit(kind: SubfeatureType) -> Cow<'static, str> {
        // SAFETY: as in quantity_name; the strings are static.
        let unit = unsafe {
            let quantity = sensors_get_subfeature_quantity(kind.code());
            opt_cstr(sensors_get_quantity_unit(quantity))
        };
        unit.map_or(Cow::Borrowed(kind.quantity().unit()), CStr::to_string_lossy)
    }

    fn value(config: &RawConfig, chip: &sensors_chip_name, number: c_int) -> Result<f64, c_int> {
        let mut value: c_double = 0.0;
        // SAFETY: config and chip are live; value is a valid out-pointer.
        let status = unsafe { sensors_get_value_r(config.as_ptr(), chip, number, &mut value) };
        if status < 0 {
            Err(status)
        } else {
            Ok(value)
        }
    }
}
