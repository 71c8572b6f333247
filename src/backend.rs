//! The native sensor library seam.
//!
//! [`Backend`] describes the black-box C API this crate wraps. Every
//! descriptor it hands out (`&'c Self::Chip`, `&'c Self::Feature`,
//! `&'c Self::Subfeature`) is borrowed from the configuration it was
//! enumerated from, and the lifetime `'c` states exactly that: a chip
//! pointer is valid for as long as its configuration is alive.
//!
//! Two backends ship with the crate:
//!
//! - `LibSensors` (feature `libsensors`) links the system libsensors.
//! - [`Simulated`](crate::simulated::Simulated) reads `sensors -j` style
//!   JSON, for tests and machines without sensor hardware.

use crate::error::NativeErrorCode;
use crate::quantity::{FeatureType, SubfeatureFlags, SubfeatureType};
use std::borrow::Cow;
use std::ffi::{c_int, CStr};
use std::fmt;
use std::fs::File;

/// Bus kinds known to libsensors (`SENSORS_BUS_TYPE_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusType {
    /// Wildcard, matches any bus.
    Any,
    /// I2C / SMBus.
    I2c,
    /// ISA (includes most Super-I/O and on-die CPU sensors).
    Isa,
    /// PCI.
    Pci,
    /// SPI.
    Spi,
    /// Virtual device (thermal zones and the like).
    Virtual,
    /// ACPI.
    Acpi,
    /// HID.
    Hid,
    /// MDIO.
    Mdio,
    /// SCSI.
    Scsi,
}

impl BusType {
    /// Decode a native bus type code.
    #[must_use]
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            -1 => Some(Self::Any),
            0 => Some(Self::I2c),
            1 => Some(Self::Isa),
            2 => Some(Self::Pci),
            3 => Some(Self::Spi),
            4 => Some(Self::Virtual),
            5 => Some(Self::Acpi),
            6 => Some(Self::Hid),
            7 => Some(Self::Mdio),
            8 => Some(Self::Scsi),
            _ => None,
        }
    }

    /// The native bus type code.
    #[must_use]
    pub const fn code(self) -> i16 {
        match self {
            Self::Any => -1,
            Self::I2c => 0,
            Self::Isa => 1,
            Self::Pci => 2,
            Self::Spi => 3,
            Self::Virtual => 4,
            Self::Acpi => 5,
            Self::Hid => 6,
            Self::Mdio => 7,
            Self::Scsi => 8,
        }
    }

    /// The token used for this bus in chip names (`isa`, `i2c`, ...).
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Any => "*",
            Self::I2c => "i2c",
            Self::Isa => "isa",
            Self::Pci => "pci",
            Self::Spi => "spi",
            Self::Virtual => "virtual",
            Self::Acpi => "acpi",
            Self::Hid => "hid",
            Self::Mdio => "mdio",
            Self::Scsi => "scsi",
        }
    }

    /// Parse a chip name bus token.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        [
            Self::Any,
            Self::I2c,
            Self::Isa,
            Self::Pci,
            Self::Spi,
            Self::Virtual,
            Self::Acpi,
            Self::Hid,
            Self::Mdio,
            Self::Scsi,
        ]
        .into_iter()
        .find(|bus| bus.token() == token)
    }

    /// Whether chip names on this bus carry a bus number.
    #[must_use]
    pub const fn is_numbered(self) -> bool {
        matches!(self, Self::I2c | Self::Spi | Self::Hid | Self::Scsi)
    }

    /// Adapter name libsensors reports for buses that have a fixed one.
    ///
    /// I2C adapters are named by the kernel, so there is no fixed name.
    #[must_use]
    pub const fn fixed_adapter_name(self) -> Option<&'static str> {
        match self {
            Self::Isa => Some("ISA adapter"),
            Self::Pci => Some("PCI adapter"),
            Self::Spi => Some("SPI adapter"),
            Self::Virtual => Some("Virtual device"),
            Self::Acpi => Some("ACPI interface"),
            Self::Hid => Some("HID adapter"),
            Self::Mdio => Some("MDIO adapter"),
            Self::Scsi => Some("SCSI adapter"),
            Self::Any | Self::I2c => None,
        }
    }
}

impl fmt::Display for BusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Bus identifier of a chip (`sensors_bus_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusId {
    /// Native bus type code, `-1` for any.
    pub kind: i16,
    /// Bus number, `-1` for any.
    pub nr: i16,
}

impl BusId {
    /// Wildcard bus number.
    pub const ANY_NR: i16 = -1;

    /// Decoded bus type, if known.
    #[must_use]
    pub const fn bus_type(self) -> Option<BusType> {
        BusType::from_code(self.kind)
    }
}

/// Identification of a chip as stored by the native library.
#[derive(Debug, Clone, Copy)]
pub struct ChipId<'a> {
    /// Driver prefix (`coretemp`, `nct6775`, ...), `None` for a wildcard.
    pub prefix: Option<&'a CStr>,
    /// Bus the chip sits on.
    pub bus: BusId,
    /// Address on the bus, `-1` for any.
    pub addr: c_int,
    /// sysfs device path, if known.
    pub path: Option<&'a CStr>,
}

/// Static data of a feature.
#[derive(Debug, Clone, Copy)]
pub struct FeatureInfo<'a> {
    /// sysfs feature name (`temp1`, `fan2`, ...).
    pub name: &'a CStr,
    /// Feature number within the chip.
    pub number: c_int,
    /// Feature type.
    pub kind: FeatureType,
}

/// Static data of a subfeature.
#[derive(Debug, Clone, Copy)]
pub struct SubfeatureInfo<'a> {
    /// sysfs subfeature name (`temp1_input`, ...).
    pub name: &'a CStr,
    /// Subfeature number within the chip, used for value reads.
    pub number: c_int,
    /// Subfeature type code.
    pub kind: SubfeatureType,
    /// Number of the main feature this subfeature belongs to.
    pub mapping: c_int,
    /// Access mode flags.
    pub flags: SubfeatureFlags,
}

/// The native sensor library API.
///
/// All functions are associated functions: a backend is a type, not a value,
/// and the library state lives entirely in `Self::Config`. Dropping a
/// `Config` releases the native configuration and invalidates every
/// descriptor borrowed from it.
///
/// Cursor functions follow the libsensors convention: `nr` starts at `0`,
/// the function advances it, and `None` ends the enumeration.
pub trait Backend: Sized + 'static {
    /// Owned native configuration handle.
    type Config;
    /// Chip descriptor (`sensors_chip_name`).
    type Chip;
    /// Feature descriptor (`sensors_feature`).
    type Feature;
    /// Subfeature descriptor (`sensors_subfeature`).
    type Subfeature;

    /// Version string of the native library.
    fn version() -> &'static str;

    /// Parse a configuration from `input`. The stream is consumed.
    ///
    /// # Errors
    ///
    /// Returns the native status code if the configuration is rejected.
    fn init(input: File) -> Result<Self::Config, c_int>;

    /// Message for a native status code.
    fn strerror(code: c_int) -> Cow<'static, str> {
        Cow::Borrowed(NativeErrorCode::describe(code))
    }

    /// Next detected chip at cursor `nr`.
    fn detected_chip<'c>(config: &'c Self::Config, nr: &mut c_int) -> Option<&'c Self::Chip>;

    /// Next feature of `chip` at cursor `nr`.
    fn feature<'c>(
        config: &'c Self::Config,
        chip: &'c Self::Chip,
        nr: &mut c_int,
    ) -> Option<&'c Self::Feature>;

    /// Next subfeature of `feature` at cursor `nr`.
    fn subfeature<'c>(
        config: &'c Self::Config,
        chip: &'c Self::Chip,
        feature: &'c Self::Feature,
        nr: &mut c_int,
    ) -> Option<&'c Self::Subfeature>;

    /// Identification fields of a chip.
    fn chip_id(chip: &Self::Chip) -> ChipId<'_>;

    /// Name of the adapter for `bus`, if any.
    fn adapter_name(config: &Self::Config, bus: BusId) -> Option<&CStr>;

    /// Render the canonical chip name into `buf` with `snprintf` semantics.
    ///
    /// Returns the full length of the name (without terminator) or a
    /// negative status code. An empty `buf` only queries the length.
    fn snprintf_chip_name(buf: &mut [u8], chip: &Self::Chip) -> c_int;

    /// Static data of a feature.
    fn feature_info(feature: &Self::Feature) -> FeatureInfo<'_>;

    /// Label of a feature, honoring `label` statements of the configuration.
    fn label(
        config: &Self::Config,
        chip: &Self::Chip,
        feature: &Self::Feature,
    ) -> Option<String>;

    /// Static data of a subfeature.
    fn subfeature_info(subfeature: &Self::Subfeature) -> SubfeatureInfo<'_>;

    /// Name of the quantity measured by subfeatures of type `kind`.
    fn quantity_name(kind: SubfeatureType) -> Cow<'static, str> {
        Cow::Borrowed(kind.quantity().name())
    }

    /// Unit of the quantity measured by subfeatures of type `kind`, empty
    /// for dimensionless values.
    fn quantity_unit(kind: SubfeatureType) -> Cow<'static, str> {
        Cow::Borrowed(kind.quantity().unit())
    }

    /// Read the current value of subfeature `number` of `chip`.
    ///
    /// # Errors
    ///
    /// Returns the native status code if the read fails.
    fn value(config: &Self::Config, chip: &Self::Chip, number: c_int) -> Result<f64, c_int>;
}
