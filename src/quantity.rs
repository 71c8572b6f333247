//! Feature and subfeature type codes, and what they measure.
//!
//! libsensors encodes a subfeature type as `(feature_type << 8) | index`,
//! where indices with bit `0x80` set are status values (alarms, faults,
//! beeps) rather than measurements. The tables here derive the name suffix,
//! the physical quantity and its unit from that code.

use bitflags::bitflags;
use std::ffi::c_int;
use std::fmt;

/// The kind of a feature (a logical measurement group on a chip).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureType {
    /// Voltage input (`inN`).
    Voltage,
    /// Fan (`fanN`).
    Fan,
    /// Temperature (`tempN`).
    Temperature,
    /// Power (`powerN`).
    Power,
    /// Energy (`energyN`).
    Energy,
    /// Current (`currN`).
    Current,
    /// Humidity (`humidityN`).
    Humidity,
    /// CPU core voltage identification (`cpuN_vid`).
    Vid,
    /// Chassis intrusion detection (`intrusionN`).
    Intrusion,
    /// Chip-wide beep enable switch.
    BeepEnable,
    /// Any code not known to this crate.
    Unknown,
}

impl FeatureType {
    /// Decode a native feature type code.
    #[must_use]
    pub const fn from_code(code: c_int) -> Self {
        match code {
            0x00 => Self::Voltage,
            0x01 => Self::Fan,
            0x02 => Self::Temperature,
            0x03 => Self::Power,
            0x04 => Self::Energy,
            0x05 => Self::Current,
            0x06 => Self::Humidity,
            0x10 => Self::Vid,
            0x11 => Self::Intrusion,
            0x18 => Self::BeepEnable,
            _ => Self::Unknown,
        }
    }

    /// The native feature type code.
    #[must_use]
    pub const fn code(self) -> c_int {
        match self {
            Self::Voltage => 0x00,
            Self::Fan => 0x01,
            Self::Temperature => 0x02,
            Self::Power => 0x03,
            Self::Energy => 0x04,
            Self::Current => 0x05,
            Self::Humidity => 0x06,
            Self::Vid => 0x10,
            Self::Intrusion => 0x11,
            Self::BeepEnable => 0x18,
            Self::Unknown => c_int::MAX,
        }
    }

    /// Determine the feature type from a sysfs-style feature name
    /// (`temp1`, `in0`, `cpu0_vid`, `beep_enable`, ...).
    #[must_use]
    pub fn from_feature_name(name: &str) -> Self {
        if name == "beep_enable" {
            return Self::BeepEnable;
        }
        if name.starts_with("cpu") && name.ends_with("_vid") {
            return Self::Vid;
        }
        let prefix = name.trim_end_matches(|c: char| c.is_ascii_digit());
        match prefix {
            "in" => Self::Voltage,
            "fan" => Self::Fan,
            "temp" => Self::Temperature,
            "power" => Self::Power,
            "energy" => Self::Energy,
            "curr" => Self::Current,
            "humidity" => Self::Humidity,
            "intrusion" => Self::Intrusion,
            _ => Self::Unknown,
        }
    }

    /// The quantity measured by the main subfeature of this feature.
    #[must_use]
    pub const fn quantity(self) -> Quantity {
        match self {
            Self::Voltage | Self::Vid => Quantity::Voltage,
            Self::Fan => Quantity::FanSpeed,
            Self::Temperature => Quantity::Temperature,
            Self::Power => Quantity::Power,
            Self::Energy => Quantity::Energy,
            Self::Current => Quantity::Current,
            Self::Humidity => Quantity::Humidity,
            Self::Intrusion | Self::BeepEnable => Quantity::Status,
            Self::Unknown => Quantity::Unknown,
        }
    }
}

/// Suffix table: `(subfeature type code, name suffix)`.
const SUBFEATURE_SUFFIXES: &[(c_int, &str)] = &[
    (0x000, "input"),
    (0x001, "min"),
    (0x002, "max"),
    (0x003, "lcrit"),
    (0x004, "crit"),
    (0x005, "average"),
    (0x006, "lowest"),
    (0x007, "highest"),
    (0x080, "alarm"),
    (0x081, "min_alarm"),
    (0x082, "max_alarm"),
    (0x083, "beep"),
    (0x084, "lcrit_alarm"),
    (0x085, "crit_alarm"),
    (0x100, "input"),
    (0x101, "min"),
    (0x102, "max"),
    (0x180, "alarm"),
    (0x181, "fault"),
    (0x182, "div"),
    (0x183, "beep"),
    (0x184, "pulses"),
    (0x185, "min_alarm"),
    (0x186, "max_alarm"),
    (0x200, "input"),
    (0x201, "max"),
    (0x202, "max_hyst"),
    (0x203, "min"),
    (0x204, "crit"),
    (0x205, "crit_hyst"),
    (0x206, "lcrit"),
    (0x207, "emergency"),
    (0x208, "emergency_hyst"),
    (0x209, "lowest"),
    (0x20a, "highest"),
    (0x20b, "min_hyst"),
    (0x20c, "lcrit_hyst"),
    (0x280, "alarm"),
    (0x281, "max_alarm"),
    (0x282, "min_alarm"),
    (0x283, "crit_alarm"),
    (0x284, "fault"),
    (0x285, "type"),
    (0x286, "offset"),
    (0x287, "beep"),
    (0x288, "emergency_alarm"),
    (0x289, "lcrit_alarm"),
    (0x300, "average"),
    (0x301, "average_highest"),
    (0x302, "average_lowest"),
    (0x303, "input"),
    (0x304, "input_highest"),
    (0x305, "input_lowest"),
    (0x306, "cap"),
    (0x307, "cap_hyst"),
    (0x308, "max"),
    (0x309, "crit"),
    (0x30a, "min"),
    (0x30b, "lcrit"),
    (0x380, "average_interval"),
    (0x381, "alarm"),
    (0x382, "cap_alarm"),
    (0x383, "max_alarm"),
    (0x384, "crit_alarm"),
    (0x385, "min_alarm"),
    (0x386, "lcrit_alarm"),
    (0x400, "input"),
    (0x500, "input"),
    (0x501, "min"),
    (0x502, "max"),
    (0x503, "lcrit"),
    (0x504, "crit"),
    (0x505, "average"),
    (0x506, "lowest"),
    (0x507, "highest"),
    (0x580, "alarm"),
    (0x581, "min_alarm"),
    (0x582, "max_alarm"),
    (0x583, "beep"),
    (0x584, "lcrit_alarm"),
    (0x585, "crit_alarm"),
    (0x600, "input"),
    (0x1000, "vid"),
    (0x1100, "alarm"),
    (0x1101, "beep"),
    (0x1800, "enable"),
];

// Status-range codes that still carry a measurement or a non-status meaning.
const FAN_DIV: c_int = 0x182;
const FAN_PULSES: c_int = 0x184;
const TEMP_TYPE: c_int = 0x285;
const TEMP_OFFSET: c_int = 0x286;
const POWER_AVERAGE_INTERVAL: c_int = 0x380;

/// A native subfeature type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubfeatureType(c_int);

impl SubfeatureType {
    /// The code libsensors uses for subfeatures it does not recognize.
    pub const UNKNOWN: Self = Self(c_int::MAX);

    /// Wrap a raw native code.
    #[must_use]
    pub const fn from_code(code: c_int) -> Self {
        Self(code)
    }

    /// Look up the type of a subfeature from its feature type and name suffix.
    ///
    /// Returns [`SubfeatureType::UNKNOWN`] if the suffix is not valid for
    /// that feature type.
    #[must_use]
    pub fn from_suffix(feature: FeatureType, suffix: &str) -> Self {
        let base = feature.code() << 8;
        SUBFEATURE_SUFFIXES
            .iter()
            .find(|(code, name)| (code & !0xff) == base && *name == suffix)
            .map_or(Self::UNKNOWN, |(code, _)| Self(*code))
    }

    /// The raw native code.
    #[must_use]
    pub const fn code(self) -> c_int {
        self.0
    }

    /// The type of the feature this subfeature belongs to.
    #[must_use]
    pub const fn feature_type(self) -> FeatureType {
        if self.0 == c_int::MAX {
            return FeatureType::Unknown;
        }
        FeatureType::from_code(self.0 >> 8)
    }

    /// Whether this is a status value (alarm, fault, beep) rather than
    /// a measurement.
    #[must_use]
    pub const fn is_status(self) -> bool {
        self.0 != c_int::MAX && self.0 & 0x80 != 0
    }

    /// The sysfs name suffix (`input`, `max`, `crit_alarm`, ...).
    #[must_use]
    pub fn suffix(self) -> Option<&'static str> {
        SUBFEATURE_SUFFIXES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, name)| *name)
    }

    /// The physical quantity this subfeature reports.
    #[must_use]
    pub const fn quantity(self) -> Quantity {
        match self.0 {
            FAN_DIV | FAN_PULSES => Quantity::Count,
            TEMP_TYPE => Quantity::SensorType,
            TEMP_OFFSET => Quantity::Temperature,
            POWER_AVERAGE_INTERVAL => Quantity::Interval,
            _ if self.is_status() => Quantity::Status,
            _ => self.feature_type().quantity(),
        }
    }
}

impl fmt::Display for SubfeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.suffix() {
            Some(suffix) => write!(f, "{suffix} (0x{:x})", self.0),
            None => write!(f, "unknown (0x{:x})", self.0),
        }
    }
}

/// The physical dimension of a subfeature's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    /// Volts.
    Voltage,
    /// Revolutions per minute.
    FanSpeed,
    /// Degrees Celsius.
    Temperature,
    /// Watts.
    Power,
    /// Joules.
    Energy,
    /// Amperes.
    Current,
    /// Relative humidity.
    Humidity,
    /// Seconds.
    Interval,
    /// Dimensionless counts (fan divisor, pulses per revolution).
    Count,
    /// Temperature sensor type selector.
    SensorType,
    /// Boolean alarm, fault or beep state.
    Status,
    /// Not known.
    Unknown,
}

impl Quantity {
    /// Human-readable name of the quantity.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Voltage => "voltage",
            Self::FanSpeed => "fan speed",
            Self::Temperature => "temperature",
            Self::Power => "power",
            Self::Energy => "energy",
            Self::Current => "current",
            Self::Humidity => "humidity",
            Self::Interval => "interval",
            Self::Count => "count",
            Self::SensorType => "sensor type",
            Self::Status => "status",
            Self::Unknown => "unknown",
        }
    }

    /// Unit symbol, empty for dimensionless quantities.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Voltage => "V",
            Self::FanSpeed => "RPM",
            Self::Temperature => "°C",
            Self::Power => "W",
            Self::Energy => "J",
            Self::Current => "A",
            Self::Humidity => "%RH",
            Self::Interval => "s",
            Self::Count | Self::SensorType | Self::Status | Self::Unknown => "",
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Access mode flags of a subfeature (`SENSORS_MODE_*`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SubfeatureFlags: u32 {
        /// The value can be read.
        const READABLE = 0x01;
        /// The value can be written.
        const WRITABLE = 0x02;
        /// The value is affected by the feature's compute statement.
        const COMPUTE_MAPPING = 0x04;
    }
}
