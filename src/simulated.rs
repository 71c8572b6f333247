//! A simulated native sensor library.
//!
//! [`Simulated`] implements [`Backend`] in pure Rust so that the crate can be
//! exercised without sensor hardware or libsensors installed. Its
//! configuration file is the JSON document printed by `sensors -j`:
//!
//! ```json
//! {
//!   "coretemp-isa-0000": {
//!     "Adapter": "ISA adapter",
//!     "Package id 0": { "temp1_input": 45.0, "temp1_max": 80.0 },
//!     "Core 0": { "temp2_input": 43.0, "temp2_crit_alarm": 0.0 }
//!   }
//! }
//! ```
//!
//! Every top-level key is a detected chip. Inside a chip, `"Adapter"` and
//! `"Path"` are optional strings; every other key is a feature label mapping
//! subfeature names to values. A `null` value makes reads of that
//! subfeature fail with `SENSORS_ERR_ACCESS_R`. An empty file is a valid
//! configuration without chips.
//!
//! Descriptors are laid out the way libsensors lays them out: features and
//! subfeatures are numbered per chip, and a feature's subfeatures are the
//! consecutive run whose `mapping` equals the feature number.

use crate::backend::{Backend, BusId, BusType, ChipId, FeatureInfo, SubfeatureInfo};
use crate::error::NativeErrorCode;
use crate::quantity::{FeatureType, SubfeatureFlags, SubfeatureType};
use serde_json::{Map, Value};
use std::ffi::{c_int, CStr, CString};
use std::fs::File;
use std::io;
use tracing::{debug, trace};

/// Suffixes of subfeatures that are limits or settings rather than readings.
const WRITABLE_SUFFIXES: &[&str] = &[
    "min",
    "max",
    "lcrit",
    "crit",
    "max_hyst",
    "min_hyst",
    "crit_hyst",
    "lcrit_hyst",
    "emergency",
    "emergency_hyst",
    "offset",
    "beep",
    "div",
    "pulses",
    "cap",
    "cap_hyst",
    "type",
    "enable",
    "average_interval",
];

/// Wildcard value for addresses and bus numbers.
const ANY: c_int = -1;

/// Simulated backend reading `sensors -j` style JSON.
#[derive(Debug, Clone, Copy)]
pub struct Simulated;

/// Parsed simulated configuration.
#[derive(Debug)]
pub struct SimConfig {
    chips: Vec<SimChip>,
    adapters: Vec<(BusId, CString)>,
}

/// Simulated chip descriptor.
#[derive(Debug)]
pub struct SimChip {
    prefix: Option<CString>,
    bus: BusId,
    addr: c_int,
    path: CString,
    features: Vec<SimFeature>,
    subfeatures: Vec<SimSubfeature>,
}

/// Simulated feature descriptor.
#[derive(Debug)]
pub struct SimFeature {
    name: CString,
    label: String,
    number: c_int,
    kind: FeatureType,
    first_subfeature: usize,
}

/// Simulated subfeature descriptor.
#[derive(Debug)]
pub struct SimSubfeature {
    name: CString,
    number: c_int,
    kind: SubfeatureType,
    mapping: c_int,
    flags: SubfeatureFlags,
    value: Option<f64>,
}

impl SimConfig {
    /// Parse a `sensors -j` style document.
    ///
    /// # Errors
    ///
    /// Returns a negated `SENSORS_ERR_PARSE` for malformed documents and a
    /// negated `SENSORS_ERR_CHIP_NAME` for chip names that do not parse.
    pub fn parse(text: &str) -> Result<Self, c_int> {
        let mut config = Self {
            chips: Vec::new(),
            adapters: Vec::new(),
        };
        if text.trim().is_empty() {
            return Ok(config);
        }

        let root: Value = serde_json::from_str(text).map_err(|err| {
            debug!(%err, "simulated configuration is not valid JSON");
            NativeErrorCode::Parse.negated()
        })?;
        let chips = root.as_object().ok_or(NativeErrorCode::Parse.negated())?;

        for (index, (name, body)) in chips.iter().enumerate() {
            let body = body.as_object().ok_or(NativeErrorCode::Parse.negated())?;
            let (chip, adapter) = parse_chip(index, name, body)?;
            if let Some(adapter) = adapter {
                config.remember_adapter(chip.bus, &adapter)?;
            }
            config.chips.push(chip);
        }

        let fixed: Vec<_> = config
            .chips
            .iter()
            .filter_map(|chip| Some((chip.bus, chip.bus.bus_type()?.fixed_adapter_name()?)))
            .collect();
        for (bus, name) in fixed {
            if config.adapter(bus).is_none() {
                config.adapters.push((bus, cstring(name)?));
            }
        }
        Ok(config)
    }

    /// Number of chips in the configuration.
    #[must_use]
    pub fn chip_count(&self) -> usize {
        self.chips.len()
    }

    fn adapter(&self, bus: BusId) -> Option<&CStr> {
        self.adapters
            .iter()
            .find(|(known, _)| *known == bus)
            .map(|(_, name)| name.as_c_str())
    }

    /// Adapter names belong to a bus, so two chips on one bus must agree.
    fn remember_adapter(&mut self, bus: BusId, name: &str) -> Result<(), c_int> {
        let name = cstring(name)?;
        match self.adapter(bus) {
            Some(known) if known == name.as_c_str() => Ok(()),
            Some(known) => {
                debug!(?bus, known = ?known, conflicting = ?name, "conflicting adapter names");
                Err(NativeErrorCode::Parse.negated())
            }
            None => {
                self.adapters.push((bus, name));
                Ok(())
            }
        }
    }
}

fn cstring(text: &str) -> Result<CString, c_int> {
    CString::new(text).map_err(|_| NativeErrorCode::Parse.negated())
}

fn parse_chip(
    index: usize,
    name: &str,
    body: &Map<String, Value>,
) -> Result<(SimChip, Option<String>), c_int> {
    let parsed = parse_chip_name(name)?;
    let mut adapter = None;
    let mut path = None;
    let mut features = Vec::new();
    let mut subfeatures = Vec::new();

    for (key, value) in body {
        match key.as_str() {
            "Adapter" => {
                adapter = Some(value.as_str().ok_or(NativeErrorCode::Parse.negated())?.to_string());
            }
            "Path" => {
                path = Some(value.as_str().ok_or(NativeErrorCode::Parse.negated())?.to_string());
            }
            label => {
                let readings = value.as_object().ok_or(NativeErrorCode::Parse.negated())?;
                let number = c_int::try_from(features.len())
                    .map_err(|_| NativeErrorCode::Parse.negated())?;
                let feature = parse_feature(label, number, readings, &mut subfeatures)?;
                features.push(feature);
            }
        }
    }

    let path = path.unwrap_or_else(|| format!("/sys/class/hwmon/hwmon{index}"));
    let chip = SimChip {
        prefix: parsed.prefix.as_deref().map(cstring).transpose()?,
        bus: parsed.bus,
        addr: parsed.addr,
        path: cstring(&path)?,
        features,
        subfeatures,
    };
    trace!(name, features = chip.features.len(), "simulated chip");
    Ok((chip, adapter))
}

fn parse_feature(
    label: &str,
    number: c_int,
    readings: &Map<String, Value>,
    subfeatures: &mut Vec<SimSubfeature>,
) -> Result<SimFeature, c_int> {
    let first_name = readings.keys().next().ok_or(NativeErrorCode::Parse.negated())?;
    let (feature_name, _) = split_subfeature_name(first_name);
    let kind = FeatureType::from_feature_name(feature_name);
    let first_subfeature = subfeatures.len();

    for (name, value) in readings {
        let (owner, suffix) = split_subfeature_name(name);
        if owner != feature_name {
            return Err(NativeErrorCode::Parse.negated());
        }
        let value = match value {
            Value::Null => None,
            other => Some(other.as_f64().ok_or(NativeErrorCode::Parse.negated())?),
        };
        let sub_kind = SubfeatureType::from_suffix(kind, suffix);
        let mut flags = SubfeatureFlags::READABLE;
        if WRITABLE_SUFFIXES.contains(&suffix) {
            flags |= SubfeatureFlags::WRITABLE;
        }
        if !sub_kind.is_status() {
            flags |= SubfeatureFlags::COMPUTE_MAPPING;
        }
        subfeatures.push(SimSubfeature {
            name: cstring(name)?,
            number: c_int::try_from(subfeatures.len())
                .map_err(|_| NativeErrorCode::Parse.negated())?,
            kind: sub_kind,
            mapping: number,
            flags,
            value,
        });
    }

    Ok(SimFeature {
        name: cstring(feature_name)?,
        label: label.to_string(),
        number,
        kind,
        first_subfeature,
    })
}

/// Split `temp1_crit_alarm` into (`temp1`, `crit_alarm`).
///
/// VID and beep-enable subfeatures share their name with the feature.
fn split_subfeature_name(name: &str) -> (&str, &str) {
    if name == "beep_enable" {
        return (name, "enable");
    }
    if name.starts_with("cpu") && name.ends_with("_vid") {
        return (name, "vid");
    }
    name.split_once('_').unwrap_or((name, ""))
}

/// Chip name fields as libsensors stores them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChipName {
    /// Driver prefix, `None` for `*`.
    pub prefix: Option<String>,
    /// Bus identifier.
    pub bus: BusId,
    /// Address, `-1` for `*`.
    pub addr: c_int,
}

fn parse_wild(token: &str, radix: u32) -> Option<c_int> {
    if token == "*" {
        return Some(ANY);
    }
    c_int::from_str_radix(token, radix).ok()
}

/// Parse a chip name such as `coretemp-isa-0000` or `lm75-i2c-0-48`.
///
/// # Errors
///
/// Returns a negated `SENSORS_ERR_CHIP_NAME` if the name does not parse.
pub fn parse_chip_name(name: &str) -> Result<ParsedChipName, c_int> {
    let bad = NativeErrorCode::ChipName.negated();
    let tokens: Vec<&str> = name.split('-').collect();
    let n = tokens.len();

    let (prefix_len, bus, nr, addr) = if n >= 4
        && BusType::from_token(tokens[n - 3]).is_some_and(BusType::is_numbered)
    {
        let bus = BusType::from_token(tokens[n - 3]).ok_or(bad)?;
        let nr = parse_wild(tokens[n - 2], 10).ok_or(bad)?;
        (n - 3, bus, nr, tokens[n - 1])
    } else if n >= 3 {
        let bus = BusType::from_token(tokens[n - 2]).ok_or(bad)?;
        if bus.is_numbered() {
            return Err(bad);
        }
        let nr = if bus == BusType::Any { ANY } else { 0 };
        (n - 2, bus, nr, tokens[n - 1])
    } else {
        return Err(bad);
    };

    let prefix = tokens[..prefix_len].join("-");
    if prefix.is_empty() {
        return Err(bad);
    }
    Ok(ParsedChipName {
        prefix: (prefix != "*").then_some(prefix),
        bus: BusId {
            kind: bus.code(),
            nr: i16::try_from(nr).map_err(|_| bad)?,
        },
        addr: parse_wild(addr, 16).ok_or(bad)?,
    })
}

/// Render chip name fields the way `sensors_snprintf_chip_name` does.
///
/// # Errors
///
/// Returns a negated `SENSORS_ERR_WILDCARDS` if any field is a wildcard,
/// and a negated `SENSORS_ERR_CHIP_NAME` for an unknown bus type.
pub fn render_chip_name(prefix: Option<&str>, bus: BusId, addr: c_int) -> Result<String, c_int> {
    let wildcards = NativeErrorCode::Wildcards.negated();
    let prefix = prefix.ok_or(wildcards)?;
    let kind = bus.bus_type().ok_or(NativeErrorCode::ChipName.negated())?;
    if kind == BusType::Any || addr == ANY || (kind.is_numbered() && bus.nr == BusId::ANY_NR) {
        return Err(wildcards);
    }
    let nr = bus.nr;
    Ok(match kind {
        BusType::Isa | BusType::Pci => format!("{prefix}-{kind}-{addr:04x}"),
        BusType::I2c => format!("{prefix}-i2c-{nr}-{addr:02x}"),
        BusType::Spi | BusType::Hid | BusType::Scsi => format!("{prefix}-{kind}-{nr}-{addr:x}"),
        BusType::Virtual | BusType::Acpi | BusType::Mdio | BusType::Any => {
            format!("{prefix}-{kind}-{addr:x}")
        }
    })
}

fn step<'c, T>(items: &'c [T], nr: &mut c_int) -> Option<&'c T> {
    let item = items.get(usize::try_from(*nr).ok()?)?;
    *nr += 1;
    Some(item)
}

impl Backend for Simulated {
    type Config = SimConfig;
    type Chip = SimChip;
    type Feature = SimFeature;
    type Subfeature = SimSubfeature;

    fn version() -> &'static str {
        concat!("simulated ", env!("CARGO_PKG_VERSION"))
    }

    fn init(input: File) -> Result<SimConfig, c_int> {
        let text = io::read_to_string(input).map_err(|err| {
            debug!(%err, "reading simulated configuration failed");
            NativeErrorCode::Io.negated()
        })?;
        SimConfig::parse(&text)
    }

    fn detected_chip<'c>(config: &'c SimConfig, nr: &mut c_int) -> Option<&'c SimChip> {
        step(&config.chips, nr)
    }

    fn feature<'c>(
        _config: &'c SimConfig,
        chip: &'c SimChip,
        nr: &mut c_int,
    ) -> Option<&'c SimFeature> {
        step(&chip.features, nr)
    }

    fn subfeature<'c>(
        _config: &'c SimConfig,
        chip: &'c SimChip,
        feature: &'c SimFeature,
        nr: &mut c_int,
    ) -> Option<&'c SimSubfeature> {
        let offset = usize::try_from(*nr).ok()?;
        let sub = chip.subfeatures.get(feature.first_subfeature + offset)?;
        if sub.mapping != feature.number {
            return None;
        }
        *nr += 1;
        Some(sub)
    }

    fn chip_id(chip: &SimChip) -> ChipId<'_> {
        ChipId {
            prefix: chip.prefix.as_deref(),
            bus: chip.bus,
            addr: chip.addr,
            path: Some(chip.path.as_c_str()),
        }
    }

    fn adapter_name(config: &SimConfig, bus: BusId) -> Option<&CStr> {
        config.adapter(bus)
    }

    fn snprintf_chip_name(buf: &mut [u8], chip: &SimChip) -> c_int {
        let prefix = chip.prefix.as_deref().map(CStr::to_string_lossy);
        let rendered = match render_chip_name(prefix.as_deref(), chip.bus, chip.addr) {
            Ok(rendered) => rendered,
            Err(code) => return code,
        };
        let bytes = rendered.as_bytes();
        if let Some(room) = buf.len().checked_sub(1) {
            let n = bytes.len().min(room);
            buf[..n].copy_from_slice(&bytes[..n]);
            buf[n] = 0;
        }
        c_int::try_from(bytes.len()).unwrap_or(c_int::MAX)
    }

    fn feature_info(feature: &SimFeature) -> FeatureInfo<'_> {
        FeatureInfo {
            name: &feature.name,
            number: feature.number,
            kind: feature.kind,
        }
    }

    fn label(_config: &SimConfig, _chip: &SimChip, feature: &SimFeature) -> Option<String> {
        Some(feature.label.clone())
    }

    fn subfeature_info(subfeature: &SimSubfeature) -> SubfeatureInfo<'_> {
        SubfeatureInfo {
            name: &subfeature.name,
            number: subfeature.number,
            kind: subfeature.kind,
            mapping: subfeature.mapping,
            flags: subfeature.flags,
        }
    }

    fn value(_config: &SimConfig, chip: &SimChip, number: c_int) -> Result<f64, c_int> {
        let sub = chip
            .subfeatures
            .iter()
            .find(|sub| sub.number == number)
            .ok_or(NativeErrorCode::NoEntry.negated())?;
        sub.value.ok_or(NativeErrorCode::AccessRead.negated())
    }
}
