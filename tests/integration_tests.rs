//! Integration tests for lmsensors.
//!
//! These tests drive the public API against the simulated backend, using the
//! configuration files under `tests/fixtures/`.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use lmsensors::{
    BusType, Chip, Error, FeatureType, Quantity, Sensors, Simulated, Subfeature, VERSION,
};
use std::collections::HashSet;
use std::io::Write;
use std::ops::ControlFlow;
use std::path::PathBuf;
use tempfile::NamedTempFile;

type Sim = Sensors<Simulated>;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn desktop() -> Sim {
    Sim::open(fixture("desktop.json")).expect("desktop fixture parses")
}

fn temp_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

fn chip_named(sensors: &Sim, name: &str) -> Chip<Simulated> {
    sensors
        .chips()
        .find(|chip| chip.name().is_ok_and(|n| n == name))
        .unwrap_or_else(|| unreachable!("no chip {name}"))
}

fn all_subfeatures(sensors: &Sim) -> Vec<Subfeature<Simulated>> {
    sensors
        .chips()
        .flat_map(|chip| chip.features())
        .flat_map(|feature| feature.subfeatures())
        .collect()
}

// =============================================================================
// Library-level tests
// =============================================================================

#[test]
fn test_version_semver_format() {
    let parts: Vec<&str> = VERSION.split('.').collect();
    assert!(parts.len() >= 2, "Version should have at least major.minor");
    for part in &parts {
        assert!(
            part.parse::<u32>().is_ok(),
            "Version parts should be numeric"
        );
    }
}

#[test]
fn test_backend_version_is_static() {
    assert!(!Sim::version().is_empty());
}

// =============================================================================
// Initialization
// =============================================================================

#[test]
fn test_single_initialization() {
    let sensors = desktop();
    let before: Vec<_> = sensors.chips().map(|c| c.path().into_owned()).collect();

    let err = sensors.initialize(fixture("faulty.json")).unwrap_err();
    assert!(err.is_state());

    let after: Vec<_> = sensors.chips().map(|c| c.path().into_owned()).collect();
    assert_eq!(before, after);
}

#[test]
fn test_missing_file_then_valid_file() {
    let sensors = Sim::new();
    let err = sensors.initialize("/nonexistent/path").unwrap_err();
    match &err {
        Error::Io { path, kind, .. } => {
            assert_eq!(path, &PathBuf::from("/nonexistent/path"));
            assert_eq!(*kind, std::io::ErrorKind::NotFound);
        }
        other => unreachable!("expected Io, got {other:?}"),
    }
    assert!(!sensors.is_initialized());

    sensors.initialize(fixture("desktop.json")).unwrap();
    assert!(sensors.is_initialized());
}

#[test]
fn test_initialize_is_fluent() {
    let sensors = Sim::new();
    let count = sensors
        .initialize(fixture("desktop.json"))
        .unwrap()
        .chips()
        .count();
    assert_eq!(count, 5);
}

#[test]
fn test_rejected_configuration() {
    let err = Sim::open(fixture("invalid.conf")).unwrap_err();
    assert!(err.is_config());
    assert_eq!(err.error_code(), Some(-8));
}

#[test]
fn test_empty_configuration_has_no_chips() {
    let sensors = Sim::open(fixture("empty.json")).unwrap();
    assert!(sensors.is_initialized());
    assert_eq!(sensors.chips().count(), 0);
}

#[test]
fn test_uninitialized_handle_enumerates_nothing() {
    let sensors = Sim::new();
    assert_eq!((&sensors).into_iter().count(), 0);
    assert_eq!(sensors.for_each_chip(|_| ControlFlow::Break(())), ControlFlow::Continue(()));
}

// =============================================================================
// Identity
// =============================================================================

#[test]
fn test_identity_stability_across_passes() {
    let sensors = desktop();
    let first = all_subfeatures(&sensors);
    let second = all_subfeatures(&sensors);
    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a, b);
    }

    let chips_a: Vec<_> = sensors.chips().collect();
    let chips_b: Vec<_> = sensors.chips().collect();
    assert_eq!(chips_a, chips_b);
}

#[test]
fn test_wrappers_are_distinct_per_pointer() {
    let sensors = desktop();
    let subs = all_subfeatures(&sensors);
    let unique: HashSet<_> = subs.iter().cloned().collect();
    assert_eq!(unique.len(), subs.len());
}

#[test]
fn test_fresh_wrappers_after_release_expose_same_values() {
    let sensors = desktop();
    let describe = |sensors: &Sim| -> Vec<(String, String, String)> {
        sensors
            .chips()
            .flat_map(|chip| {
                let name = chip.name().unwrap();
                chip.features()
                    .flat_map(|f| f.subfeatures())
                    .map(move |s| (name.clone(), s.feature().label().unwrap(), s.name().into_owned()))
                    .collect::<Vec<_>>()
            })
            .collect()
    };

    let first = describe(&sensors);
    assert_eq!(sensors.live_chips(), 0);
    let second = describe(&sensors);
    assert_eq!(first, second);
}

#[test]
fn test_cache_miss_after_collection() {
    let sensors = desktop();
    let chip = sensors.chips().next().unwrap();
    let feature = chip.features().next().unwrap();
    assert_eq!(chip.live_features(), 1);

    drop(feature);
    assert_eq!(chip.live_features(), 0);

    let again = chip.features().next().unwrap();
    assert_eq!(again.label().unwrap(), "Package id 0");
    assert_eq!(chip.live_features(), 1);
}

#[test]
fn test_parent_accessors_return_cached_wrappers() {
    let sensors = desktop();
    let chip = chip_named(&sensors, "nct6775-isa-0290");
    for feature in &chip {
        assert_eq!(feature.chip(), chip);
        for sub in &feature {
            assert_eq!(sub.feature(), feature);
        }
    }
}

// =============================================================================
// Reachability
// =============================================================================

#[test]
fn test_subfeature_keeps_ancestors_alive() {
    let sub = {
        let sensors = desktop();
        let chip = chip_named(&sensors, "coretemp-isa-0000");
        let feature = chip.features().nth(1).unwrap();
        feature.subfeatures().next().unwrap()
    };
    assert_eq!(sub.name(), "temp2_input");
    assert!((sub.value().unwrap() - 43.0).abs() < f64::EPSILON);
    assert_eq!(sub.feature().label().unwrap(), "Core 0");
    assert_eq!(sub.feature().chip().name().unwrap(), "coretemp-isa-0000");
}

#[test]
fn test_iterator_keeps_configuration_alive() {
    let mut chips = desktop().chips();
    let first = chips.next().unwrap();
    assert_eq!(first.name().unwrap(), "coretemp-isa-0000");
    assert_eq!(chips.count(), 4);
}

// =============================================================================
// Enumeration
// =============================================================================

#[test]
fn test_enumeration_determinism() {
    let sensors = desktop();
    let paths = |s: &Sim| s.chips().map(|c| c.path().into_owned()).collect::<Vec<_>>();
    let first = paths(&sensors);
    let second = paths(&sensors);
    assert_eq!(first, second);
    assert_eq!(first[0], "/sys/devices/platform/coretemp.0/hwmon/hwmon3");
    assert_eq!(first[1], "/sys/class/hwmon/hwmon1");
}

#[test]
fn test_push_and_pull_agree() {
    let sensors = desktop();
    let pulled: Vec<_> = sensors.chips().collect();
    let mut pushed = Vec::new();
    let flow = sensors.for_each_chip(|chip| {
        pushed.push(chip.clone());
        ControlFlow::Continue(())
    });
    assert_eq!(flow, ControlFlow::Continue(()));
    assert_eq!(pulled, pushed);
}

#[test]
fn test_push_stops_early() {
    let sensors = desktop();
    let chip = chip_named(&sensors, "nct6775-isa-0290");
    let mut visited = 0;
    let flow = chip.for_each_feature(|feature| {
        visited += 1;
        if feature.kind() == FeatureType::Fan {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    assert_eq!(flow, ControlFlow::Break(()));
    assert_eq!(visited, 2);
}

#[test]
fn test_feature_and_subfeature_counts() {
    let sensors = desktop();
    let counts: Vec<_> = sensors
        .chips()
        .map(|chip| (chip.features().count(), chip.features().flat_map(|f| f.subfeatures()).count()))
        .collect();
    assert_eq!(counts, [(3, 12), (6, 16), (1, 2), (1, 5), (2, 2)]);
}

// =============================================================================
// Round trip
// =============================================================================

#[test]
fn test_round_trip_coretemp() {
    let file = temp_config(r#"{"coretemp-isa-0000": {"temp1": {"temp1_input": 45.0}}}"#);
    let sensors = Sim::open(file.path()).unwrap();

    let chips: Vec<_> = sensors.chips().collect();
    assert_eq!(chips.len(), 1);
    assert!(chips[0].name().unwrap().contains("coretemp-isa-0000"));

    let features: Vec<_> = chips[0].features().collect();
    assert_eq!(features.len(), 1);
    assert!(!features[0].label().unwrap().is_empty());

    let subs: Vec<_> = features[0].subfeatures().collect();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].quantity_name(), "temperature");
    assert!((subs[0].value().unwrap() - 45.0).abs() < f64::EPSILON);
    assert_eq!(subs[0].unit(), "°C");
}

// =============================================================================
// Accessors
// =============================================================================

#[test]
fn test_chip_accessors() {
    let sensors = desktop();
    let nvme = chip_named(&sensors, "nvme-pci-0100");
    assert_eq!(nvme.bus_type(), Some(BusType::Pci));
    assert_eq!(nvme.address(), 0x100);
    assert_eq!(nvme.adapter().as_deref(), Some("PCI adapter"));

    let battery = chip_named(&sensors, "BAT0-acpi-0");
    assert_eq!(battery.prefix().as_deref(), Some("BAT0"));
    assert_eq!(battery.adapter().as_deref(), Some("ACPI interface"));
}

#[test]
fn test_feature_kinds() {
    let sensors = desktop();
    let chip = chip_named(&sensors, "nct6775-isa-0290");
    let kinds: Vec<_> = chip.features().map(|f| f.kind()).collect();
    assert_eq!(
        kinds,
        [
            FeatureType::Voltage,
            FeatureType::Fan,
            FeatureType::Temperature,
            FeatureType::Vid,
            FeatureType::Intrusion,
            FeatureType::BeepEnable,
        ]
    );
    let names: Vec<_> = chip.features().map(|f| f.name().into_owned()).collect();
    assert_eq!(names[3], "cpu0_vid");
    assert_eq!(names[5], "beep_enable");
}

#[test]
fn test_units_per_quantity() {
    let sensors = desktop();
    let units: Vec<_> = chip_named(&sensors, "nct6775-isa-0290")
        .features()
        .map(|f| {
            let main = f.subfeatures().next().unwrap();
            (main.name().into_owned(), main.quantity(), main.unit().into_owned())
        })
        .collect();
    assert_eq!(units[0], ("in0_input".into(), Quantity::Voltage, "V".into()));
    assert_eq!(units[1], ("fan2_input".into(), Quantity::FanSpeed, "RPM".into()));
    assert_eq!(units[2], ("temp1_input".into(), Quantity::Temperature, "°C".into()));
    assert_eq!(units[3], ("cpu0_vid".into(), Quantity::Voltage, "V".into()));
}

#[test]
fn test_conflicting_adapters_reject_configuration() {
    let file = temp_config(
        r#"{
            "it8728-isa-0a30": {"Adapter": "Custom ISA bridge"},
            "nct6775-isa-0290": {"Adapter": "ISA adapter"}
        }"#,
    );
    let err = Sim::open(file.path()).unwrap_err();
    assert!(err.is_config());
    assert_eq!(err.error_code(), Some(-8));
}

#[test]
fn test_special_status_quantities() {
    let sensors = desktop();
    let chip = chip_named(&sensors, "nct6775-isa-0290");
    let find = |name: &str| {
        chip.features()
            .flat_map(|f| f.subfeatures())
            .find(|s| s.name() == name)
            .unwrap()
    };
    assert_eq!(find("fan2_pulses").quantity(), Quantity::Count);
    assert_eq!(find("temp1_type").quantity(), Quantity::SensorType);
    assert_eq!(find("temp1_offset").quantity(), Quantity::Temperature);
    assert_eq!(find("in0_alarm").quantity(), Quantity::Status);
    assert!(find("in0_max").is_writable());
    assert!(!find("in0_input").is_writable());
}

#[test]
fn test_negative_values() {
    let sensors = desktop();
    let nvme = chip_named(&sensors, "nvme-pci-0100");
    let min = nvme
        .features()
        .flat_map(|f| f.subfeatures())
        .find(|s| s.name() == "temp1_min")
        .unwrap();
    assert!((min.value().unwrap() + 273.15).abs() < 1e-9);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_read_failure_surfaces() {
    let sensors = Sim::open(fixture("faulty.json")).unwrap();
    let chip = chip_named(&sensors, "lm75-i2c-1-48");
    assert_eq!(chip.adapter(), None);

    let input = chip.features().next().unwrap().subfeatures().next().unwrap();
    match input.value().unwrap_err() {
        Error::Read {
            subfeature, code, ..
        } => {
            assert_eq!(subfeature, "temp1_input");
            assert_eq!(code, -3);
        }
        other => unreachable!("expected Read, got {other:?}"),
    }
}

#[test]
fn test_wildcard_chip_name_fails() {
    let sensors = Sim::open(fixture("faulty.json")).unwrap();
    let wild = sensors.chips().nth(1).unwrap();
    let err = wild.name().unwrap_err();
    assert!(err.is_format());
    assert_eq!(err.error_code(), Some(-1));

    // The chip is still usable apart from its name.
    let fan = wild.features().next().unwrap();
    assert_eq!(fan.kind(), FeatureType::Fan);
    assert!((fan.subfeatures().next().unwrap().value().unwrap() - 900.0).abs() < f64::EPSILON);
}
