//! Sensors JSON Dump Example
//!
//! Walks every chip, feature and subfeature and prints them as one JSON
//! document, similar to `sensors -j`.
//!
//! Run with: cargo run --example `sensors_json` -- tests/fixtures/desktop.json
//!
//! With `--features libsensors` and no argument, the system configuration is
//! read through libsensors. Set `RUST_LOG=lmsensors=trace` to watch the
//! identity cache at work.

use lmsensors::{Backend, Sensors};
use serde_json::{json, Map, Value};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn dump<B: Backend>(sensors: &Sensors<B>) -> lmsensors::Result<Value> {
    let mut chips = Map::new();
    for chip in sensors {
        let mut body = Map::new();
        if let Some(adapter) = chip.adapter() {
            body.insert("Adapter".into(), Value::from(adapter.into_owned()));
        }
        for feature in &chip {
            let mut readings = Map::new();
            let label = feature.label()?;
            if label != feature.name() {
                readings.insert("label".into(), Value::from(label));
            }
            for sub in &feature {
                let mut entry = Map::new();
                entry.insert("quantity".into(), Value::from(sub.quantity_name().into_owned()));
                let unit = sub.unit();
                if !unit.is_empty() {
                    entry.insert("unit".into(), Value::from(unit.into_owned()));
                }
                let value = sub.value().map_or(Value::Null, Value::from);
                entry.insert("value".into(), value);
                readings.insert(sub.name().into_owned(), Value::Object(entry));
            }
            body.insert(feature.name().into_owned(), Value::Object(readings));
        }
        chips.insert(chip.name()?, Value::Object(body));
    }
    Ok(json!(chips))
}

#[cfg(feature = "libsensors")]
fn run(path: Option<String>) -> lmsensors::Result<Value> {
    let sensors = match path {
        Some(path) => lmsensors::System::open(path)?,
        None => lmsensors::System::open_default()?,
    };
    dump(&sensors)
}

#[cfg(not(feature = "libsensors"))]
fn run(path: Option<String>) -> lmsensors::Result<Value> {
    let path = path.unwrap_or_else(|| "tests/fixtures/desktop.json".to_string());
    let sensors = Sensors::<lmsensors::Simulated>::open(path)?;
    dump(&sensors)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(std::env::args().nth(1)) {
        Ok(doc) => {
            println!("{doc:#}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("sensors_json: {err}");
            ExitCode::FAILURE
        }
    }
}
