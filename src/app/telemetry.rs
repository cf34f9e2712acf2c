use crate::sensors::{Quantity, RefreshFailure};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Serialize)]
struct SensorEvent<'a> {
    ts_ms: u128,
    event: &'static str,
    quantity: &'static str,
    driver: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// JSON-lines sink for sensor health transitions. Disabled when no path is configured.
///
/// A quantity that keeps failing is written once, when it starts failing, and once more
/// when it next reads successfully.
pub struct Telemetry {
    sink: Option<Box<dyn Write>>,
    failing: [Option<&'static str>; 6],
}

impl Telemetry {
    pub fn disabled() -> Self {
        Self {
            sink: None,
            failing: [None; 6],
        }
    }

    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file: File = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self::to_writer(Box::new(file)))
    }

    pub fn to_writer(sink: Box<dyn Write>) -> Self {
        Self {
            sink: Some(sink),
            failing: [None; 6],
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn record_failure(&mut self, failure: &RefreshFailure) -> io::Result<()> {
        let slot = &mut self.failing[failure.quantity.index()];
        if slot.is_some() {
            return Ok(());
        }
        *slot = Some(failure.driver);
        self.write(SensorEvent {
            ts_ms: now_ms(),
            event: "sensor_failure",
            quantity: failure.quantity.as_str(),
            driver: failure.driver,
            error: Some(failure.error.as_str()),
        })
    }

    /// Note a successful read; writes a line only if `quantity` was failing.
    pub fn record_recovery(&mut self, quantity: Quantity) -> io::Result<()> {
        let Some(driver) = self.failing[quantity.index()].take() else {
            return Ok(());
        };
        self.write(SensorEvent {
            ts_ms: now_ms(),
            event: "sensor_recovered",
            quantity: quantity.as_str(),
            driver,
            error: None,
        })
    }

    fn write(&mut self, event: SensorEvent<'_>) -> io::Result<()> {
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };
        let line = serde_json::to_string(&event).map_err(io::Error::other)?;
        writeln!(sink, "{line}")?;
        sink.flush()
    }
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
