//! Sensor quantities, the driver seam, and the interval-gated sampler.

use crate::Result;
use std::fmt;

pub mod aqi;
pub mod fake;
pub mod pms5003;
pub mod sampler;
pub mod senseair_s8;
pub mod sht3x;
pub mod uart;

pub use aqi::pm_to_aqi;
pub use sampler::{
    RefreshFailure, RefreshReport, SamplerIntervals, SensorReading, SensorSampler, Snapshot,
};

/// Value held by a reading until its first successful acquisition.
pub const NO_READING: f64 = -1.0;

/// Every quantity the node measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    /// PM2.5 mass concentration, ug/m3.
    Pm25,
    /// CO2, ppm.
    Co2,
    /// VOC index (1..500).
    Voc,
    /// NOx index (1..500).
    Nox,
    /// Degrees Celsius.
    Temperature,
    /// Relative humidity, percent.
    Humidity,
}

impl Quantity {
    pub const ALL: [Quantity; 6] = [
        Quantity::Pm25,
        Quantity::Co2,
        Quantity::Voc,
        Quantity::Nox,
        Quantity::Temperature,
        Quantity::Humidity,
    ];

    pub fn index(self) -> usize {
        match self {
            Quantity::Pm25 => 0,
            Quantity::Co2 => 1,
            Quantity::Voc => 2,
            Quantity::Nox => 3,
            Quantity::Temperature => 4,
            Quantity::Humidity => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Quantity::Pm25 => "pm25",
            Quantity::Co2 => "co2",
            Quantity::Voc => "voc",
            Quantity::Nox => "nox",
            Quantity::Temperature => "temperature",
            Quantity::Humidity => "humidity",
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A blocking acquisition source for one or more quantities.
///
/// Reads are expected to finish within a few hundred milliseconds; the sampler
/// calls them from the polling loop.
pub trait SensorDriver {
    fn name(&self) -> &'static str;

    /// Quantities this driver can produce. Must not change after construction.
    fn quantities(&self) -> &[Quantity];

    fn read(&mut self, quantity: Quantity) -> Result<f64>;
}
