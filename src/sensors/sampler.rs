use super::{Quantity, SensorDriver, NO_READING};
use crate::Millis;

/// Refresh cadence per sensor group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerIntervals {
    pub pm_ms: Millis,
    pub co2_ms: Millis,
    /// VOC and NOx.
    pub gas_ms: Millis,
    /// Temperature and humidity.
    pub climate_ms: Millis,
}

impl SamplerIntervals {
    pub fn for_quantity(&self, quantity: Quantity) -> Millis {
        match quantity {
            Quantity::Pm25 => self.pm_ms,
            Quantity::Co2 => self.co2_ms,
            Quantity::Voc | Quantity::Nox => self.gas_ms,
            Quantity::Temperature | Quantity::Humidity => self.climate_ms,
        }
    }
}

impl Default for SamplerIntervals {
    fn default() -> Self {
        Self {
            pm_ms: crate::config::DEFAULT_PM_INTERVAL_MS,
            co2_ms: crate::config::DEFAULT_CO2_INTERVAL_MS,
            gas_ms: crate::config::DEFAULT_GAS_INTERVAL_MS,
            climate_ms: crate::config::DEFAULT_CLIMATE_INTERVAL_MS,
        }
    }
}

/// Last known value of one quantity and its refresh schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    value: f64,
    last_refresh: Millis,
    interval: Millis,
    driver: Option<usize>,
}

impl SensorReading {
    fn new(interval: Millis) -> Self {
        Self {
            value: NO_READING,
            last_refresh: 0,
            interval,
            driver: None,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn last_refresh(&self) -> Millis {
        self.last_refresh
    }

    pub fn interval(&self) -> Millis {
        self.interval
    }

    fn is_due(&self, now: Millis) -> bool {
        now.saturating_sub(self.last_refresh) >= self.interval
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailure {
    pub quantity: Quantity,
    pub driver: &'static str,
    pub error: String,
}

/// What a single `refresh` call did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub updated: Vec<Quantity>,
    pub failures: Vec<RefreshFailure>,
}

impl RefreshReport {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.failures.is_empty()
    }
}

/// Copy of every reading plus the capability flags, taken once per render or scrape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    values: [f64; 6],
    present: [bool; 6],
}

impl Snapshot {
    pub fn value(&self, quantity: Quantity) -> f64 {
        self.values[quantity.index()]
    }

    /// True when a driver for the quantity is attached.
    pub fn has_sensor(&self, quantity: Quantity) -> bool {
        self.present[quantity.index()]
    }

    /// The value if a sensor is attached and has produced a reading.
    pub fn reading(&self, quantity: Quantity) -> Option<f64> {
        let value = self.value(quantity);
        (self.has_sensor(quantity) && value >= 0.0).then_some(value)
    }

    pub fn empty() -> Self {
        Self {
            values: [NO_READING; 6],
            present: [false; 6],
        }
    }

    pub fn with_reading(mut self, quantity: Quantity, value: f64) -> Self {
        self.values[quantity.index()] = value;
        self.present[quantity.index()] = true;
        self
    }
}

/// Keeps the latest value of every quantity, refreshing each on its own interval.
pub struct SensorSampler {
    readings: [SensorReading; 6],
    drivers: Vec<Box<dyn SensorDriver>>,
}

impl SensorSampler {
    pub fn new(intervals: SamplerIntervals) -> Self {
        Self {
            readings: Quantity::ALL.map(|q| SensorReading::new(intervals.for_quantity(q))),
            drivers: Vec::new(),
        }
    }

    /// Attach a driver. Quantities already served by an earlier driver stay with it.
    /// Returns the quantities this driver now serves.
    pub fn attach(&mut self, driver: Box<dyn SensorDriver>) -> Vec<Quantity> {
        let slot = self.drivers.len();
        let mut claimed = Vec::new();
        for &quantity in driver.quantities() {
            let reading = &mut self.readings[quantity.index()];
            if reading.driver.is_none() {
                reading.driver = Some(slot);
                claimed.push(quantity);
            }
        }
        if !claimed.is_empty() {
            self.drivers.push(driver);
        }
        claimed
    }

    /// Read every quantity whose interval has elapsed.
    ///
    /// A due quantity advances its schedule by exactly one interval whether the
    /// read succeeds or not; a failed read keeps the previous value.
    pub fn refresh(&mut self, now: Millis) -> RefreshReport {
        let mut report = RefreshReport::default();
        for quantity in Quantity::ALL {
            let reading = &mut self.readings[quantity.index()];
            let Some(slot) = reading.driver else {
                continue;
            };
            if !reading.is_due(now) {
                continue;
            }
            reading.last_refresh += reading.interval;

            let driver = &mut self.drivers[slot];
            match driver.read(quantity) {
                Ok(value) => {
                    reading.value = value;
                    report.updated.push(quantity);
                }
                Err(err) => report.failures.push(RefreshFailure {
                    quantity,
                    driver: driver.name(),
                    error: err.to_string(),
                }),
            }
        }
        report
    }

    pub fn reading(&self, quantity: Quantity) -> &SensorReading {
        &self.readings[quantity.index()]
    }

    pub fn has_sensor(&self, quantity: Quantity) -> bool {
        self.readings[quantity.index()].driver.is_some()
    }

    pub fn driver_names(&self) -> Vec<&'static str> {
        self.drivers.iter().map(|d| d.name()).collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            values: self.readings.clone().map(|r| r.value),
            present: self.readings.clone().map(|r| r.driver.is_some()),
        }
    }
}
