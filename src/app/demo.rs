use crate::sensors::{Quantity, SensorDriver};
use crate::{Error, Result};

/// Baseline and swing for each simulated quantity, indexed by `Quantity::index`.
const WAVES: [(f64, f64); 6] = [
    (18.0, 14.0), // pm25
    (650.0, 250.0), // co2
    (100.0, 40.0), // voc
    (1.0, 1.0), // nox
    (21.5, 2.5), // temperature
    (45.0, 10.0), // humidity
];

/// Readings per full waveform period.
const PERIOD: u32 = 48;

/// Serves every quantity from a slow triangle wave so the screens and metrics move.
pub struct SimulatedSensor {
    steps: [u32; 6],
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self { steps: [0; 6] }
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorDriver for SimulatedSensor {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn quantities(&self) -> &[Quantity] {
        &Quantity::ALL
    }

    fn read(&mut self, quantity: Quantity) -> Result<f64> {
        let idx = quantity.index();
        let (base, swing) = WAVES
            .get(idx)
            .copied()
            .ok_or_else(|| Error::Sensor(format!("simulated: no waveform for {quantity}")))?;
        let step = self.steps[idx];
        self.steps[idx] = (step + 1) % PERIOD;
        Ok(base + swing * triangle(step))
    }
}

/// Triangle wave in -1.0..=1.0 over `PERIOD` steps.
fn triangle(step: u32) -> f64 {
    let half = f64::from(PERIOD / 2);
    let pos = f64::from(step % PERIOD);
    if pos < half {
        -1.0 + 2.0 * pos / half
    } else {
        1.0 - 2.0 * (pos - half) / half
    }
}
