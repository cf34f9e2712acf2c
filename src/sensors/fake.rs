use super::{Quantity, SensorDriver};
use crate::{Error, Result};
use std::collections::VecDeque;

/// Sensor that replays a scripted sequence of results, then repeats the last one.
pub struct ScriptedSensor {
    name: &'static str,
    quantities: Vec<Quantity>,
    script: VecDeque<Result<f64>>,
    last: Option<f64>,
    reads: usize,
}

impl ScriptedSensor {
    pub fn new(name: &'static str, quantities: &[Quantity], script: Vec<Result<f64>>) -> Self {
        Self {
            name,
            quantities: quantities.to_vec(),
            script: script.into(),
            last: None,
            reads: 0,
        }
    }

    /// Always returns `value` for `quantity`.
    pub fn constant(quantity: Quantity, value: f64) -> Self {
        Self::new("scripted", &[quantity], vec![Ok(value)])
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl SensorDriver for ScriptedSensor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn quantities(&self) -> &[Quantity] {
        &self.quantities
    }

    fn read(&mut self, quantity: Quantity) -> Result<f64> {
        self.reads += 1;
        if !self.quantities.contains(&quantity) {
            return Err(Error::Sensor(format!("{} does not provide {quantity}", self.name)));
        }
        match self.script.pop_front() {
            Some(Ok(value)) => {
                self.last = Some(value);
                Ok(value)
            }
            Some(Err(err)) => Err(err),
            None => self
                .last
                .ok_or_else(|| Error::Sensor(format!("{} has nothing scripted", self.name))),
        }
    }
}
