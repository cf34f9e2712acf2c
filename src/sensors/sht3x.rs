//! Sensirion SHT3x temperature and humidity sensor.

use super::{Quantity, SensorDriver};
use crate::{Error, Result};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};

pub const DEFAULT_ADDR: u8 = 0x44;
/// Single shot, high repeatability, no clock stretching.
const CMD_MEASURE: [u8; 2] = [0x24, 0x00];
const MEASURE_MS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub celsius: f64,
    pub humidity: f64,
}

pub struct Sht3x<I2C, D> {
    i2c: I2C,
    delay: D,
    addr: u8,
    // Humidity from the last temperature read, handed out on the next humidity read.
    pending_humidity: Option<f64>,
}

impl<I2C: I2c, D: DelayNs> Sht3x<I2C, D> {
    pub fn new(i2c: I2C, delay: D, addr: u8) -> Self {
        Self {
            i2c,
            delay,
            addr,
            pending_humidity: None,
        }
    }

    pub fn measure(&mut self) -> Result<Measurement> {
        self.i2c
            .write(self.addr, &CMD_MEASURE)
            .map_err(|e| Error::Sensor(format!("sht3x write: {:?}", e.kind())))?;
        self.delay.delay_ms(MEASURE_MS);
        let mut raw = [0u8; 6];
        self.i2c
            .read(self.addr, &mut raw)
            .map_err(|e| Error::Sensor(format!("sht3x read: {:?}", e.kind())))?;
        decode(&raw)
    }
}

/// Check both CRC-protected words and convert them to physical units.
pub fn decode(raw: &[u8; 6]) -> Result<Measurement> {
    let word = |chunk: &[u8]| -> Result<u16> {
        if crc8(&chunk[..2]) != chunk[2] {
            return Err(Error::Sensor("sht3x: crc mismatch".into()));
        }
        Ok(u16::from_be_bytes([chunk[0], chunk[1]]))
    };
    let t = f64::from(word(&raw[..3])?);
    let rh = f64::from(word(&raw[3..])?);
    Ok(Measurement {
        celsius: -45.0 + 175.0 * t / 65535.0,
        humidity: (100.0 * rh / 65535.0).clamp(0.0, 100.0),
    })
}

/// CRC-8, polynomial 0x31, init 0xff.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xff;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x31 } else { crc << 1 };
        }
    }
    crc
}

impl<I2C: I2c, D: DelayNs> SensorDriver for Sht3x<I2C, D> {
    fn name(&self) -> &'static str {
        "sht3x"
    }

    fn quantities(&self) -> &[Quantity] {
        &[Quantity::Temperature, Quantity::Humidity]
    }

    fn read(&mut self, quantity: Quantity) -> Result<f64> {
        match quantity {
            Quantity::Temperature => {
                let m = self.measure()?;
                self.pending_humidity = Some(m.humidity);
                Ok(m.celsius)
            }
            Quantity::Humidity => match self.pending_humidity.take() {
                Some(h) => Ok(h),
                None => self.measure().map(|m| m.humidity),
            },
            other => Err(Error::Sensor(format!("sht3x does not provide {other}"))),
        }
    }
}
