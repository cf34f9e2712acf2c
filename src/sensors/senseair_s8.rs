//! SenseAir S8 CO2 sensor over Modbus RTU.

use super::{Quantity, SensorDriver};
use crate::{Error, Result};
use std::io::{Read, Write};

pub const BAUD: u32 = 9_600;
/// Read input register 3 (CO2 ppm) from the "any address" slave.
const READ_CO2: [u8; 8] = [0xfe, 0x04, 0x00, 0x03, 0x00, 0x01, 0xd5, 0xc5];
const RESPONSE_LEN: usize = 7;

pub struct SenseairS8<P> {
    port: P,
}

impl<P: Read + Write> SenseairS8<P> {
    pub fn new(port: P) -> Self {
        Self { port }
    }

    pub fn read_co2(&mut self) -> Result<u16> {
        self.port.write_all(&READ_CO2)?;
        self.port.flush()?;
        let mut response = [0u8; RESPONSE_LEN];
        self.port.read_exact(&mut response)?;
        parse_response(&response)
    }
}

pub fn parse_response(response: &[u8; RESPONSE_LEN]) -> Result<u16> {
    let expected = u16::from_le_bytes([response[5], response[6]]);
    let actual = crc16_modbus(&response[..5]);
    if expected != actual {
        return Err(Error::Sensor(format!(
            "senseair_s8: crc mismatch (expected {expected:#06x}, got {actual:#06x})"
        )));
    }
    if response[0] != 0xfe || response[1] != 0x04 || response[2] != 0x02 {
        return Err(Error::Sensor(format!(
            "senseair_s8: unexpected reply {:02x} {:02x} {:02x}",
            response[0], response[1], response[2]
        )));
    }
    Ok(u16::from_be_bytes([response[3], response[4]]))
}

/// CRC-16/MODBUS (reflected 0x8005, init 0xffff).
pub fn crc16_modbus(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xffff;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xa001 } else { crc >> 1 };
        }
    }
    crc
}

impl<P: Read + Write> SensorDriver for SenseairS8<P> {
    fn name(&self) -> &'static str {
        "senseair_s8"
    }

    fn quantities(&self) -> &[Quantity] {
        &[Quantity::Co2]
    }

    fn read(&mut self, quantity: Quantity) -> Result<f64> {
        match quantity {
            Quantity::Co2 => self.read_co2().map(f64::from),
            other => Err(Error::Sensor(format!("senseair_s8 does not provide {other}"))),
        }
    }
}
