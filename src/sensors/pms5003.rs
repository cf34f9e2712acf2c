//! Plantower PMS5003 particulate sensor in passive (query) mode.

use super::{Quantity, SensorDriver};
use crate::{Error, Result};
use std::io::{Read, Write};

pub const BAUD: u32 = 9_600;
pub const FRAME_LEN: usize = 32;
const HEADER: [u8; 2] = [0x42, 0x4d];
const CMD_PASSIVE_MODE: [u8; 7] = [0x42, 0x4d, 0xe1, 0x00, 0x00, 0x01, 0x70];
const CMD_READ: [u8; 7] = [0x42, 0x4d, 0xe2, 0x00, 0x00, 0x01, 0x71];
/// Bytes skipped while hunting for a frame header before giving up.
const MAX_RESYNC_BYTES: usize = 64;

pub struct Pms5003<P> {
    port: P,
}

impl<P: Read + Write> Pms5003<P> {
    /// Switch the sensor to passive mode so it only answers read requests.
    pub fn new(mut port: P) -> Result<Self> {
        port.write_all(&CMD_PASSIVE_MODE)?;
        port.flush()?;
        Ok(Self { port })
    }

    /// Request a frame and return PM2.5 (atmospheric environment) in ug/m3.
    pub fn read_pm25(&mut self) -> Result<u16> {
        self.port.write_all(&CMD_READ)?;
        self.port.flush()?;
        let frame = self.read_frame()?;
        parse_frame(&frame)
    }

    fn read_frame(&mut self) -> Result<[u8; FRAME_LEN]> {
        let mut frame = [0u8; FRAME_LEN];
        let mut skipped = 0;
        // The passive-mode ack or stale bytes may precede the frame.
        loop {
            if skipped > MAX_RESYNC_BYTES {
                return Err(Error::Sensor("pms5003: no frame header".into()));
            }
            self.read_byte(&mut frame[0])?;
            if frame[0] != HEADER[0] {
                skipped += 1;
                continue;
            }
            self.read_byte(&mut frame[1])?;
            if frame[1] != HEADER[1] {
                skipped += 2;
                continue;
            }
            self.port.read_exact(&mut frame[2..4])?;
            let length = usize::from(u16::from_be_bytes([frame[2], frame[3]]));
            if length == FRAME_LEN - 4 {
                break;
            }
            // Command ack or other short frame: drop its body and keep looking.
            let mut body = vec![0u8; length.min(MAX_RESYNC_BYTES)];
            self.port.read_exact(&mut body)?;
            skipped += 4 + body.len();
        }
        self.port.read_exact(&mut frame[4..])?;
        Ok(frame)
    }

    fn read_byte(&mut self, out: &mut u8) -> Result<()> {
        let mut byte = [0u8; 1];
        self.port.read_exact(&mut byte)?;
        *out = byte[0];
        Ok(())
    }
}

/// Validate a 32-byte frame and extract the PM2.5 atmospheric value.
pub fn parse_frame(frame: &[u8; FRAME_LEN]) -> Result<u16> {
    if frame[..2] != HEADER {
        return Err(Error::Sensor("pms5003: bad frame header".into()));
    }
    let length = u16::from_be_bytes([frame[2], frame[3]]) as usize;
    if length != FRAME_LEN - 4 {
        return Err(Error::Sensor(format!(
            "pms5003: unexpected frame length {length}"
        )));
    }
    let expected = u16::from_be_bytes([frame[30], frame[31]]);
    let actual = frame[..30]
        .iter()
        .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)));
    if expected != actual {
        return Err(Error::Sensor(format!(
            "pms5003: checksum mismatch (expected {expected:#06x}, got {actual:#06x})"
        )));
    }
    Ok(u16::from_be_bytes([frame[12], frame[13]]))
}

impl<P: Read + Write> SensorDriver for Pms5003<P> {
    fn name(&self) -> &'static str {
        "pms5003"
    }

    fn quantities(&self) -> &[Quantity] {
        &[Quantity::Pm25]
    }

    fn read(&mut self, quantity: Quantity) -> Result<f64> {
        match quantity {
            Quantity::Pm25 => self.read_pm25().map(f64::from),
            other => Err(Error::Sensor(format!("pms5003 does not provide {other}"))),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sensors::uart::FakeUart;

    pub(crate) fn frame_with_pm25(pm25: u16) -> [u8; FRAME_LEN] {
        let mut frame = [0u8; FRAME_LEN];
        frame[..4].copy_from_slice(&[0x42, 0x4d, 0x00, 0x1c]);
        // Standard-particle values differ from the atmospheric ones on purpose.
        frame[6..8].copy_from_slice(&(pm25 + 7).to_be_bytes());
        frame[12..14].copy_from_slice(&pm25.to_be_bytes());
        let sum = frame[..30]
            .iter()
            .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)));
        frame[30..].copy_from_slice(&sum.to_be_bytes());
        frame
    }

    #[test]
    fn parses_atmospheric_pm25() {
        assert_eq!(parse_frame(&frame_with_pm25(23)).unwrap(), 23);
    }

    #[test]
    fn rejects_bad_checksum() {
        let mut frame = frame_with_pm25(23);
        frame[13] ^= 0x01;
        let err = parse_frame(&frame).unwrap_err();
        assert!(format!("{err}").contains("checksum"));
    }

    #[test]
    fn rejects_bad_length() {
        let mut frame = frame_with_pm25(5);
        frame[3] = 0x14;
        assert!(parse_frame(&frame).is_err());
    }

    #[test]
    fn enters_passive_mode_then_queries() {
        let mut reply = vec![0x42, 0x4d, 0x00, 0x04, 0xe1, 0x00, 0x01, 0x74];
        reply.extend_from_slice(&frame_with_pm25(42));
        let mut sensor = Pms5003::new(FakeUart::new(reply)).unwrap();
        assert_eq!(sensor.read(Quantity::Pm25).unwrap(), 42.0);

        let written = sensor.port.written();
        assert_eq!(&written[..7], &CMD_PASSIVE_MODE);
        assert_eq!(&written[7..], &CMD_READ);
    }

    #[test]
    fn skips_garbage_before_header() {
        let mut reply = vec![0x00, 0x42, 0x11, 0xff];
        reply.extend_from_slice(&frame_with_pm25(9));
        let mut sensor = Pms5003::new(FakeUart::new(reply)).unwrap();
        assert_eq!(sensor.read_pm25().unwrap(), 9);
    }

    #[test]
    fn short_reply_is_an_error() {
        let mut sensor = Pms5003::new(FakeUart::new(vec![0x42, 0x4d, 0x00])).unwrap();
        assert!(sensor.read(Quantity::Pm25).is_err());
    }
}
