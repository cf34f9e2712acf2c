//! Bus plumbing shared by the I2C sensors and the OLED panel.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

/// Blocking delay backed by `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

/// Open `/dev/i2c-<bus>`.
#[cfg(target_os = "linux")]
pub fn open_i2c(bus: u8) -> crate::Result<rppal::i2c::I2c> {
    rppal::i2c::I2c::with_bus(bus).map_err(|e| {
        crate::Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("i2c bus {bus}: {e}"),
        ))
    })
}

/// Scripted I2C bus: reads pop queued replies, writes are recorded per address.
#[derive(Debug, Default)]
pub struct FakeI2c {
    replies: VecDeque<Vec<u8>>,
    writes: Vec<(u8, Vec<u8>)>,
    absent: bool,
}

impl FakeI2c {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus where no device acknowledges.
    pub fn absent() -> Self {
        Self {
            absent: true,
            ..Self::default()
        }
    }

    pub fn queue_reply(&mut self, bytes: &[u8]) {
        self.replies.push_back(bytes.to_vec());
    }

    pub fn writes(&self) -> &[(u8, Vec<u8>)] {
        &self.writes
    }
}

impl ErrorType for FakeI2c {
    type Error = ErrorKind;
}

impl I2c for FakeI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> std::result::Result<(), Self::Error> {
        if self.absent {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                Operation::Read(buf) => {
                    let reply = self.replies.pop_front().ok_or(ErrorKind::Other)?;
                    if reply.len() != buf.len() {
                        return Err(ErrorKind::Other);
                    }
                    buf.copy_from_slice(&reply);
                }
            }
        }
        Ok(())
    }
}
