use crate::{Error, Result};
use serialport::{DataBits, FlowControl, Parity, StopBits};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::time::Duration;

/// Read timeout for sensor UARTs; a sensor that misses it counts as a failed read.
pub const READ_TIMEOUT_MS: u64 = 500;

/// Open a sensor UART as 8N1 without flow control.
pub fn open(device: &str, baud: u32) -> Result<Box<dyn serialport::SerialPort>> {
    if device.is_empty() {
        return Err(Error::InvalidArgs("device path cannot be empty".to_string()));
    }

    serialport::new(device, baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(Duration::from_millis(READ_TIMEOUT_MS))
        .open()
        .map_err(map_serial_error)
}

fn map_serial_error(err: serialport::Error) -> Error {
    use serialport::ErrorKind;

    let kind = match err.kind() {
        ErrorKind::NoDevice => io::ErrorKind::NotFound,
        ErrorKind::InvalidInput => io::ErrorKind::InvalidInput,
        ErrorKind::Io(inner) => inner,
        ErrorKind::Unknown => io::ErrorKind::Other,
    };

    Error::Io(io::Error::new(kind, err))
}

/// In-memory UART: reads drain a scripted reply, writes are recorded.
#[derive(Debug, Default)]
pub struct FakeUart {
    reply: VecDeque<u8>,
    written: Vec<u8>,
}

impl FakeUart {
    pub fn new(reply: Vec<u8>) -> Self {
        Self {
            reply: reply.into(),
            written: Vec::new(),
        }
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }
}

impl Read for FakeUart {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.reply.is_empty() && !buf.is_empty() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "fake uart drained"));
        }
        let n = buf.len().min(self.reply.len());
        for (slot, byte) in buf.iter_mut().zip(self.reply.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for FakeUart {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
