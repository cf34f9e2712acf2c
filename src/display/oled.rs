//! SSD1306 128x64 OLED over I2C.

use super::{frame, Frame, Panel};
use crate::{Error, Result};
use embedded_hal::i2c::I2c;
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};

type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

pub struct OledPanel<I2C> {
    display: Display<I2C>,
}

impl<I2C: I2c> OledPanel<I2C> {
    pub fn new(i2c: I2C, addr: u8) -> Result<Self> {
        let interface = I2CDisplayInterface::new_custom_address(i2c, addr);
        let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        display
            .init()
            .map_err(|e| Error::Display(format!("ssd1306 init at {addr:#04x}: {e:?}")))?;
        Ok(Self { display })
    }
}

impl<I2C: I2c> Panel for OledPanel<I2C> {
    fn name(&self) -> &'static str {
        "ssd1306"
    }

    fn show(&mut self, frame: &Frame) -> Result<()> {
        self.display.clear_buffer();
        for y in 0..frame::HEIGHT {
            for x in 0..frame::WIDTH {
                if frame.pixel(x, y) {
                    self.display.set_pixel(x, y, true);
                }
            }
        }
        self.display
            .flush()
            .map_err(|e| Error::Display(format!("ssd1306 flush: {e:?}")))
    }
}

/// Open and initialize the panel on `/dev/i2c-<bus>`.
#[cfg(target_os = "linux")]
pub fn open(bus: u8, addr: u8) -> Result<OledPanel<rppal::i2c::I2c>> {
    let i2c = crate::hal::open_i2c(bus)?;
    OledPanel::new(i2c, addr)
}
