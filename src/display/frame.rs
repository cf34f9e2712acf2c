use crate::state::SLOT_BYTES;
use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    pixelcolor::BinaryColor,
    Pixel,
};
use std::convert::Infallible;
use std::fmt;

pub const WIDTH: u32 = 128;
pub const HEIGHT: u32 = 64;
const ROW_BYTES: usize = WIDTH as usize / 8;

/// 128x64 monochrome image in XBM layout: 16 bytes per row, least significant
/// bit is the leftmost pixel.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Box<[u8; SLOT_BYTES]>,
}

impl Default for Frame {
    fn default() -> Self {
        Self::blank()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("lit", &self.lit_count())
            .finish()
    }
}

impl Frame {
    pub fn blank() -> Self {
        Self {
            bytes: Box::new([0u8; SLOT_BYTES]),
        }
    }

    pub fn from_xbm(bytes: &[u8; SLOT_BYTES]) -> Self {
        Self {
            bytes: Box::new(*bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8; SLOT_BYTES] {
        &self.bytes
    }

    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }
        let (index, bit) = locate(x, y);
        self.bytes[index] & (1 << bit) != 0
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        if x >= WIDTH || y >= HEIGHT {
            return;
        }
        let (index, bit) = locate(x, y);
        if on {
            self.bytes[index] |= 1 << bit;
        } else {
            self.bytes[index] &= !(1 << bit);
        }
    }

    pub fn lit_count(&self) -> u32 {
        self.bytes.iter().map(|b| b.count_ones()).sum()
    }

    pub fn is_blank(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }
}

fn locate(x: u32, y: u32) -> (usize, u32) {
    (y as usize * ROW_BYTES + x as usize / 8, x % 8)
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color.is_on());
            }
        }
        Ok(())
    }
}
