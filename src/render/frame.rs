use std::convert::Infallible;

use embedded_graphics::Pixel;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{DrawTarget, OriginDimensions, Size};

pub const WIDTH: u32 = 128;
pub const HEIGHT: u32 = 64;
/// One bit per pixel, laid out as SSD1306 pages: byte `page * WIDTH + x`
/// holds rows `page * 8 .. page * 8 + 8` of column `x`, LSB on top.
pub const BUFFER_LEN: usize = (WIDTH * HEIGHT / 8) as usize;

/// A complete monochrome frame. Pixels drawn outside 128x64 are dropped, so
/// a frame can never grow past the panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    buf: [u8; BUFFER_LEN],
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    pub fn new() -> Self {
        Frame {
            buf: [0; BUFFER_LEN],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= WIDTH || y >= HEIGHT {
            return false;
        }
        let (idx, bit) = Self::locate(x, y);
        self.buf[idx] & bit != 0
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        if x >= WIDTH || y >= HEIGHT {
            return;
        }
        let (idx, bit) = Self::locate(x, y);
        if on {
            self.buf[idx] |= bit;
        } else {
            self.buf[idx] &= !bit;
        }
    }

    pub fn lit_pixels(&self) -> u32 {
        self.buf.iter().map(|b| b.count_ones()).sum()
    }

    /// Raw page-ordered bytes, ready for a horizontal-addressing flush.
    pub fn as_bytes(&self) -> &[u8; BUFFER_LEN] {
        &self.buf
    }

    fn locate(x: u32, y: u32) -> (usize, u8) {
        let idx = (y / 8 * WIDTH + x) as usize;
        (idx, 1 << (y % 8))
    }
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
            if point.x < 0 || point.y < 0 {
                continue;
            }
            self.set_pixel(point.x as u32, point.y as u32, color.is_on());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    use super::*;

    #[test]
    fn page_layout_matches_panel() {
        let mut frame = Frame::new();
        frame.set_pixel(0, 0, true);
        frame.set_pixel(5, 9, true);
        frame.set_pixel(127, 63, true);
        let bytes = frame.as_bytes();
        assert_eq!(bytes[0], 0b0000_0001);
        assert_eq!(bytes[128 + 5], 0b0000_0010);
        assert_eq!(bytes[BUFFER_LEN - 1], 0b1000_0000);
        assert_eq!(frame.lit_pixels(), 3);
    }

    #[test]
    fn out_of_bounds_pixels_are_clipped() {
        let mut frame = Frame::new();
        Rectangle::new(Point::new(-10, -10), Size::new(400, 400))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut frame)
            .unwrap();
        assert_eq!(frame.lit_pixels(), WIDTH * HEIGHT);
        assert!(!frame.pixel(128, 0));
    }

    #[test]
    fn pixels_can_be_cleared() {
        let mut frame = Frame::new();
        frame.set_pixel(3, 3, true);
        frame.set_pixel(3, 3, false);
        assert_eq!(frame, Frame::new());
    }
}
