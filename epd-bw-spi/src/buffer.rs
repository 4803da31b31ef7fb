use core::convert::Infallible;

use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::{Dimensions, DrawTarget, Point},
    primitives::Rectangle,
    Pixel,
};

use crate::{area::Area, epd::color_byte};

/// Computes the buffer length needed for `area`: one byte per 8 horizontal pixels.
pub const fn binary_buffer_length(area: Area) -> usize {
    ((area.x2 - area.x1) as usize / 8) * (area.y2 - area.y1) as usize
}

/// A packed 1-bit pixel buffer for one window of the panel.
///
/// Coordinates are in panel space, so drawing at `(x, y)` lands on that panel pixel as long as it
/// falls within [Self::area]. Pixels outside the window are dropped. The packing matches what the
/// controller expects: rows in order, 8 pixels per byte with the leftmost in the MSB, and
/// `BinaryColor::On` as white.
pub struct BinaryBuffer<const L: usize> {
    area: Area,
    bytes_per_row: usize,
    data: [u8; L],
}

impl<const L: usize> BinaryBuffer<L> {
    /// Creates a new buffer for `area`, with every pixel white.
    ///
    /// The window's x bounds must be multiples of 8, and `L` must match
    /// [binary_buffer_length].
    ///
    /// ```
    /// use epd_bw_spi::{buffer::{binary_buffer_length, BinaryBuffer}, Area};
    ///
    /// const TILE: Area = Area::new(32, 64, 0, 32);
    /// let buffer = BinaryBuffer::<{ binary_buffer_length(TILE) }>::new(TILE);
    /// assert_eq!(buffer.data().len(), 128);
    /// ```
    pub fn new(area: Area) -> Self {
        debug_assert!(
            area.is_byte_aligned(),
            "x bounds must be multiples of 8 for binary packing."
        );
        debug_assert_eq!(
            binary_buffer_length(area),
            L,
            "Length must match the given area"
        );
        Self {
            area,
            bytes_per_row: area.width_bytes(),
            data: [color_byte(BinaryColor::On); L],
        }
    }

    /// The window this buffer covers.
    pub fn area(&self) -> Area {
        self.area
    }

    /// Access the packed buffer data, ready for [crate::EpdBwSpi::write_buffer].
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn set_pixel(&mut self, point: Point, color: BinaryColor) {
        let x = point.x - self.area.x1 as i32;
        let y = point.y - self.area.y1 as i32;
        if x < 0 || y < 0 || x >= self.area.width() as i32 || y >= self.area.height() as i32 {
            return;
        }

        let byte_index = (x as usize) / 8 + (y as usize) * self.bytes_per_row;
        let mask = 0x80 >> (x as usize % 8);
        match color {
            BinaryColor::On => self.data[byte_index] |= mask,
            BinaryColor::Off => self.data[byte_index] &= !mask,
        }
    }
}

impl<const L: usize> Dimensions for BinaryBuffer<L> {
    fn bounding_box(&self) -> Rectangle {
        self.area.to_rectangle()
    }
}

impl<const L: usize> DrawTarget for BinaryBuffer<L> {
    type Color = BinaryColor;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels.into_iter() {
            self.set_pixel(point, color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.data.fill(color_byte(color));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use embedded_graphics::{
        prelude::{Primitive, Size},
        primitives::PrimitiveStyle,
        Drawable,
    };

    use super::*;

    const TILE: Area = Area::new(8, 24, 4, 6);

    #[test]
    fn test_new_buffer_is_white() {
        let buffer = BinaryBuffer::<{ binary_buffer_length(TILE) }>::new(TILE);
        assert_eq!(buffer.data(), &[0xFF; 4]);
        assert_eq!(buffer.bounding_box(), TILE.to_rectangle());
    }

    #[test]
    fn test_pixels_use_panel_coordinates() {
        let mut buffer = BinaryBuffer::<{ binary_buffer_length(TILE) }>::new(TILE);
        buffer
            .draw_iter([
                Pixel(Point::new(8, 4), BinaryColor::Off),
                Pixel(Point::new(23, 5), BinaryColor::Off),
            ])
            .unwrap();
        assert_eq!(buffer.data(), &[0x7F, 0xFF, 0xFF, 0xFE]);
    }

    #[test]
    fn test_pixels_outside_area_are_dropped() {
        let mut buffer = BinaryBuffer::<{ binary_buffer_length(TILE) }>::new(TILE);
        buffer
            .draw_iter([
                Pixel(Point::new(7, 4), BinaryColor::Off),
                Pixel(Point::new(24, 4), BinaryColor::Off),
                Pixel(Point::new(8, 3), BinaryColor::Off),
                Pixel(Point::new(8, 6), BinaryColor::Off),
                Pixel(Point::new(-1, -1), BinaryColor::Off),
            ])
            .unwrap();
        assert_eq!(buffer.data(), &[0xFF; 4]);
    }

    #[test]
    fn test_clear_and_fill() {
        let mut buffer = BinaryBuffer::<{ binary_buffer_length(TILE) }>::new(TILE);
        buffer.clear(BinaryColor::Off).unwrap();
        assert_eq!(buffer.data(), &[0x00; 4]);

        Rectangle::new(Point::new(16, 5), Size::new(8, 1))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut buffer)
            .unwrap();
        assert_eq!(buffer.data(), &[0x00, 0x00, 0x00, 0xFF]);
    }
}
