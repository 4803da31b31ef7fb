use embedded_graphics::{
    prelude::{Point, Size},
    primitives::Rectangle,
};
use heapless::Vec;

use crate::controller::YAddressing;

/// A rectangular addressing window, in pixels. `x2` and `y2` are exclusive.
///
/// The x bounds must be multiples of 8, since RAM is addressed in bytes of 8 horizontal pixels,
/// and the window must fit within the panel. Neither is checked by the driver: an invalid window
/// produces garbled output rather than an error.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub x1: u16,
    pub x2: u16,
    pub y1: u16,
    pub y2: u16,
}

impl Area {
    pub const fn new(x1: u16, x2: u16, y1: u16, y2: u16) -> Self {
        Self { x1, x2, y1, y2 }
    }

    /// The window covering a whole `width` x `height` panel.
    pub const fn full(width: u16, height: u16) -> Self {
        Self::new(0, width, 0, height)
    }

    /// Converts an `embedded-graphics` rectangle. Returns `None` if the rectangle has a negative
    /// origin or doesn't fit in `u16` coordinates.
    pub fn from_rectangle(rect: Rectangle) -> Option<Self> {
        let x1 = u16::try_from(rect.top_left.x).ok()?;
        let y1 = u16::try_from(rect.top_left.y).ok()?;
        let x2 = x1.checked_add(u16::try_from(rect.size.width).ok()?)?;
        let y2 = y1.checked_add(u16::try_from(rect.size.height).ok()?)?;
        Some(Self::new(x1, x2, y1, y2))
    }

    pub fn to_rectangle(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.x1 as i32, self.y1 as i32),
            Size::new(self.width() as u32, self.height() as u32),
        )
    }

    pub fn width(&self) -> u16 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u16 {
        self.y2.saturating_sub(self.y1)
    }

    /// The number of bytes in one row of this window.
    pub fn width_bytes(&self) -> usize {
        (self.width() >> 3) as usize
    }

    /// The number of bytes needed to fill this window.
    pub fn byte_len(&self) -> usize {
        self.width_bytes() * self.height() as usize
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.x1 % 8 == 0 && self.x2 % 8 == 0
    }
}

/// Data for [crate::Command::SetRamXStartEnd]: first and last byte column, inclusive.
pub(crate) fn x_range(area: &Area) -> [u8; 2] {
    [
        (area.x1 >> 3) as u8,
        (area.x2.wrapping_sub(1) >> 3) as u8,
    ]
}

/// Data for [crate::Command::SetRamXAddressCounter].
pub(crate) fn x_counter(area: &Area) -> [u8; 1] {
    [(area.x1 >> 3) as u8]
}

/// Data for [crate::Command::SetRamYStartEnd]: first and last row, inclusive.
pub(crate) fn y_range(area: &Area, addressing: YAddressing) -> Vec<u8, 4> {
    let mut data = Vec::new();
    // Both encodings fit within the capacity.
    let _ = data.extend_from_slice(&encode_y(area.y1, addressing));
    let _ = data.extend_from_slice(&encode_y(area.y2.wrapping_sub(1), addressing));
    data
}

/// Data for [crate::Command::SetRamYAddressCounter].
pub(crate) fn y_counter(area: &Area, addressing: YAddressing) -> Vec<u8, 2> {
    encode_y(area.y1, addressing)
}

/// Data for [crate::Command::DriverOutputControl]: the last gate line, then GD = SM = TB = 0.
pub(crate) fn driver_output(height: u16, addressing: YAddressing) -> Vec<u8, 3> {
    let mut data = Vec::new();
    let last_line = height.wrapping_sub(1);
    let _ = match addressing {
        YAddressing::Byte => data.extend_from_slice(&[last_line as u8, 0x00]),
        YAddressing::Word => {
            let [low, high] = split_low_and_high(last_line & 0x01FF);
            data.extend_from_slice(&[low, high, 0x00])
        }
    };
    data
}

fn encode_y(y: u16, addressing: YAddressing) -> Vec<u8, 2> {
    let mut data = Vec::new();
    let _ = match addressing {
        YAddressing::Byte => data.push(y as u8).map_err(|_| ()),
        YAddressing::Word => data.extend_from_slice(&split_low_and_high(y & 0x01FF)),
    };
    data
}

/// Splits a u16 into its little-endian bytes.
pub(crate) const fn split_low_and_high(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}
