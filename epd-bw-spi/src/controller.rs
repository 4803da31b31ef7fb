//! Static configuration for each supported controller family.
//!
//! The IL3829 and SSD1673 share a command set and only differ in their limits, so a single driver
//! handles both, parameterised by a [Controller] value.

/// Default LUT for a full refresh. Cycles every pixel, which removes ghosting but takes over a
/// second.
pub const LUT_FULL_UPDATE: [u8; 30] = [
    0x50, 0xAA, 0x55, 0xAA, 0x11, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0x1F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];
/// Default LUT for a partial refresh. Much faster, but ghosting accumulates, so do a full refresh
/// occasionally.
pub const LUT_PARTIAL_UPDATE: [u8; 30] = [
    0x10, 0x18, 0x18, 0x08, 0x18, 0x18, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x13, 0x14, 0x44, 0x12, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// VCOM level used by the reference panels. Not verified against every datasheet (some IL3829
/// boards ship with `0x9B`), so boards can override it with [Controller::with_vcom].
pub const DEFAULT_VCOM: u8 = 0xA8;

/// IL3829, as found on 1.54" 200x200 panels.
pub const IL3829: Controller =
    Controller::new(DEFAULT_VCOM, 200, 300, &LUT_FULL_UPDATE, &LUT_PARTIAL_UPDATE);

/// SSD1673, as found on 2.13" 122x250 panels.
pub const SSD1673: Controller =
    Controller::new(DEFAULT_VCOM, 150, 250, &LUT_FULL_UPDATE, &LUT_PARTIAL_UPDATE);

/// How Y addresses are encoded in the addressing commands.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YAddressing {
    /// One byte per address, for controllers with at most 255 rows.
    Byte,
    /// Two bytes per address: 9 bits, little-endian.
    Word,
}

/// Describes an e-paper controller family.
///
/// Profiles are immutable and can be shared by any number of displays.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controller {
    vcom: u8,
    max_width: u16,
    max_height: u16,
    lut_full: &'static [u8],
    lut_partial: &'static [u8],
}

impl Controller {
    /// Creates a new controller profile.
    ///
    /// Both LUTs must be the same length. Profiles are normally `const`, in which case a mismatch
    /// fails compilation.
    pub const fn new(
        vcom: u8,
        max_width: u16,
        max_height: u16,
        lut_full: &'static [u8],
        lut_partial: &'static [u8],
    ) -> Self {
        assert!(
            lut_full.len() == lut_partial.len(),
            "full and partial LUTs must have the same length"
        );
        Self {
            vcom,
            max_width,
            max_height,
            lut_full,
            lut_partial,
        }
    }

    /// Returns a copy of this profile using a different VCOM level.
    pub const fn with_vcom(self, vcom: u8) -> Self {
        Self { vcom, ..self }
    }

    pub fn vcom(&self) -> u8 {
        self.vcom
    }

    /// Maximum number of horizontal pixels the controller can drive.
    pub fn max_width(&self) -> u16 {
        self.max_width
    }

    /// Maximum number of vertical pixels the controller can drive.
    pub fn max_height(&self) -> u16 {
        self.max_height
    }

    pub fn lut_len(&self) -> usize {
        self.lut_full.len()
    }

    pub fn lut_full(&self) -> &'static [u8] {
        self.lut_full
    }

    pub fn lut_partial(&self) -> &'static [u8] {
        self.lut_partial
    }

    pub fn y_addressing(&self) -> YAddressing {
        if self.max_height <= 255 {
            YAddressing::Byte
        } else {
            YAddressing::Word
        }
    }
}
