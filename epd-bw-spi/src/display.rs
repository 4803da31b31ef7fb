use thiserror::Error as ThisError;

use crate::{
    area::Area,
    epd::EpdBwSpi,
    hw::EpdHw,
    log::{debug, warn_log},
};

/// Errors from a [DisplayDevice].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, ThisError)]
pub enum DisplayError<E> {
    #[error("display hardware error: {0:?}")]
    Hw(E),
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
    #[error("pixel buffer too short: expected {expected} bytes, got {actual}")]
    BufferLength { expected: usize, actual: usize },
}

impl<E> From<E> for DisplayError<E> {
    fn from(e: E) -> Self {
        DisplayError::Hw(e)
    }
}

/// A display that can draw packed pixel rectangles, without exposing its refresh protocol.
///
/// Application code can hold any display behind this trait. `SPI` is the bus handle passed into
/// each draw, matching the rest of the crate.
#[allow(async_fn_in_trait)]
pub trait DisplayDevice<SPI> {
    type Error;

    /// Draws `pixels` into `area` and refreshes the panel.
    ///
    /// `pixels` must hold at least `area.byte_len()` bytes, packed as for
    /// [EpdBwSpi::write_buffer].
    async fn map(&mut self, spi: &mut SPI, area: Area, pixels: &[u8]) -> Result<(), Self::Error>;

    fn width(&self) -> u16;

    fn height(&self) -> u16;

    /// Bits per pixel.
    fn color_depth(&self) -> u8;

    fn set_invert(&mut self, invert: bool) -> Result<(), Self::Error>;
}

impl<HW: EpdHw> DisplayDevice<HW::Spi> for EpdBwSpi<HW> {
    type Error = DisplayError<HW::Error>;

    /// Runs a complete write cycle for `area`, using the current [EpdBwSpi::refresh_mode].
    ///
    /// The display is woken first and, if a reset line is wired, put back into deep sleep
    /// afterwards.
    async fn map(
        &mut self,
        spi: &mut HW::Spi,
        area: Area,
        pixels: &[u8],
    ) -> Result<(), Self::Error> {
        let expected = area.byte_len();
        if pixels.len() < expected {
            return Err(DisplayError::BufferLength {
                expected,
                actual: pixels.len(),
            });
        }
        let mode = self.refresh_mode();
        debug!("Mapping {:?} with {:?} refresh", area, mode);

        self.wake(spi).await?;
        self.init(spi, mode).await?;
        self.activate(spi).await?;
        self.set_area(spi, area).await?;
        self.write_buffer(spi, &pixels[..expected]).await?;
        self.update(spi, mode).await?;
        self.deactivate(spi).await?;

        if self.has_reset() {
            self.sleep(spi).await?;
        }
        Ok(())
    }

    fn width(&self) -> u16 {
        EpdBwSpi::width(self)
    }

    fn height(&self) -> u16 {
        EpdBwSpi::height(self)
    }

    fn color_depth(&self) -> u8 {
        1
    }

    fn set_invert(&mut self, _invert: bool) -> Result<(), Self::Error> {
        warn_log!("Colour inversion is not supported");
        debug_assert!(false, "set_invert is not supported");
        Err(DisplayError::Unsupported("set_invert"))
    }
}
