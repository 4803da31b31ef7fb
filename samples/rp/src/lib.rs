#![no_std]

use core::convert::Infallible;

use embassy_embedded_hal::shared_bus::SpiDeviceError;
use embassy_rp::spi;
use thiserror::Error as ThisError;

/// Errors from the shared SPI bus. The chip select pin can't fail.
pub type BusError = SpiDeviceError<spi::Error, Infallible>;

/// Error type for the display hardware on these boards.
#[derive(Debug, ThisError, defmt::Format)]
pub enum Error {
    #[error("SPI bus error: {0:?}")]
    Bus(BusError),
}

// GPIO on the RP2040 is infallible.
impl From<Infallible> for Error {
    fn from(e: Infallible) -> Self {
        match e {}
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Error::Bus(e)
    }
}
