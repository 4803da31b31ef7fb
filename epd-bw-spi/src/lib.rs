//! This crate provides an `async`/`await` driver for black/white e-paper controllers in the IL3829
//! family, such as the IL3829 and SSD1673.
//!
//! It is built on top of `embedded-hal-async` and `embedded-graphics`, making it compatible with a
//! wide range of embedded platforms.
//!
//! ## Core types
//!
//! - [`EpdBwSpi`]: the protocol driver. It owns the display's state and issues the command
//!   sequences for area addressing, the full and partial refresh cycle, LUT programming, and the
//!   power states. Controller differences are captured as data in a [`Controller`] profile, so one
//!   driver serves every supported chip.
//!
//! - [`EpdHw`]: abstracts over the hardware needed to control the display: SPI communication, GPIO
//!   pins (for Data/Command, and optionally Reset and Busy signals), and a delay timer. You need to
//!   implement this trait for your chosen peripherals.
//!
//! - [`DisplayDevice`]: a draw-a-rectangle interface that hides the refresh protocol from
//!   application code.
//!
//! Additionally, the `buffer` module provides a packed [`buffer::BinaryBuffer`] that implements
//! `embedded-graphics::DrawTarget` for one window of the panel.
//!
//! ## Features
//!
//! - `defmt`: log via `defmt`, and derive `defmt::Format` for public types.
//! - `log`: log via the `log` crate.

#![no_std]

use embedded_hal::digital::PinState;
use embedded_hal_async::spi::{Phase, Polarity};

pub mod area;
pub mod buffer;
pub mod command;
pub mod controller;
pub mod display;
pub mod epd;
pub mod hw;

mod log;

pub use area::Area;
pub use command::{Command, DataEntryMode, UpdateSequence};
pub use controller::{Controller, YAddressing, IL3829, SSD1673};
pub use display::{DisplayDevice, DisplayError};
pub use epd::{
    color_byte, EpdBwSpi, InitError, PanelConfig, PowerState, RefreshMode, RefreshState,
    COLOR_BLACK, COLOR_WHITE,
};
pub use hw::{EpdHw, Unwired};

pub const RECOMMENDED_SPI_HZ: u32 = 5_000_000; // 5 MHz
/// Use this phase in conjunction with [RECOMMENDED_SPI_POLARITY] (SPI mode 0) so that the
/// controller captures data on the rising edge.
pub const RECOMMENDED_SPI_PHASE: Phase = Phase::CaptureOnFirstTransition;
/// Use this polarity in conjunction with [RECOMMENDED_SPI_PHASE].
pub const RECOMMENDED_SPI_POLARITY: Polarity = Polarity::IdleLow;

/// The busy line reads high while the controller is working.
pub const DEFAULT_BUSY_WHEN: PinState = PinState::High;
