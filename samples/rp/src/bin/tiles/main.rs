//! Draws a logo over the whole of a 1.54" IL3829 panel with a full refresh, then repeats a small
//! version of it in 32 pixel tiles across the panel using partial refreshes.

#![no_std]
#![no_main]

mod hw;

use defmt::{expect, info};
use embassy_embedded_hal::shared_bus::asynch::spi::SpiDevice;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::spi::{self, Spi};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Instant, Ticker};
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, PrimitiveStyle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyle};
use epd_bw_spi::buffer::{binary_buffer_length, BinaryBuffer};
use epd_bw_spi::{
    Area, DisplayDevice, EpdBwSpi, PanelConfig, RefreshMode, IL3829, RECOMMENDED_SPI_HZ,
    RECOMMENDED_SPI_PHASE, RECOMMENDED_SPI_POLARITY,
};
use hw::*;
use {defmt_rtt as _, panic_probe as _};

const WIDTH: u16 = 200;
const HEIGHT: u16 = 200;
const PANEL: Area = Area::full(WIDTH, HEIGHT);
const TILE_SIZE: u16 = 32;
const TILE: Area = Area::full(TILE_SIZE, TILE_SIZE);

/// Draws a ring with a label in the middle of the buffer's area.
fn draw_logo<const L: usize>(buffer: &mut BinaryBuffer<L>, label: &str) {
    let bounds = buffer.bounding_box();
    let diameter = bounds.size.width.min(bounds.size.height) - 4;
    let center = bounds.center();

    buffer.clear(BinaryColor::On).unwrap();
    Circle::with_center(center, diameter)
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::Off, 3))
        .draw(buffer)
        .unwrap();

    let mut style = TextStyle::default();
    style.alignment = Alignment::Center;
    style.baseline = Baseline::Middle;
    let character_style = MonoTextStyle::new(&FONT_6X10, BinaryColor::Off);
    Text::with_text_style(label, center, character_style, style)
        .draw(buffer)
        .unwrap();
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    let resources = split_resources!(p);
    let mut config = spi::Config::default();
    config.frequency = RECOMMENDED_SPI_HZ;
    // embassy-rp uses the synchronous phase and polarity enums, so we have to map these.
    config.phase = match RECOMMENDED_SPI_PHASE {
        embedded_hal_async::spi::Phase::CaptureOnFirstTransition => {
            embassy_rp::spi::Phase::CaptureOnFirstTransition
        }
        embedded_hal_async::spi::Phase::CaptureOnSecondTransition => {
            embassy_rp::spi::Phase::CaptureOnSecondTransition
        }
    };
    config.polarity = match RECOMMENDED_SPI_POLARITY {
        embedded_hal_async::spi::Polarity::IdleHigh => embassy_rp::spi::Polarity::IdleHigh,
        embedded_hal_async::spi::Polarity::IdleLow => embassy_rp::spi::Polarity::IdleLow,
    };

    let raw_spi: Mutex<NoopRawMutex, _> = Mutex::new(Spi::new_txonly(
        resources.spi_hw.spi,
        resources.spi_hw.clk,
        resources.spi_hw.tx,
        resources.spi_hw.dma_tx,
        config,
    ));
    // CS is active low.
    let cs_pin = Output::new(resources.spi_hw.cs, Level::High);
    let mut spi = SpiDevice::new(&raw_spi, cs_pin);

    info!("Creating EPD driver");
    let mut epd = expect!(
        EpdBwSpi::new(
            DisplayHw::new(resources.epd_hw),
            IL3829,
            PanelConfig::new(WIDTH, HEIGHT),
        ),
        "Failed to create EPD driver"
    );

    let mut logo = BinaryBuffer::<{ binary_buffer_length(PANEL) }>::new(PANEL);
    draw_logo(&mut logo, "epd-bw-spi");

    let mut ticker = Ticker::every(Duration::from_millis(2500));
    loop {
        // The controller swaps RAM buffers on each update, so write the logo into both before
        // starting partial refreshes.
        epd.set_refresh_mode(RefreshMode::Full);
        for _ in 0..2 {
            info!("Drawing full logo");
            expect!(
                epd.map(&mut spi, logo.area(), logo.data()).await,
                "Failed to draw logo"
            );
        }
        ticker.next().await;

        epd.set_refresh_mode(RefreshMode::Partial);
        for y in (0..HEIGHT - TILE_SIZE + 1).step_by(TILE_SIZE as usize) {
            for x in (0..WIDTH - TILE_SIZE + 1).step_by(TILE_SIZE as usize) {
                let area = Area::new(x, x + TILE_SIZE, y, y + TILE_SIZE);
                let mut tile = BinaryBuffer::<{ binary_buffer_length(TILE) }>::new(area);
                draw_logo(&mut tile, "");

                let before_map = Instant::now();
                expect!(
                    epd.map(&mut spi, tile.area(), tile.data()).await,
                    "Failed to draw tile"
                );
                info!(
                    "Tile at ({}, {}) drawn in {} ms",
                    x,
                    y,
                    before_map.elapsed().as_millis()
                );
                ticker.next().await;
            }
        }
    }
}
