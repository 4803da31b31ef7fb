use embassy_embedded_hal::shared_bus::asynch::spi::SpiDevice;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals;
use embassy_rp::spi::{self, Spi};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::Delay;
use epd_bw_spi::EpdHw;
use rp_samples::Error;

// Pins for a Waveshare 1.54" module on SPI0.
assign_resources::assign_resources! {
    spi_hw: SpiP {
        spi: SPI0,
        clk: PIN_2,
        tx: PIN_3,
        dma_tx: DMA_CH1,
        cs: PIN_5,
    },
    epd_hw: DisplayP {
        reset: PIN_7,
        dc: PIN_6,
        busy: PIN_8,
    }
}

/// Connects the display's D/C, reset and busy lines.
pub struct DisplayHw<'a> {
    dc: Output<'a>,
    reset: Output<'a>,
    busy: Input<'a>,
    delay: Delay,
}

impl DisplayHw<'_> {
    pub fn new(p: DisplayP) -> Self {
        let dc = Output::new(p.dc, Level::Low);
        // Held in reset until the driver is created.
        let reset = Output::new(p.reset, Level::Low);
        let busy = Input::new(p.busy, Pull::Down);

        Self {
            dc,
            reset,
            busy,
            delay: Delay,
        }
    }
}

pub type EpdSpiDevice<'a> =
    SpiDevice<'a, NoopRawMutex, Spi<'a, peripherals::SPI0, spi::Async>, Output<'a>>;

impl<'a> EpdHw for DisplayHw<'a> {
    type Spi = EpdSpiDevice<'a>;

    type Dc = Output<'a>;

    type Reset = Output<'a>;

    type Busy = Input<'a>;

    type Delay = Delay;

    type Error = Error;

    fn dc(&mut self) -> &mut Self::Dc {
        &mut self.dc
    }

    fn reset(&mut self) -> Option<&mut Self::Reset> {
        Some(&mut self.reset)
    }

    fn busy(&mut self) -> Option<&mut Self::Busy> {
        Some(&mut self.busy)
    }

    fn delay(&mut self) -> &mut Self::Delay {
        &mut self.delay
    }
}
