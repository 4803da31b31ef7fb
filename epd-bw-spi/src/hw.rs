use core::{convert::Infallible, error::Error as CoreError};

use embedded_hal::digital::{ErrorType as PinErrorType, InputPin, OutputPin, PinState};
use embedded_hal_async::{
    delay::DelayNs,
    digital::Wait,
    spi::{ErrorType as SpiErrorType, Operation, SpiDevice},
};
use heapless::Vec;

use crate::log::trace;

/// Provides access to the hardware needed to control the display.
///
/// The SPI device is not owned by the implementation: it is passed into each driver call so that
/// the bus can be shared with other peripherals. The SPI device is responsible for chip-select
/// framing, and each call claims the bus only for the duration of one transaction.
///
/// The reset and busy lines are optional. Return `None` from [EpdHw::reset] or [EpdHw::busy] if
/// the line isn't wired, and use [Unwired] as the associated type.
///
/// ```rust,ignore
/// use embassy_embedded_hal::shared_bus::asynch::spi::SpiDevice;
/// use embassy_rp::gpio::{Input, Output};
/// use embassy_time::Delay;
/// use epd_bw_spi::{hw::Unwired, EpdHw};
///
/// struct BoardHw<'a> {
///     dc: Output<'a>,
///     busy: Input<'a>,
///     delay: Delay,
/// }
///
/// impl<'a> EpdHw for BoardHw<'a> {
///     type Spi = SpiDevice<'a, NoopRawMutex, Spi<'a, SPI0, spi::Async>, Output<'a>>;
///     type Dc = Output<'a>;
///     type Reset = Unwired;
///     type Busy = Input<'a>;
///     type Delay = Delay;
///     type Error = Error;
///
///     fn dc(&mut self) -> &mut Self::Dc {
///         &mut self.dc
///     }
///
///     fn reset(&mut self) -> Option<&mut Self::Reset> {
///         None
///     }
///
///     fn busy(&mut self) -> Option<&mut Self::Busy> {
///         Some(&mut self.busy)
///     }
///
///     fn delay(&mut self) -> &mut Self::Delay {
///         &mut self.delay
///     }
/// }
/// ```
pub trait EpdHw {
    type Spi: SpiDevice;
    type Dc: OutputPin;
    type Reset: OutputPin;
    type Busy: InputPin + Wait;
    type Delay: DelayNs;
    type Error: CoreError
        + From<<Self::Spi as SpiErrorType>::Error>
        + From<<Self::Dc as PinErrorType>::Error>
        + From<<Self::Reset as PinErrorType>::Error>
        + From<<Self::Busy as PinErrorType>::Error>;

    /// The Data/Command select line. Low for command bytes, high for data bytes.
    fn dc(&mut self) -> &mut Self::Dc;

    /// The hardware reset line, if wired.
    ///
    /// Deep sleep can only be exited with a reset pulse, so the driver treats a missing reset line
    /// as "never sleep".
    fn reset(&mut self) -> Option<&mut Self::Reset>;

    /// The busy line, if wired. Without it, the driver waits for fixed settle times instead.
    fn busy(&mut self) -> Option<&mut Self::Busy>;

    /// Which state of the busy line indicates that the controller is busy.
    fn busy_when(&self) -> PinState {
        crate::DEFAULT_BUSY_WHEN
    }

    fn delay(&mut self) -> &mut Self::Delay;
}

/// Placeholder for a control line that isn't connected.
///
/// Writes are discarded and reads report low. Pair this with `None` from [EpdHw::reset] or
/// [EpdHw::busy].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Unwired;

impl PinErrorType for Unwired {
    type Error = Infallible;
}

impl OutputPin for Unwired {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl InputPin for Unwired {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

impl Wait for Unwired {
    async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Provides "wait" support for hardware with a busy state.
pub(crate) trait BusyWait: EpdHw {
    /// Waits for the current operation to complete if the display is busy. Returns immediately if
    /// no busy line is wired.
    ///
    /// Note that this will wait forever if the display is asleep.
    async fn wait_if_busy(&mut self) -> Result<(), Self::Error>;

    /// Waits for the controller to settle after an operation. Polls the busy line when wired,
    /// otherwise sleeps for the estimated `settle_us`.
    async fn settle(&mut self, settle_us: u32) -> Result<(), Self::Error>;
}

impl<HW: EpdHw> BusyWait for HW {
    async fn wait_if_busy(&mut self) -> Result<(), HW::Error> {
        let busy_when = self.busy_when();
        let Some(busy) = self.busy() else {
            return Ok(());
        };
        match busy_when {
            PinState::High => {
                if busy.is_high()? {
                    trace!("Waiting for busy EPD");
                    busy.wait_for_low().await?;
                }
            }
            PinState::Low => {
                if busy.is_low()? {
                    trace!("Waiting for busy EPD");
                    busy.wait_for_high().await?;
                }
            }
        };
        Ok(())
    }

    async fn settle(&mut self, settle_us: u32) -> Result<(), HW::Error> {
        if self.busy().is_some() {
            self.wait_if_busy().await
        } else {
            self.delay().delay_us(settle_us).await;
            Ok(())
        }
    }
}

/// Size of the repeated-byte chunk used by [CommandDataSend::send_repeated].
const FILL_CHUNK_LEN: usize = 128;
/// Maximum number of chunks sent within one SPI transaction.
const FILL_CHUNKS_PER_TRANSACTION: usize = 32;

/// Provides the ability to send <command> then <data> style communications.
pub(crate) trait CommandDataSend: EpdHw {
    /// Send the following command and data to the display. Waits until the display is no longer busy before sending.
    async fn send(
        &mut self,
        spi: &mut Self::Spi,
        command: u8,
        data: &[u8],
    ) -> Result<(), Self::Error>;

    /// Sends more data for the previous command, without resending the command byte.
    async fn send_data(&mut self, spi: &mut Self::Spi, data: &[u8]) -> Result<(), Self::Error>;

    /// Sends `command` followed by `count` copies of `byte`, without materialising the payload.
    async fn send_repeated(
        &mut self,
        spi: &mut Self::Spi,
        command: u8,
        byte: u8,
        count: usize,
    ) -> Result<(), Self::Error>;
}

impl<HW: EpdHw> CommandDataSend for HW {
    async fn send(
        &mut self,
        spi: &mut Self::Spi,
        command: u8,
        data: &[u8],
    ) -> Result<(), Self::Error> {
        trace!("Sending EPD command: {:#x}", command);
        self.wait_if_busy().await?;

        self.dc().set_low()?;
        spi.write(&[command]).await?;

        self.send_data(spi, data).await
    }

    async fn send_data(&mut self, spi: &mut Self::Spi, data: &[u8]) -> Result<(), Self::Error> {
        if !data.is_empty() {
            self.dc().set_high()?;
            spi.write(data).await?;
        }
        Ok(())
    }

    async fn send_repeated(
        &mut self,
        spi: &mut Self::Spi,
        command: u8,
        byte: u8,
        count: usize,
    ) -> Result<(), Self::Error> {
        self.send(spi, command, &[]).await?;
        if count == 0 {
            return Ok(());
        }
        self.dc().set_high()?;

        let chunk = [byte; FILL_CHUNK_LEN];
        let mut remaining = count;
        while remaining > 0 {
            let mut operations: Vec<Operation<'_, u8>, FILL_CHUNKS_PER_TRANSACTION> = Vec::new();
            while remaining > 0 && !operations.is_full() {
                let len = remaining.min(FILL_CHUNK_LEN);
                // Capacity was checked above.
                let _ = operations.push(Operation::Write(&chunk[..len]));
                remaining -= len;
            }
            spi.transaction(&mut operations).await?;
        }
        Ok(())
    }
}
