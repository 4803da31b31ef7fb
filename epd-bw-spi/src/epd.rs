use core::time::Duration;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_hal::digital::OutputPin as _;
use embedded_hal_async::delay::DelayNs as _;
use thiserror::Error as ThisError;

use crate::{
    area::{self, Area},
    command::{Command, DataEntryMode, UpdateSequence},
    controller::Controller,
    hw::{BusyWait as _, CommandDataSend as _, EpdHw},
    log::{debug, info, warn_log},
};

/// White, for 8 horizontal pixels.
pub const COLOR_WHITE: u8 = 0xFF;
/// Black, for 8 horizontal pixels.
pub const COLOR_BLACK: u8 = 0x00;

/// Estimated time for master activation to power the clock and charge pump up or down.
pub const ACTIVATION_SETTLE: Duration = Duration::from_millis(80);
/// Estimated time for a full refresh.
pub const FULL_UPDATE_SETTLE: Duration = Duration::from_millis(1200);
/// Estimated time for a partial refresh.
pub const PARTIAL_UPDATE_SETTLE: Duration = Duration::from_millis(300);
/// Time to hold the reset line low, and to wait after leaving deep sleep.
pub const RESET_SETTLE: Duration = Duration::from_millis(1);

/// Booster soft start phases 1-3: 30 ms, 30 ms, 10 ms with decreasing off times.
const BOOSTER_SOFT_START_DATA: [u8; 3] = [0xD7, 0xD6, 0x9D];
/// 4 dummy lines per gate.
const DUMMY_LINE_PERIOD_DATA: [u8; 1] = [0x1A];
/// 2us per line.
const GATE_LINE_WIDTH_DATA: [u8; 1] = [0x08];

/// Returns the byte that fills 8 horizontal pixels with `color`. `On` is white.
pub fn color_byte(color: BinaryColor) -> u8 {
    match color {
        BinaryColor::On => COLOR_WHITE,
        BinaryColor::Off => COLOR_BLACK,
    }
}

fn as_micros(duration: Duration) -> u32 {
    duration.as_micros().min(u32::MAX as u128) as u32
}

/// The refresh mode for the display.
///
/// Both modes share the same command sequence but use a different LUT and settle time.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Cycles every pixel. This is slow, but should be done occasionally to avoid ghosting.
    #[default]
    Full,
    /// Only drives pixels that changed, using the partial LUT. Fast, but ghosting accumulates.
    Partial,
}

impl RefreshMode {
    /// Returns the LUT from `controller` to use for this refresh mode.
    pub fn lut(&self, controller: &Controller) -> &'static [u8] {
        match self {
            RefreshMode::Full => controller.lut_full(),
            RefreshMode::Partial => controller.lut_partial(),
        }
    }

    /// Returns the update sequence to run when refreshing in this mode.
    pub fn update_sequence(&self) -> UpdateSequence {
        match self {
            RefreshMode::Full => UpdateSequence::FULL_UPDATE,
            RefreshMode::Partial => UpdateSequence::PARTIAL_UPDATE,
        }
    }

    /// Returns how long a refresh in this mode takes to complete.
    pub fn settle_time(&self) -> Duration {
        match self {
            RefreshMode::Full => FULL_UPDATE_SETTLE,
            RefreshMode::Partial => PARTIAL_UPDATE_SETTLE,
        }
    }
}

/// Where the display is in the refresh cycle.
///
/// The expected order is `init` -> `activate` -> (`set_area`, `write_buffer`)* -> `update` ->
/// `deactivate`. Calls out of order are sent anyway, with a warning logged.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// Registers are at their defaults: after power on, a hardware reset, or a software reset.
    Uninitialized,
    /// Configured and loaded with the LUT for the given mode.
    Initialized(RefreshMode),
    /// Clock and charge pump are running.
    Activated,
    /// A refresh has been run.
    Updated,
    /// Clock and charge pump are off.
    Deactivated,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Active,
    DeepSleep,
}

/// Panel geometry and addressing configuration.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelConfig {
    /// Horizontal pixels. Must be a multiple of 8.
    pub width: u16,
    /// Vertical pixels.
    pub height: u16,
    pub entry_mode: DataEntryMode,
}

impl PanelConfig {
    pub const fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            entry_mode: DataEntryMode::YIncrementXIncrement,
        }
    }

    pub const fn with_entry_mode(self, entry_mode: DataEntryMode) -> Self {
        Self { entry_mode, ..self }
    }
}

/// Errors from [EpdBwSpi::new].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, ThisError)]
pub enum InitError<E> {
    #[error("failed to bring up display lines: {0:?}")]
    Hw(E),
    #[error("panel width {0} is not a multiple of 8")]
    UnalignedWidth(u16),
    #[error("panel {width}x{height} exceeds the controller's {max_width}x{max_height}")]
    PanelTooLarge {
        width: u16,
        height: u16,
        max_width: u16,
        max_height: u16,
    },
}

/// Generic driver for black/white e-paper controllers that share the IL3829 command set.
///
/// * [IL3829 datasheet](http://www.e-paper-display.com/download_detail/downloadsId=534.html)
/// * [1.54" e-Paper module](https://www.waveshare.com/wiki/1.54inch_e-Paper_Module)
///
/// A write cycle looks like this (substitute `part` for `full` for a partial refresh):
///
/// ```rust,ignore
/// epd.init_full(&mut spi).await?;
/// epd.activate(&mut spi).await?;
/// epd.set_area(&mut spi, Area::new(0, 200, 0, 200)).await?;
/// epd.write_buffer(&mut spi, &image).await?;
/// epd.update_full(&mut spi).await?;
/// epd.deactivate(&mut spi).await?;
/// ```
///
/// The controller has two RAM buffers, and swaps between them after each update.
///
/// Every operation waits for its settle time before returning. Operations are not reentrant: they
/// all take `&mut self`, so the owner serialises access.
pub struct EpdBwSpi<HW: EpdHw> {
    hw: HW,
    controller: Controller,
    width: u16,
    height: u16,
    entry_mode: DataEntryMode,
    refresh_mode: RefreshMode,
    refresh_state: RefreshState,
    power_state: PowerState,
    // Wiring doesn't change after construction.
    has_reset: bool,
}

impl<HW: EpdHw> EpdBwSpi<HW> {
    /// Creates the driver and brings up the control lines. The panel isn't contacted until the
    /// first `init_full`/`init_part`.
    pub fn new(
        mut hw: HW,
        controller: Controller,
        config: PanelConfig,
    ) -> Result<Self, InitError<HW::Error>> {
        if config.width % 8 != 0 {
            return Err(InitError::UnalignedWidth(config.width));
        }
        if config.width > controller.max_width() || config.height > controller.max_height() {
            return Err(InitError::PanelTooLarge {
                width: config.width,
                height: config.height,
                max_width: controller.max_width(),
                max_height: controller.max_height(),
            });
        }

        let has_reset = hw.reset().is_some();
        // Reset is active low; release it so the controller can run.
        if let Some(reset) = hw.reset() {
            reset
                .set_high()
                .map_err(|e| InitError::Hw(HW::Error::from(e)))?;
        }
        info!(
            "EPD ready: {}x{} panel, reset {}, busy {}",
            config.width,
            config.height,
            has_reset,
            hw.busy().is_some()
        );

        Ok(Self {
            hw,
            controller,
            width: config.width,
            height: config.height,
            entry_mode: config.entry_mode,
            refresh_mode: RefreshMode::default(),
            refresh_state: RefreshState::Uninitialized,
            power_state: PowerState::Active,
            has_reset,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn entry_mode(&self) -> DataEntryMode {
        self.entry_mode
    }

    /// The refresh mode used by [crate::DisplayDevice::map].
    pub fn refresh_mode(&self) -> RefreshMode {
        self.refresh_mode
    }

    /// Selects the refresh mode for subsequent [crate::DisplayDevice::map] calls. Nothing is sent
    /// to the display.
    pub fn set_refresh_mode(&mut self, mode: RefreshMode) {
        self.refresh_mode = mode;
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.refresh_state
    }

    pub fn power_state(&self) -> PowerState {
        self.power_state
    }

    /// Whether a reset line is wired, i.e. whether it's safe to [Self::sleep].
    pub fn has_reset(&self) -> bool {
        self.has_reset
    }

    /// Releases the hardware.
    pub fn release(self) -> HW {
        self.hw
    }

    /// Send the following command and data to the display. Waits until the display is no longer busy before sending.
    pub async fn send(
        &mut self,
        spi: &mut HW::Spi,
        command: Command,
        data: &[u8],
    ) -> Result<(), HW::Error> {
        self.hw.send(spi, command.register(), data).await
    }

    /// Configures the controller for a full refresh.
    pub async fn init_full(&mut self, spi: &mut HW::Spi) -> Result<(), HW::Error> {
        self.init(spi, RefreshMode::Full).await
    }

    /// Configures the controller for a partial refresh.
    pub async fn init_part(&mut self, spi: &mut HW::Spi) -> Result<(), HW::Error> {
        self.init(spi, RefreshMode::Partial).await
    }

    /// Runs the common configuration sequence, loads the LUT for `mode`, then selects the whole
    /// panel as the addressing window.
    pub async fn init(&mut self, spi: &mut HW::Spi, mode: RefreshMode) -> Result<(), HW::Error> {
        debug!("Initialising display for {:?} refresh", mode);
        if self.power_state == PowerState::DeepSleep {
            warn_log!("Initialising while in deep sleep; wake the display first");
        }
        let addressing = self.controller.y_addressing();

        self.send(
            spi,
            Command::DriverOutputControl,
            &area::driver_output(self.height, addressing),
        )
        .await?;
        self.send(spi, Command::BoosterSoftStartControl, &BOOSTER_SOFT_START_DATA)
            .await?;
        self.send(spi, Command::WriteVcomRegister, &[self.controller.vcom()])
            .await?;
        self.send(spi, Command::SetDummyLinePeriod, &DUMMY_LINE_PERIOD_DATA)
            .await?;
        self.send(spi, Command::SetGateLineWidth, &GATE_LINE_WIDTH_DATA)
            .await?;
        self.send(spi, Command::DataEntryModeSetting, &[self.entry_mode.bits()])
            .await?;

        let lut = mode.lut(&self.controller);
        self.send(spi, Command::WriteLutRegister, lut).await?;

        self.set_area(spi, Area::full(self.width, self.height))
            .await?;

        self.refresh_state = RefreshState::Initialized(mode);
        Ok(())
    }

    /// Enables the clock and charge pump.
    pub async fn activate(&mut self, spi: &mut HW::Spi) -> Result<(), HW::Error> {
        debug!("Activating display");
        if self.refresh_state == RefreshState::Uninitialized {
            warn_log!("Activating an uninitialised display");
        }
        self.run_sequence(spi, UpdateSequence::ACTIVATE, ACTIVATION_SETTLE)
            .await?;
        self.refresh_state = RefreshState::Activated;
        Ok(())
    }

    /// Disables the charge pump and clock.
    pub async fn deactivate(&mut self, spi: &mut HW::Spi) -> Result<(), HW::Error> {
        debug!("Deactivating display");
        self.run_sequence(spi, UpdateSequence::DEACTIVATE, ACTIVATION_SETTLE)
            .await?;
        self.refresh_state = RefreshState::Deactivated;
        Ok(())
    }

    /// Refreshes the panel from RAM with the full LUT. Takes over a second.
    pub async fn update_full(&mut self, spi: &mut HW::Spi) -> Result<(), HW::Error> {
        self.update(spi, RefreshMode::Full).await
    }

    /// Refreshes the panel from RAM with the partial LUT.
    pub async fn update_part(&mut self, spi: &mut HW::Spi) -> Result<(), HW::Error> {
        self.update(spi, RefreshMode::Partial).await
    }

    /// Refreshes the panel from RAM. `mode` should match the mode the display was initialised
    /// with, since that determines which LUT is loaded.
    pub async fn update(&mut self, spi: &mut HW::Spi, mode: RefreshMode) -> Result<(), HW::Error> {
        debug!("Updating display ({:?})", mode);
        if self.refresh_state != RefreshState::Activated {
            warn_log!("Updating without a preceding activate");
        }
        self.run_sequence(spi, mode.update_sequence(), mode.settle_time())
            .await?;
        self.send(spi, Command::Nop, &[]).await?;
        self.refresh_state = RefreshState::Updated;
        Ok(())
    }

    async fn run_sequence(
        &mut self,
        spi: &mut HW::Spi,
        sequence: UpdateSequence,
        settle: Duration,
    ) -> Result<(), HW::Error> {
        self.send(spi, Command::DisplayUpdateControl2, &[sequence.bits()])
            .await?;
        self.send(spi, Command::MasterActivation, &[]).await?;
        self.hw.settle(as_micros(settle)).await
    }

    /// Sets the RAM window for the next writes and moves the address counters to its origin.
    ///
    /// The x bounds must be multiples of 8, and the window must fit within the panel. Neither is
    /// enforced.
    pub async fn set_area(&mut self, spi: &mut HW::Spi, area: Area) -> Result<(), HW::Error> {
        debug!("Setting area to {:?}", area);
        if !area.is_byte_aligned() {
            warn_log!("Area x bounds are not multiples of 8");
        }
        let addressing = self.controller.y_addressing();
        let x_range = area::x_range(&area);
        self.send(spi, Command::SetRamXStartEnd, &x_range).await?;
        self.send(
            spi,
            Command::SetRamYStartEnd,
            &area::y_range(&area, addressing),
        )
        .await?;

        self.send(spi, Command::SetRamXAddressCounter, &area::x_counter(&area))
            .await?;
        self.send(
            spi,
            Command::SetRamYAddressCounter,
            &area::y_counter(&area, addressing),
        )
        .await
    }

    /// Writes packed pixel data into RAM, starting at the address counters.
    ///
    /// Pixels are 1 bit each, 8 per byte with the leftmost pixel in the most significant bit,
    /// rows in order. A set bit is white. The counters advance according to the entry mode.
    pub async fn write_buffer(&mut self, spi: &mut HW::Spi, buffer: &[u8]) -> Result<(), HW::Error> {
        debug!("Writing {} bytes to RAM", buffer.len());
        self.send(spi, Command::WriteRam, buffer).await
    }

    /// Starts a RAM write without any data. Follow with [Self::write_ram_data] to stream pixels in
    /// pieces.
    pub async fn write_ram(&mut self, spi: &mut HW::Spi) -> Result<(), HW::Error> {
        self.send(spi, Command::WriteRam, &[]).await
    }

    /// Sends more pixel data for the RAM write started by [Self::write_ram].
    pub async fn write_ram_data(&mut self, spi: &mut HW::Spi, data: &[u8]) -> Result<(), HW::Error> {
        self.hw.send_data(spi, data).await
    }

    /// Sets the window to `area`, then writes `pixels` into it.
    pub async fn fill_pixels(
        &mut self,
        spi: &mut HW::Spi,
        area: Area,
        pixels: &[u8],
    ) -> Result<(), HW::Error> {
        self.set_area(spi, area).await?;
        self.write_buffer(spi, pixels).await
    }

    /// Fills `area` with a repeated byte, e.g. [COLOR_WHITE], [COLOR_BLACK], or a stripe pattern.
    ///
    /// The data is streamed, so no buffer for the area is needed.
    pub async fn fill(&mut self, spi: &mut HW::Spi, area: Area, pattern: u8) -> Result<(), HW::Error> {
        debug!("Filling {:?} with {:#x}", area, pattern);
        self.set_area(spi, area).await?;
        self.hw
            .send_repeated(spi, Command::WriteRam.register(), pattern, area.byte_len())
            .await
    }

    /// Fills the whole panel with white.
    pub async fn clear(&mut self, spi: &mut HW::Spi) -> Result<(), HW::Error> {
        self.fill(spi, Area::full(self.width, self.height), COLOR_WHITE)
            .await
    }

    /// Puts the controller into deep sleep.
    ///
    /// Leaving deep sleep needs a pulse on the reset line. Without one, the display can't be used
    /// again until it's power cycled, so check [Self::has_reset] first.
    pub async fn sleep(&mut self, spi: &mut HW::Spi) -> Result<(), HW::Error> {
        debug!("Sleeping EPD");
        if !self.has_reset {
            warn_log!("Sleeping without a reset line: the display can't be woken");
        }
        self.send(spi, Command::DeepSleepMode, &[0x01]).await?;
        self.power_state = PowerState::DeepSleep;
        Ok(())
    }

    /// Pulses the reset line (if wired), then clears deep sleep mode.
    ///
    /// A reset pulse returns all registers to their defaults, so initialise again before the next
    /// refresh.
    pub async fn wake(&mut self, spi: &mut HW::Spi) -> Result<(), HW::Error> {
        debug!("Waking EPD");
        if self.has_reset {
            self.reset().await?;
        } else if self.power_state == PowerState::DeepSleep {
            warn_log!("Can't wake from deep sleep without a reset line");
        }

        self.send(spi, Command::DeepSleepMode, &[0x00]).await?;
        self.hw.settle(as_micros(RESET_SETTLE)).await?;
        self.power_state = PowerState::Active;
        Ok(())
    }

    /// Hardware reset the display. Does nothing if no reset line is wired.
    pub async fn reset(&mut self) -> Result<(), HW::Error> {
        let Some(reset) = self.hw.reset() else {
            return Ok(());
        };
        debug!("Resetting EPD");
        reset.set_low()?;
        self.hw.delay().delay_us(as_micros(RESET_SETTLE)).await;
        if let Some(reset) = self.hw.reset() {
            reset.set_high()?;
        }
        self.refresh_state = RefreshState::Uninitialized;
        Ok(())
    }

    /// Resets all commands and parameters to their defaults. Deep sleep mode and RAM contents are
    /// kept.
    pub async fn swreset(&mut self, spi: &mut HW::Spi) -> Result<(), HW::Error> {
        debug!("Software resetting EPD");
        self.send(spi, Command::SwReset, &[]).await?;
        self.refresh_state = RefreshState::Uninitialized;
        Ok(())
    }
}
