use bitflags::bitflags;

/// Low-level commands shared by the IL3829 and SSD1673 controller families. You probably want to
/// use the methods exposed on [crate::EpdBwSpi] for most operations, but can send commands
/// directly with [crate::EpdBwSpi::send] for low-level control or experimentation.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Sets the number of gate lines (panel rows - 1) and the scanning sequence.
    DriverOutputControl = 0x01,
    GateDrivingVoltageControl = 0x03,
    SourceDrivingVoltageControl = 0x04,
    DisplayControl = 0x07,
    GateAndSourceNonOverlapPeriodControl = 0x0B,
    /// Configures the on chip voltage booster: three phase bytes.
    BoosterSoftStartControl = 0x0C,
    GateScanStartPosition = 0x0F,
    /// Enters (`0x01`) or leaves (`0x00`) deep sleep mode. Leaving deep sleep requires a hardware
    /// reset pulse first.
    DeepSleepMode = 0x10,
    /// Changes the auto-increment behaviour of the address counter, see [DataEntryMode].
    DataEntryModeSetting = 0x11,
    /// Resets all commands and parameters to default values, except deep sleep mode and RAM.
    SwReset = 0x12,
    TemperatureSensorControlWrite = 0x1A,
    TemperatureSensorControlRead = 0x1B,
    TemperatureSensorControlWriteCommand = 0x1C,
    TemperatureSensorControlLoad = 0x1D,
    /// Runs the sequence configured with [Command::DisplayUpdateControl2]. This operation must
    /// not be interrupted.
    MasterActivation = 0x20,
    DisplayUpdateControl1 = 0x21,
    /// Configures the sequence run by [Command::MasterActivation], see [UpdateSequence].
    DisplayUpdateControl2 = 0x22,
    /// Writes data to RAM, starting at the address counters and auto-incrementing them according
    /// to the data entry mode.
    WriteRam = 0x24,
    ReadRam = 0x25,
    VcomSense = 0x28,
    VcomSenseDuration = 0x29,
    ProgramVcomOtp = 0x2A,
    /// Writes the VCOM register. One byte, taken from [crate::Controller::vcom].
    WriteVcomRegister = 0x2C,
    ReadOtpRegisters = 0x2D,
    ProgramWsOtp = 0x30,
    /// Writes the waveform LUT register.
    WriteLutRegister = 0x32,
    ReadLutRegister = 0x33,
    ProgramOtpSelection = 0x36,
    OtpSelectionControl = 0x37,
    SetDummyLinePeriod = 0x3A,
    SetGateLineWidth = 0x3B,
    BorderWaveformControl = 0x3C,
    /// Sets the start and end positions of the X axis for the auto-incrementing address counter.
    /// Start and end are inclusive, and are in units of bytes (8 pixels).
    SetRamXStartEnd = 0x44,
    /// Sets the start and end positions of the Y axis for the auto-incrementing address counter.
    /// Start and end are inclusive. Each bound is one byte on controllers with at most 255 rows,
    /// two bytes (little-endian, 9 bits) otherwise.
    SetRamYStartEnd = 0x45,
    /// Sets the current x address counter (in bytes).
    SetRamXAddressCounter = 0x4E,
    /// Sets the current y address counter.
    SetRamYAddressCounter = 0x4F,
    /// Does nothing, but can be used to terminate other commands such as [Command::WriteRam].
    Nop = 0xFF,
}

impl Command {
    /// Returns the register address for this command.
    pub fn register(&self) -> u8 {
        *self as u8
    }
}

bitflags! {
    /// The steps run on the next [Command::MasterActivation], as written with
    /// [Command::DisplayUpdateControl2].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UpdateSequence: u8 {
        const ENABLE_CLOCK = 0b1000_0000;
        /// Enables the charge pump.
        const ENABLE_ANALOG = 0b0100_0000;
        const LOAD_TEMPERATURE = 0b0010_0000;
        const LOAD_LUT = 0b0001_0000;
        const INITIAL_DISPLAY = 0b0000_1000;
        /// Drives the RAM contents onto the panel using the loaded LUT.
        const DISPLAY_PATTERN = 0b0000_0100;
        const DISABLE_ANALOG = 0b0000_0010;
        const DISABLE_CLOCK = 0b0000_0001;
    }
}

impl UpdateSequence {
    /// Clock and charge pump on: `0xC0`.
    pub const ACTIVATE: Self = Self::ENABLE_CLOCK.union(Self::ENABLE_ANALOG);
    /// Charge pump and clock off: `0x03`.
    pub const DEACTIVATE: Self = Self::DISABLE_ANALOG.union(Self::DISABLE_CLOCK);
    /// A full refresh powers everything up itself: `0xC4`.
    pub const FULL_UPDATE: Self = Self::ACTIVATE.union(Self::DISPLAY_PATTERN);
    /// A partial refresh relies on [Self::ACTIVATE] having run already: `0x04`.
    pub const PARTIAL_UPDATE: Self = Self::DISPLAY_PATTERN;
}

/// Data entry mode settings.
///
/// This setting affects the automatic increment/decrement of the address counters after each
/// byte written to RAM. The X counter always moves first.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DataEntryMode {
    YDecrementXDecrement = 0b00,
    YDecrementXIncrement = 0b01,
    YIncrementXDecrement = 0b10,
    /// Rows top to bottom, each row left to right.
    #[default]
    YIncrementXIncrement = 0b11,
}

impl DataEntryMode {
    pub fn bits(&self) -> u8 {
        *self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_sequences_match_register_values() {
        assert_eq!(UpdateSequence::ACTIVATE.bits(), 0xC0);
        assert_eq!(UpdateSequence::DEACTIVATE.bits(), 0x03);
        assert_eq!(UpdateSequence::FULL_UPDATE.bits(), 0xC4);
        assert_eq!(UpdateSequence::PARTIAL_UPDATE.bits(), 0x04);
    }

    #[test]
    fn test_default_entry_mode_increments_both_axes() {
        assert_eq!(DataEntryMode::default().bits(), 0b11);
    }
}
