//! A recording fake of the display hardware.
//!
//! Every SPI write is decoded into command frames using the shared D/C state, so tests can assert
//! on the exact command sequence the driver produces, alongside reset pulses and delays.

#![allow(dead_code)]

use std::{cell::RefCell, convert::Infallible, rc::Rc, vec::Vec};

use embedded_hal::digital::{ErrorType as PinErrorType, InputPin, OutputPin};
use embedded_hal_async::{
    delay::DelayNs,
    digital::Wait,
    spi::{ErrorType as SpiErrorType, Operation, SpiDevice},
};
use epd_bw_spi::{Command, EpdHw};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
#[error("fake hardware error")]
pub struct FakeError;

impl From<Infallible> for FakeError {
    fn from(e: Infallible) -> Self {
        match e {}
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command { command: u8, data: Vec<u8> },
    ResetLow,
    ResetHigh,
    DelayUs(u32),
    BusyWait,
}

#[derive(Debug, Default)]
struct State {
    dc_high: bool,
    busy: bool,
    transactions: usize,
    events: Vec<Event>,
}

/// Shared view of everything the fake hardware has seen.
#[derive(Debug, Default, Clone)]
pub struct Recorder(Rc<RefCell<State>>);

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().events.clone()
    }

    pub fn clear(&self) {
        let mut state = self.0.borrow_mut();
        state.events.clear();
        state.transactions = 0;
    }

    /// SPI transactions started so far.
    pub fn transactions(&self) -> usize {
        self.0.borrow().transactions
    }

    /// All command frames, in order.
    pub fn commands(&self) -> Vec<(u8, Vec<u8>)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Command { command, data } => Some((command, data)),
                _ => None,
            })
            .collect()
    }

    /// Command bytes only, in order.
    pub fn command_bytes(&self) -> Vec<u8> {
        self.commands().into_iter().map(|(c, _)| c).collect()
    }

    /// Payloads of every frame for `command`.
    pub fn payloads(&self, command: Command) -> Vec<Vec<u8>> {
        self.commands()
            .into_iter()
            .filter(|(c, _)| *c == command.register())
            .map(|(_, data)| data)
            .collect()
    }

    pub fn count(&self, command: Command) -> usize {
        self.payloads(command).len()
    }

    pub fn delays_us(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::DelayUs(us) => Some(us),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.0.borrow_mut().events.push(event);
    }

    fn write(&self, bytes: &[u8]) {
        let mut state = self.0.borrow_mut();
        if state.dc_high {
            match state.events.iter_mut().rev().find_map(|event| match event {
                Event::Command { data, .. } => Some(data),
                _ => None,
            }) {
                Some(data) => data.extend_from_slice(bytes),
                None => panic!("data sent before any command"),
            }
        } else {
            for &command in bytes {
                // The controller raises busy while it runs a master activation.
                if command == Command::MasterActivation.register() {
                    state.busy = true;
                }
                state.events.push(Event::Command {
                    command,
                    data: Vec::new(),
                });
            }
        }
    }
}

pub struct FakeSpi(Recorder);

impl SpiErrorType for FakeSpi {
    type Error = Infallible;
}

impl SpiDevice for FakeSpi {
    async fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), Self::Error> {
        self.0 .0.borrow_mut().transactions += 1;
        for operation in operations {
            match operation {
                Operation::Write(bytes) => self.0.write(bytes),
                Operation::Transfer(read, write) => {
                    self.0.write(write);
                    read.fill(0);
                }
                Operation::TransferInPlace(bytes) => {
                    self.0.write(bytes);
                    bytes.fill(0);
                }
                Operation::Read(bytes) => bytes.fill(0),
                Operation::DelayNs(_) => {}
            }
        }
        Ok(())
    }
}

pub struct FakeDc(Recorder);

impl PinErrorType for FakeDc {
    type Error = Infallible;
}

impl OutputPin for FakeDc {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0 .0.borrow_mut().dc_high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0 .0.borrow_mut().dc_high = true;
        Ok(())
    }
}

pub struct FakeReset(Recorder);

impl PinErrorType for FakeReset {
    type Error = Infallible;
}

impl OutputPin for FakeReset {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.push(Event::ResetLow);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.push(Event::ResetHigh);
        Ok(())
    }
}

/// Reads high after a master activation until it's waited on.
pub struct FakeBusy(Recorder);

impl PinErrorType for FakeBusy {
    type Error = Infallible;
}

impl InputPin for FakeBusy {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0 .0.borrow().busy)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0 .0.borrow().busy)
    }
}

impl Wait for FakeBusy {
    async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
        self.0 .0.borrow_mut().busy = true;
        Ok(())
    }

    async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
        let mut state = self.0 .0.borrow_mut();
        state.busy = false;
        state.events.push(Event::BusyWait);
        Ok(())
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
        self.wait_for_high().await
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
        self.wait_for_low().await
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

pub struct FakeDelay(Recorder);

impl DelayNs for FakeDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.0.push(Event::DelayUs(ns / 1000));
    }

    async fn delay_us(&mut self, us: u32) {
        self.0.push(Event::DelayUs(us));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.0.push(Event::DelayUs(ms.saturating_mul(1000)));
    }
}

pub struct FakeHw {
    dc: FakeDc,
    reset: Option<FakeReset>,
    busy: Option<FakeBusy>,
    delay: FakeDelay,
}

impl EpdHw for FakeHw {
    type Spi = FakeSpi;
    type Dc = FakeDc;
    type Reset = FakeReset;
    type Busy = FakeBusy;
    type Delay = FakeDelay;
    type Error = FakeError;

    fn dc(&mut self) -> &mut Self::Dc {
        &mut self.dc
    }

    fn reset(&mut self) -> Option<&mut Self::Reset> {
        self.reset.as_mut()
    }

    fn busy(&mut self) -> Option<&mut Self::Busy> {
        self.busy.as_mut()
    }

    fn delay(&mut self) -> &mut Self::Delay {
        &mut self.delay
    }
}

/// Which optional lines are wired.
#[derive(Debug, Clone, Copy)]
pub struct Wiring {
    pub reset: bool,
    pub busy: bool,
}

pub const RESET_ONLY: Wiring = Wiring {
    reset: true,
    busy: false,
};
pub const NOTHING: Wiring = Wiring {
    reset: false,
    busy: false,
};
pub const RESET_AND_BUSY: Wiring = Wiring {
    reset: true,
    busy: true,
};

pub fn fake_hw(wiring: Wiring) -> (FakeHw, FakeSpi, Recorder) {
    let recorder = Recorder::default();
    let hw = FakeHw {
        dc: FakeDc(recorder.clone()),
        reset: wiring.reset.then(|| FakeReset(recorder.clone())),
        busy: wiring.busy.then(|| FakeBusy(recorder.clone())),
        delay: FakeDelay(recorder.clone()),
    };
    (hw, FakeSpi(recorder.clone()), recorder)
}
