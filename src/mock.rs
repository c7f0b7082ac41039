/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Test doubles for the bus, delay, pins and capture peripherals.
//! Every fake shares its log with the test through an `Rc`, so the test
//! can inspect what happened after handing the fake to the driver.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Read, Write};
use embedded_hal::digital::v2::OutputPin;

use crate::arch::pcc::ParallelCapture;
use crate::arch::pio::{PioBlock, PioClaim, SmConfig};
use crate::arch::{ClockGenerator, ClockSetting, GpioBank, Interrupts};
use crate::error::ArchError;
use crate::{Ov7670, DEFAULT_SCCB_ADDRESS};

/// Something observable the sequencing core did
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Register, value
    Write(u8, u8),
    Delay(u32),
    /// Pin name, level driven
    Pin(&'static str, bool),
}

/// Injected transport failure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusError;

struct SensorState {
    regs: [u8; 256],
    pointer: u8,
    events: Vec<Event>,
    addresses: Vec<u8>,
    write_budget: Option<usize>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Register file of a simulated sensor plus a log of bus traffic
#[derive(Clone)]
pub struct Harness {
    state: Rc<RefCell<SensorState>>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SensorState {
                regs: [0; 256],
                pointer: 0,
                events: Vec::new(),
                addresses: Vec::new(),
                write_budget: None,
            })),
        }
    }

    pub fn sccb(&self) -> FakeSccb {
        FakeSccb {
            state: Rc::clone(&self.state),
        }
    }

    pub fn delay(&self) -> FakeDelay {
        FakeDelay {
            state: Rc::clone(&self.state),
        }
    }

    pub fn pin(&self, name: &'static str) -> FakePin {
        FakePin {
            name,
            fail: false,
            state: Rc::clone(&self.state),
        }
    }

    /// A pin whose every drive attempt fails
    pub fn failing_pin(&self, name: &'static str) -> FakePin {
        FakePin {
            fail: true,
            ..self.pin(name)
        }
    }

    pub fn driver(&self) -> Ov7670<FakeSccb, FakeDelay> {
        Ov7670::new(self.sccb(), self.delay(), DEFAULT_SCCB_ADDRESS)
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    /// Register writes that reached the sensor, in order
    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Write(reg, val) => Some((*reg, *val)),
                _ => None,
            })
            .collect()
    }

    pub fn delays(&self) -> Vec<u32> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Delay(ms) => Some(*ms),
                _ => None,
            })
            .collect()
    }

    /// Bus address of every transaction
    pub fn addresses(&self) -> Vec<u8> {
        self.state.borrow().addresses.clone()
    }

    pub fn reg(&self, reg: u8) -> u8 {
        self.state.borrow().regs[usize::from(reg)]
    }

    /// Preload a register without logging a write
    pub fn set_reg(&self, reg: u8, val: u8) {
        self.state.borrow_mut().regs[usize::from(reg)] = val;
    }

    /// Let `count` more register writes succeed, then fail every one
    pub fn fail_writes_after(&self, count: usize) {
        self.state.borrow_mut().write_budget = Some(count);
    }

    /// Undo `fail_writes_after`
    pub fn restore_writes(&self) {
        self.state.borrow_mut().write_budget = None;
    }
}

pub struct FakeSccb {
    state: Rc<RefCell<SensorState>>,
}

impl Write for FakeSccb {
    type Error = BusError;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), BusError> {
        let mut state = self.state.borrow_mut();
        state.addresses.push(address);
        match *bytes {
            [reg] => {
                state.pointer = reg;
                Ok(())
            }
            [reg, val] => {
                if let Some(budget) = state.write_budget.as_mut() {
                    if *budget == 0 {
                        return Err(BusError);
                    }
                    *budget -= 1;
                }
                state.regs[usize::from(reg)] = val;
                state.events.push(Event::Write(reg, val));
                Ok(())
            }
            _ => Err(BusError),
        }
    }
}

impl Read for FakeSccb {
    type Error = BusError;

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), BusError> {
        let mut state = self.state.borrow_mut();
        state.addresses.push(address);
        let value = state.regs[usize::from(state.pointer)];
        for byte in buffer.iter_mut() {
            *byte = value;
        }
        Ok(())
    }
}

pub struct FakeDelay {
    state: Rc<RefCell<SensorState>>,
}

impl DelayMs<u32> for FakeDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.state.borrow_mut().events.push(Event::Delay(ms));
    }
}

pub struct FakePin {
    name: &'static str,
    fail: bool,
    state: Rc<RefCell<SensorState>>,
}

impl FakePin {
    fn drive(&mut self, level: bool) -> Result<(), BusError> {
        if self.fail {
            return Err(BusError);
        }
        self.state
            .borrow_mut()
            .events
            .push(Event::Pin(self.name, level));
        Ok(())
    }
}

impl OutputPin for FakePin {
    type Error = BusError;

    fn set_low(&mut self) -> Result<(), BusError> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), BusError> {
        self.drive(true)
    }
}

/// Something a capture peripheral was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// A GPIO input sample and whether interrupts were masked at the time
    Sample { irq_off: bool, value: u32 },
    IrqOff,
    IrqOn,
    ClockStart(u8, ClockSetting),
    ClockStop(u8),
    PccEnable(u8),
    PccDisable,
    /// Block, offset, instructions
    PioLoad(u8, u8, Vec<u16>),
    PioConfigure(SmConfig),
    /// Block, pin mask
    PioBypass(u8, u32),
    PioEnabled(bool),
    /// Block, offset, length
    PioUnload(u8, u8, u8),
    PioRestart,
}

#[derive(Default)]
struct CaptureState {
    events: Vec<CaptureEvent>,
    irq_disabled: bool,
    words_read: usize,
    fail_pcc_enable: bool,
    fail_clock_start: bool,
}

/// Log shared by the capture fakes
#[derive(Clone, Default)]
pub struct CaptureLog {
    state: Rc<RefCell<CaptureState>>,
}

impl CaptureLog {
    pub fn events(&self) -> Vec<CaptureEvent> {
        self.state.borrow().events.clone()
    }

    /// Forget events so far; failure switches are kept
    pub fn clear(&self) {
        self.state.borrow_mut().events.clear();
    }

    pub fn irq_disabled(&self) -> bool {
        self.state.borrow().irq_disabled
    }

    pub fn words_read(&self) -> usize {
        self.state.borrow().words_read
    }

    pub fn fail_pcc_enable(&self) {
        self.state.borrow_mut().fail_pcc_enable = true;
    }

    pub fn fail_clock_start(&self) {
        self.state.borrow_mut().fail_clock_start = true;
    }

    fn push(&self, event: CaptureEvent) {
        self.state.borrow_mut().events.push(event);
    }
}

pub struct FakeIrq {
    log: CaptureLog,
}

impl FakeIrq {
    pub fn new(log: &CaptureLog) -> Self {
        Self { log: log.clone() }
    }
}

impl Interrupts for FakeIrq {
    fn disable(&mut self) {
        self.log.state.borrow_mut().irq_disabled = true;
        self.log.push(CaptureEvent::IrqOff);
    }

    fn enable(&mut self) {
        self.log.state.borrow_mut().irq_disabled = false;
        self.log.push(CaptureEvent::IrqOn);
    }
}

pub struct FakeClock {
    log: CaptureLog,
}

impl FakeClock {
    pub fn new(log: &CaptureLog) -> Self {
        Self { log: log.clone() }
    }
}

impl ClockGenerator for FakeClock {
    fn start(
        &mut self,
        pin: u8,
        setting: &ClockSetting,
    ) -> Result<(), ArchError> {
        if self.log.state.borrow().fail_clock_start {
            return Err(ArchError::ResourceUnavailable);
        }
        self.log.push(CaptureEvent::ClockStart(pin, *setting));
        Ok(())
    }

    fn stop(&mut self, pin: u8) {
        self.log.push(CaptureEvent::ClockStop(pin));
    }
}

/// Parallel capture peripheral that always has data: an incrementing count
pub struct FakePcc {
    log: CaptureLog,
    next: u16,
}

impl FakePcc {
    pub fn new(log: &CaptureLog) -> Self {
        Self {
            log: log.clone(),
            next: 0,
        }
    }
}

impl ParallelCapture for FakePcc {
    fn enable(&mut self, data_base: u8) -> Result<(), ArchError> {
        if self.log.state.borrow().fail_pcc_enable {
            return Err(ArchError::ResourceUnavailable);
        }
        self.log.push(CaptureEvent::PccEnable(data_base));
        Ok(())
    }

    fn disable(&mut self) {
        self.log.push(CaptureEvent::PccDisable);
    }

    fn data_ready(&mut self) -> bool {
        true
    }

    fn read(&mut self) -> u16 {
        let word = self.next;
        self.next = self.next.wrapping_add(1);
        self.log.state.borrow_mut().words_read += 1;
        word
    }
}

/// GPIO bank replaying a script of input samples.
/// Once the script runs out the last sample repeats.
pub struct ScriptedGpio {
    log: CaptureLog,
    samples: VecDeque<u32>,
    last: u32,
}

impl ScriptedGpio {
    pub fn new(log: &CaptureLog, samples: Vec<u32>) -> Self {
        Self {
            log: log.clone(),
            samples: samples.into(),
            last: 0,
        }
    }
}

impl GpioBank for ScriptedGpio {
    fn read_inputs(&mut self) -> u32 {
        if let Some(sample) = self.samples.pop_front() {
            self.last = sample;
        }
        let irq_off = self.log.irq_disabled();
        self.log.push(CaptureEvent::Sample {
            irq_off,
            value: self.last,
        });
        self.last
    }
}

/// PIO block whose RX FIFO is refilled with the next queued frame on
/// every restart
pub struct FakePio {
    log: CaptureLog,
    frames: VecDeque<Vec<u32>>,
    fifo: VecDeque<u32>,
}

impl FakePio {
    pub fn new(log: &CaptureLog, frames: Vec<Vec<u32>>) -> Self {
        Self {
            log: log.clone(),
            frames: frames.into(),
            fifo: VecDeque::new(),
        }
    }
}

impl PioBlock for FakePio {
    fn load(&mut self, block: u8, offset: u8, program: &[u16]) {
        self.log
            .push(CaptureEvent::PioLoad(block, offset, program.to_vec()));
    }

    fn unload(&mut self, block: u8, offset: u8, len: u8) {
        self.log.push(CaptureEvent::PioUnload(block, offset, len));
    }

    fn configure(&mut self, _claim: &PioClaim, config: &SmConfig) {
        self.log.push(CaptureEvent::PioConfigure(*config));
    }

    fn set_input_sync_bypass(&mut self, block: u8, mask: u32) {
        self.log.push(CaptureEvent::PioBypass(block, mask));
    }

    fn set_enabled(&mut self, _claim: &PioClaim, enabled: bool) {
        self.log.push(CaptureEvent::PioEnabled(enabled));
    }

    fn restart(&mut self, _claim: &PioClaim) {
        self.fifo.clear();
        if let Some(frame) = self.frames.pop_front() {
            self.fifo.extend(frame);
        }
        self.log.push(CaptureEvent::PioRestart);
    }

    fn rx_empty(&mut self, _claim: &PioClaim) -> bool {
        self.fifo.is_empty()
    }

    fn rx_read(&mut self, _claim: &PioClaim) -> u32 {
        self.fifo.pop_front().unwrap_or(0)
    }
}
