/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Capture backends.
//!
//! The sequencing core in `Ov7670` is device agnostic. Everything that
//! depends on the host's peripherals lives behind [`Arch`]:
//! - generating XCLK for the sensor (it will not answer SCCB without it)
//! - binding the pixel data lines to something that samples on PCLK
//! - reading a frame out of that peripheral, paced by VSYNC/HSYNC
//!
//! Two backends are provided: [`pcc::PccCapture`] polls a parallel
//! capture peripheral, [`pio::PioCapture`] runs a small sampling program
//! on a programmable I/O block. Both are assembled from the peripheral
//! traits in this module, which a HAL crate implements.

pub mod clock;
pub mod pcc;
pub mod pio;

use crate::config::{Config, PinAssignment};
use crate::error::{ArchError, CaptureError};

pub use clock::{ClockGenerator, ClockSetting};

/// Capability interface implemented once per target architecture
pub trait Arch {
    /// One-time bring-up: start XCLK, claim and configure the capture
    /// peripheral. Must succeed before `capture`.
    fn begin(
        &mut self,
        pins: &PinAssignment,
        config: &Config,
    ) -> Result<(), ArchError>;

    /// Number of 16-bit words one `width` x `height` frame occupies
    fn words_per_frame(&self, width: u16, height: u16) -> usize;

    /// Block until one full frame has been stored in `dest`
    fn capture(
        &mut self,
        dest: &mut [u16],
        width: u16,
        height: u16,
    ) -> Result<(), CaptureError>;

    /// Release everything claimed by `begin`
    fn end(&mut self);
}

/// How long an edge wait may spin before giving up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Wait forever. A stalled sensor or a miswired pin hangs the caller.
    Unbounded,
    /// Give up after this many polls of the signal
    Polls(u32),
}

impl Default for Deadline {
    fn default() -> Self {
        Deadline::Unbounded
    }
}

impl Deadline {
    /// Spin on `ready` until it returns true or the deadline passes
    pub fn wait<F>(self, mut ready: F) -> Result<(), CaptureError>
    where
        F: FnMut() -> bool,
    {
        match self {
            Deadline::Unbounded => {
                while !ready() {
                    core::hint::spin_loop();
                }
                Ok(())
            }
            Deadline::Polls(limit) => {
                for _ in 0..limit {
                    if ready() {
                        return Ok(());
                    }
                }
                Err(CaptureError::Timeout)
            }
        }
    }
}

/// Raw view of the GPIO input register holding the sync lines
pub trait GpioBank {
    /// One bit per pin, bit n for GPIO n
    fn read_inputs(&mut self) -> u32;
}

/// Masking of the interrupts that could delay edge detection
pub trait Interrupts {
    fn disable(&mut self);
    fn enable(&mut self);
}

/// Keeps interrupts disabled for its lifetime
pub struct InterruptGuard<'a, I: Interrupts> {
    irq: &'a mut I,
}

impl<'a, I: Interrupts> InterruptGuard<'a, I> {
    pub fn new(irq: &'a mut I) -> Self {
        irq.disable();
        Self { irq }
    }
}

impl<'a, I: Interrupts> Drop for InterruptGuard<'a, I> {
    fn drop(&mut self) {
        self.irq.enable();
    }
}

/// Bit masks for the sync and data lines within the input bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncMasks {
    pub vsync: u32,
    pub hsync: u32,
    pub pclk: u32,
    pub data: u32,
}

impl SyncMasks {
    /// Pins must already have passed `PinAssignment::validate`
    pub fn new(pins: &PinAssignment) -> Self {
        Self {
            vsync: 1 << pins.vsync,
            hsync: 1 << pins.hsync,
            pclk: 1 << pins.pclk,
            data: 0xff << pins.data_base(),
        }
    }
}

/// Wait for the masked input line to read `high`
pub(crate) fn wait_level<G: GpioBank>(
    gpio: &mut G,
    mask: u32,
    high: bool,
    deadline: Deadline,
) -> Result<(), CaptureError> {
    deadline.wait(|| (gpio.read_inputs() & mask != 0) == high)
}

/// Checks common to every backend's `capture`
pub(crate) fn frame_slice(
    dest: &mut [u16],
    needed: usize,
) -> Result<&mut [u16], CaptureError> {
    if dest.len() < needed {
        return Err(CaptureError::BufferTooSmall { needed });
    }
    Ok(&mut dest[..needed])
}
