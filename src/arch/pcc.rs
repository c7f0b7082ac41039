/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Polling backend for MCUs with a parallel capture controller (PCC):
//! the peripheral latches two pixels per transfer on PCLK, and the CPU
//! paces rows and frames by watching VSYNC and HSYNC levels.

use super::{
    frame_slice, wait_level, Arch, ClockGenerator, ClockSetting, Deadline,
    GpioBank, InterruptGuard, Interrupts, SyncMasks,
};
use crate::config::{Config, PinAssignment};
use crate::error::{ArchError, CaptureError};

#[cfg(feature = "rttdebug")]
use panic_rtt_core::rprintln;

/// Parallel capture peripheral sampling the data lines on PCLK
pub trait ParallelCapture {
    /// Claim the peripheral and bind 8 data lines starting at `data_base`
    fn enable(&mut self, data_base: u8) -> Result<(), ArchError>;
    fn disable(&mut self);
    /// A received word is waiting
    fn data_ready(&mut self) -> bool;
    /// Two pixels' worth of data
    fn read(&mut self) -> u16;
}

struct PccState {
    masks: SyncMasks,
    xclk: u8,
    deadline: Deadline,
}

/// Capture backend for a parallel capture controller
pub struct PccCapture<C, P, G, I> {
    clock: C,
    pcc: P,
    gpio: G,
    irq: I,
    core_clock_hz: u32,
    state: Option<PccState>,
}

impl<C, P, G, I> PccCapture<C, P, G, I>
where
    C: ClockGenerator,
    P: ParallelCapture,
    G: GpioBank,
    I: Interrupts,
{
    pub fn new(
        clock: C,
        pcc: P,
        gpio: G,
        irq: I,
        core_clock_hz: u32,
    ) -> Self {
        Self {
            clock,
            pcc,
            gpio,
            irq,
            core_clock_hz,
            state: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.state.is_some()
    }

    /// Return the peripherals, ending any active session first
    pub fn release(mut self) -> (C, P, G, I) {
        self.end();
        (self.clock, self.pcc, self.gpio, self.irq)
    }
}

impl<C, P, G, I> Arch for PccCapture<C, P, G, I>
where
    C: ClockGenerator,
    P: ParallelCapture,
    G: GpioBank,
    I: Interrupts,
{
    fn begin(
        &mut self,
        pins: &PinAssignment,
        config: &Config,
    ) -> Result<(), ArchError> {
        if self.state.is_some() {
            return Err(ArchError::ResourceUnavailable);
        }
        pins.validate()?;
        let setting =
            ClockSetting::for_xclk(self.core_clock_hz, config.xclk_hz)?;

        // XCLK must run before the sensor will talk SCCB
        self.clock.start(pins.xclk, &setting)?;
        if let Err(err) = self.pcc.enable(pins.data_base()) {
            self.clock.stop(pins.xclk);
            return Err(err);
        }

        #[cfg(feature = "rttdebug")]
        rprintln!(
            "pcc xclk {} Hz on gpio {}",
            setting.output_hz(self.core_clock_hz),
            pins.xclk
        );

        self.state = Some(PccState {
            masks: SyncMasks::new(pins),
            xclk: pins.xclk,
            deadline: config.deadline,
        });
        Ok(())
    }

    fn words_per_frame(&self, width: u16, height: u16) -> usize {
        usize::from(width / 2) * usize::from(height)
    }

    fn capture(
        &mut self,
        dest: &mut [u16],
        width: u16,
        height: u16,
    ) -> Result<(), CaptureError> {
        let (masks, deadline) = match &self.state {
            Some(state) => (state.masks, state.deadline),
            None => return Err(CaptureError::NotStarted),
        };
        let row_words = usize::from(width / 2);
        let needed = self.words_per_frame(width, height);
        let frame = frame_slice(dest, needed)?;
        if needed == 0 {
            return Ok(());
        }

        let gpio = &mut self.gpio;
        let pcc = &mut self.pcc;

        // let any frame in flight finish
        wait_level(gpio, masks.vsync, false, deadline)?;

        // An interrupt landing here could make us miss the start of frame
        let _guard = InterruptGuard::new(&mut self.irq);
        wait_level(gpio, masks.vsync, true, deadline)?;

        for row in frame.chunks_exact_mut(row_words) {
            wait_level(gpio, masks.hsync, false, deadline)?;
            wait_level(gpio, masks.hsync, true, deadline)?;
            for word in row.iter_mut() {
                deadline.wait(|| pcc.data_ready())?;
                *word = pcc.read();
            }
        }
        Ok(())
    }

    fn end(&mut self) {
        if let Some(state) = self.state.take() {
            self.pcc.disable();
            self.clock.stop(state.xclk);
        }
    }
}
