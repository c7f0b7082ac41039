/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Frame rate selection.
//!
//! The pixel clock (PCLK), and with it the frame rate, is derived from
//! XCLK through a PLL multiplier and an integer divider (1 - 32).
//! There is no fixed table of rates because the reachable set depends
//! on the XCLK the host can generate. The search below tries every
//! multiplier/divider permutation and keeps the fastest rate that does
//! not exceed the request. It runs once at startup, so the brute force
//! approach is fine.

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Read, Write};

use crate::regs::{Register, CLKRC_EXT};
use crate::{Error, Ov7670};

#[cfg(feature = "rttdebug")]
use panic_rtt_core::rprintln;

/// Highest frame rate the sensor supports
pub const MAX_FPS: f32 = 30.0;

/// Pixel clocks per VGA frame, including blanking
pub const PCLK_PER_FRAME: u32 = 800_000;

/// PLL multipliers selectable through DBLV[7:6]
pub const PLL_RATIOS: [u8; 4] = [1, 4, 6, 8];

/// Largest CLKRC divider (stored as divider - 1)
pub const MAX_DIVIDER: u8 = 32;

/// A resolved PLL/divider pair and the frame rate it produces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockSelection {
    /// Index into `PLL_RATIOS`
    pub pll_index: u8,
    pub divider: u8,
    /// Achieved frames per second
    pub fps: f32,
}

impl ClockSelection {
    fn new(xclk_hz: u32, pll_index: u8, divider: u8) -> Self {
        let pclk = pclk_hz(xclk_hz, pll_index, divider);
        Self {
            pll_index,
            divider,
            fps: fps_for_pclk(pclk),
        }
    }

    pub fn pll_ratio(&self) -> u8 {
        PLL_RATIOS[self.pll_index as usize]
    }

    /// Multiplier and divider cancel out; XCLK can drive PCLK directly
    pub fn is_bypass(&self) -> bool {
        self.pll_ratio() == self.divider
    }

    /// DBLV register value
    pub fn dblv(&self) -> u8 {
        if self.is_bypass() {
            0
        } else {
            self.pll_index << 6
        }
    }

    /// CLKRC register value
    pub fn clkrc(&self) -> u8 {
        if self.is_bypass() {
            CLKRC_EXT
        } else {
            self.divider - 1
        }
    }

    pub fn pclk_hz(&self, xclk_hz: u32) -> u32 {
        pclk_hz(xclk_hz, self.pll_index, self.divider)
    }
}

fn pclk_hz(xclk_hz: u32, pll_index: u8, divider: u8) -> u32 {
    let ratio = u64::from(PLL_RATIOS[pll_index as usize]);
    (u64::from(xclk_hz) * ratio / u64::from(divider)) as u32
}

fn fps_for_pclk(pclk_hz: u32) -> f32 {
    pclk_hz as f32 / PCLK_PER_FRAME as f32
}

/// Slowest configuration: no multiplication, maximum division
pub fn floor(xclk_hz: u32) -> ClockSelection {
    ClockSelection::new(xclk_hz, 0, MAX_DIVIDER)
}

/// Pick the PLL/divider pair whose frame rate is closest to, without
/// exceeding, `fps` (capped at `MAX_FPS`). Requests below the floor
/// return the floor, which is then faster than requested. A NaN request
/// is treated as below the floor.
/// Touches no hardware.
pub fn resolve(xclk_hz: u32, fps: f32) -> ClockSelection {
    let slowest = floor(xclk_hz);
    if fps.is_nan() || fps < slowest.fps {
        return slowest;
    }
    let fps = if fps > MAX_FPS { MAX_FPS } else { fps };

    let mut best: Option<ClockSelection> = None;
    for pll_index in 0..PLL_RATIOS.len() as u8 {
        // divide-by-1 only makes sense without the PLL
        let first_div = if pll_index == 0 { 1 } else { 2 };
        for divider in first_div..=MAX_DIVIDER {
            let candidate = ClockSelection::new(xclk_hz, pll_index, divider);
            if candidate.fps > fps {
                continue;
            }
            // strictly faster only, so the earliest permutation wins ties
            if best.map_or(true, |b| candidate.fps > b.fps) {
                best = Some(candidate);
            }
        }
    }
    best.unwrap_or(slowest)
}

impl<I2C, D, CommE> Ov7670<I2C, D>
where
    I2C: Write<Error = CommE> + Read<Error = CommE>,
    D: DelayMs<u32>,
{
    /// Configure the sensor clock tree for `fps` and return the achieved rate.
    /// Use `fps::resolve` to evaluate a rate without touching the sensor.
    pub fn set_fps(&mut self, fps: f32) -> Result<f32, Error<CommE>> {
        let selection = resolve(self.xclk_hz, fps);

        #[cfg(feature = "rttdebug")]
        rprintln!(
            "ov7670 pll x{} div {} -> {} fps",
            selection.pll_ratio(),
            selection.divider,
            selection.fps
        );

        self.write_reg(Register::Dblv, selection.dblv())?;
        self.write_reg(Register::Clkrc, selection.clkrc())?;
        Ok(selection.fps)
    }
}
