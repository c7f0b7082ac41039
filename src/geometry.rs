/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Output size, window placement and the scaler registers derived from them.

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Read, Write};

use crate::regs::*;
use crate::{Error, Ov7670};

// Array format: VGA, Active 640 H x 480 V
pub const MAX_FRAME_WIDTH: u16 = 640;
pub const MAX_FRAME_HEIGHT: u16 = 480;
/// Total pixel clocks per line; horizontal timing wraps around at this count
pub const LINE_LENGTH: u16 = 784;

/// Output size as a downsample factor of the VGA array
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    /// 640 x 480
    Div1 = 0,
    /// 320 x 240
    Div2 = 1,
    /// 160 x 120
    Div4 = 2,
    /// 80 x 60
    Div8 = 3,
    /// 40 x 30, downsample 1:8 plus 0.5 digital zoom
    Div16 = 4,
}

impl Size {
    pub const ALL: [Size; 5] = [
        Size::Div1,
        Size::Div2,
        Size::Div4,
        Size::Div8,
        Size::Div16,
    ];

    /// Power of two by which the array is reduced
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn width(self) -> u16 {
        MAX_FRAME_WIDTH >> self.level()
    }

    pub fn height(self) -> u16 {
        MAX_FRAME_HEIGHT >> self.level()
    }

    /// Empirically determined window placement for this size
    pub fn window(self) -> Window {
        match self {
            Size::Div1 => Window::new(9, 162, 2, 2),
            Size::Div2 => Window::new(10, 174, 4, 2),
            Size::Div4 => Window::new(11, 186, 2, 2),
            Size::Div8 => Window::new(12, 210, 0, 2),
            Size::Div16 => Window::new(15, 252, 3, 2),
        }
    }
}

/// Window start offsets and pixel timing adjustments.
/// Kept apart from `Size` so calibration code can try other values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub vstart: u8,
    pub hstart: u16,
    /// HREF edge offset, two bits
    pub edge_offset: u8,
    pub pclk_delay: u8,
}

impl Window {
    pub const fn new(
        vstart: u8,
        hstart: u16,
        edge_offset: u8,
        pclk_delay: u8,
    ) -> Self {
        Self {
            vstart,
            hstart,
            edge_offset,
            pclk_delay,
        }
    }

    pub fn vstop(&self) -> u16 {
        u16::from(self.vstart) + MAX_FRAME_HEIGHT
    }

    pub fn hstop(&self) -> u16 {
        let stop = u32::from(self.hstart) + u32::from(MAX_FRAME_WIDTH);
        (stop % u32::from(LINE_LENGTH)) as u16
    }
}

/// Register values for one size/window combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameControl {
    pub com3: u8,
    pub com14: u8,
    pub dcwctr: u8,
    pub pclk_div: u8,
    /// Scale bits for SCALING_XSC and SCALING_YSC (test pattern bit excluded)
    pub zoom: u8,
    pub hstart: u8,
    pub hstop: u8,
    pub href: u8,
    pub vstart: u8,
    pub vstop: u8,
    pub vref: u8,
    pub pclk_delay: u8,
}

impl FrameControl {
    pub fn new(size: Size, window: &Window) -> Self {
        let level = size.level();
        let downsampled = size != Size::Div1;

        let mut com3 = if downsampled { COM3_DCWEN } else { 0 };
        if size == Size::Div16 {
            com3 |= COM3_SCALEEN;
        }
        // PCLK divider 2,4,8,16 = 0x19 - 0x1C
        let com14 = if downsampled { 0x18 + level } else { 0 };
        // H and V downsample ratio, 1:8 max
        let dcwctr = level.min(Size::Div8.level()) * 0x11;
        let pclk_div = if downsampled { 0xf0 + level } else { 0x08 };
        // 0.5 zoom at 1:16, downsample only otherwise
        let zoom = if size == Size::Div16 { 0x40 } else { 0x20 };

        let vstart = u16::from(window.vstart);
        let vstop = window.vstop();
        let hstart = window.hstart;
        let hstop = window.hstop();

        Self {
            com3,
            com14,
            dcwctr,
            pclk_div,
            zoom,
            hstart: (hstart >> 3) as u8,
            hstop: (hstop >> 3) as u8,
            href: ((window.edge_offset & 0b11) << 6)
                | (((hstop & 0b111) as u8) << 3)
                | (hstart & 0b111) as u8,
            vstart: (vstart >> 2) as u8,
            vstop: (vstop >> 2) as u8,
            vref: (((vstop & 0b11) as u8) << 2) | (vstart & 0b11) as u8,
            pclk_delay: window.pclk_delay,
        }
    }
}

impl<I2C, D, CommE> Ov7670<I2C, D>
where
    I2C: Write<Error = CommE> + Read<Error = CommE>,
    D: DelayMs<u32>,
{
    /// Program scaling and window registers for `size` with explicit placement
    pub fn frame_control(
        &mut self,
        size: Size,
        window: &Window,
    ) -> Result<(), Error<CommE>> {
        let fc = FrameControl::new(size, window);

        self.write_reg(Register::Com3, fc.com3)?;
        self.write_reg(Register::Com14, fc.com14)?;
        self.write_reg(Register::ScalingDcwctr, fc.dcwctr)?;
        self.write_reg(Register::ScalingPclkDiv, fc.pclk_div)?;

        // test pattern selection shares these registers
        self.update_reg(Register::ScalingXsc, !SCALING_TEST_PATTERN, fc.zoom)?;
        self.update_reg(Register::ScalingYsc, !SCALING_TEST_PATTERN, fc.zoom)?;

        self.write_reg(Register::Hstart, fc.hstart)?;
        self.write_reg(Register::Hstop, fc.hstop)?;
        self.write_reg(Register::Href, fc.href)?;
        self.write_reg(Register::Vstart, fc.vstart)?;
        self.write_reg(Register::Vstop, fc.vstop)?;
        self.write_reg(Register::Vref, fc.vref)?;

        self.write_reg(Register::ScalingPclkDelay, fc.pclk_delay)
    }

    /// Program the output size using its calibrated window
    pub fn set_size(&mut self, size: Size) -> Result<(), Error<CommE>> {
        self.frame_control(size, &size.window())
    }
}
