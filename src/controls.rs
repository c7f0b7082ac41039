/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Night mode, flip and test pattern selection.
//! Each one owns a few bits of a register shared with other settings
//! (reserved bits, black sun, scaling), so they read-modify-write.

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Read, Write};

use crate::regs::*;
use crate::{Error, Ov7670};

/// Night mode trades frame rate for less grainy low-light images.
/// The sensor may still run faster than the selected ratio when the
/// scene is bright enough.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NightMode {
    Off = 0,
    /// Frame rate reduced to 1/2
    Half = 1,
    /// Frame rate reduced to 1/4
    Quarter = 2,
    /// Frame rate reduced to 1/8
    Eighth = 3,
}

impl NightMode {
    /// COM11[7:5] pattern
    pub fn bits(self) -> u8 {
        const NIGHT_BITS: [u8; 4] =
            [0b0000_0000, 0b1010_0000, 0b1100_0000, 0b1110_0000];
        NIGHT_BITS[self as usize]
    }
}

/// Built-in test patterns.
/// Selected by one bit each in SCALING_XSC and SCALING_YSC.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    None = 0,
    /// Shifting "1"
    Shifting1 = 1,
    /// Eight vertical color bars
    ColorBar = 2,
    /// Color bars fading to gray
    FadeToGray = 3,
}

impl Pattern {
    /// (SCALING_XSC, SCALING_YSC) test pattern bits
    pub fn bits(self) -> (u8, u8) {
        let select = self as u8;
        let x = if select & 0b01 != 0 { SCALING_TEST_PATTERN } else { 0 };
        let y = if select & 0b10 != 0 { SCALING_TEST_PATTERN } else { 0 };
        (x, y)
    }
}

/// MVFP mirror/flip bits
pub fn flip_bits(flip_x: bool, flip_y: bool) -> u8 {
    let mut bits = 0;
    if flip_x {
        bits |= MVFP_MIRROR;
    }
    if flip_y {
        bits |= MVFP_VFLIP;
    }
    bits
}

impl<I2C, D, CommE> Ov7670<I2C, D>
where
    I2C: Write<Error = CommE> + Read<Error = CommE>,
    D: DelayMs<u32>,
{
    pub fn set_night_mode(
        &mut self,
        mode: NightMode,
    ) -> Result<(), Error<CommE>> {
        self.update_reg(Register::Com11, COM11_NIGHT_MASK, mode.bits())
    }

    /// Horizontal (mirror) and vertical flip.
    /// Mirrored output may need a different window to stay centered.
    pub fn set_flip(
        &mut self,
        flip_x: bool,
        flip_y: bool,
    ) -> Result<(), Error<CommE>> {
        self.update_reg(
            Register::Mvfp,
            MVFP_MIRROR | MVFP_VFLIP,
            flip_bits(flip_x, flip_y),
        )
    }

    pub fn set_test_pattern(
        &mut self,
        pattern: Pattern,
    ) -> Result<(), Error<CommE>> {
        let (x, y) = pattern.bits();
        self.update_reg(Register::ScalingXsc, SCALING_TEST_PATTERN, x)?;
        self.update_reg(Register::ScalingYsc, SCALING_TEST_PATTERN, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::Harness;

    const NIGHT_MODES: [NightMode; 4] = [
        NightMode::Off,
        NightMode::Half,
        NightMode::Quarter,
        NightMode::Eighth,
    ];

    const PATTERNS: [Pattern; 4] = [
        Pattern::None,
        Pattern::Shifting1,
        Pattern::ColorBar,
        Pattern::FadeToGray,
    ];

    #[test]
    fn night_mode_keeps_low_bits_for_every_initial_value() {
        for &mode in NIGHT_MODES.iter() {
            for initial in 0..=255u8 {
                let harness = Harness::new();
                harness.set_reg(Register::Com11 as u8, initial);
                let mut cam = harness.driver();
                cam.set_night_mode(mode).unwrap();

                let after = harness.reg(Register::Com11 as u8);
                assert_eq!(
                    after & !COM11_NIGHT_MASK,
                    initial & !COM11_NIGHT_MASK
                );
                assert_eq!(after & COM11_NIGHT_MASK, mode.bits());
            }
        }
    }

    #[test]
    fn night_bits_match_datasheet() {
        let bits: Vec<u8> = NIGHT_MODES.iter().map(|m| m.bits()).collect();
        assert_eq!(bits, vec![0x00, 0xa0, 0xc0, 0xe0]);
    }

    #[test]
    fn flip_keeps_reserved_and_black_sun_bits() {
        let owned = MVFP_MIRROR | MVFP_VFLIP;
        let flips =
            [(false, false), (true, false), (false, true), (true, true)];
        for &(x, y) in flips.iter() {
            for initial in 0..=255u8 {
                let harness = Harness::new();
                harness.set_reg(Register::Mvfp as u8, initial);
                let mut cam = harness.driver();
                cam.set_flip(x, y).unwrap();

                let after = harness.reg(Register::Mvfp as u8);
                assert_eq!(after & !owned, initial & !owned);
                assert_eq!(after & MVFP_MIRROR != 0, x);
                assert_eq!(after & MVFP_VFLIP != 0, y);
            }
        }
    }

    #[test]
    fn test_pattern_keeps_scaling_bits() {
        for &pattern in PATTERNS.iter() {
            for initial in 0..=255u8 {
                let harness = Harness::new();
                harness.set_reg(Register::ScalingXsc as u8, initial);
                harness.set_reg(
                    Register::ScalingYsc as u8,
                    initial.rotate_left(3),
                );
                let mut cam = harness.driver();
                cam.set_test_pattern(pattern).unwrap();

                let xsc = harness.reg(Register::ScalingXsc as u8);
                let ysc = harness.reg(Register::ScalingYsc as u8);
                assert_eq!(xsc & 0x7f, initial & 0x7f);
                assert_eq!(ysc & 0x7f, initial.rotate_left(3) & 0x7f);
                assert_eq!((xsc & 0x80, ysc & 0x80), pattern.bits());
            }
        }
    }

    #[test]
    fn pattern_bits_split_across_registers() {
        assert_eq!(Pattern::None.bits(), (0, 0));
        assert_eq!(Pattern::Shifting1.bits(), (0x80, 0));
        assert_eq!(Pattern::ColorBar.bits(), (0, 0x80));
        assert_eq!(Pattern::FadeToGray.bits(), (0x80, 0x80));
    }

    #[test]
    fn geometry_after_pattern_keeps_pattern() {
        let harness = Harness::new();
        let mut cam = harness.driver();
        cam.set_test_pattern(Pattern::FadeToGray).unwrap();
        cam.set_size(crate::Size::Div4).unwrap();
        assert_eq!(harness.reg(Register::ScalingXsc as u8), 0x80 | 0x20);
        assert_eq!(harness.reg(Register::ScalingYsc as u8), 0x80 | 0x20);
    }
}
