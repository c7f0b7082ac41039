/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Register command lists and the player that writes them to the sensor.

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Read, Write};

use crate::regs::*;
use crate::{Error, Ov7670};

#[cfg(feature = "rttdebug")]
use panic_rtt_core::rprintln;

/// Settling time after every list write.
/// The sensor locks up during init without it.
pub const SETTLE_DELAY_MS: u32 = 1;

/// One (register, value) write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub reg: u8,
    pub value: u8,
}

impl Command {
    /// Terminator for sentinel-delimited lists
    pub const END: Command = Command::raw(0xff, 0xff);

    pub const fn new(reg: Register, value: u8) -> Self {
        Self::raw(reg as u8, value)
    }

    /// For reserved registers that have no name in the datasheet
    pub const fn raw(reg: u8, value: u8) -> Self {
        Self { reg, value }
    }

    pub fn is_end(&self) -> bool {
        *self == Self::END
    }
}

/// Output pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colorspace {
    Rgb565,
    Yuv,
}

impl Colorspace {
    /// Commands selecting this output format
    pub fn commands(self) -> &'static [Command] {
        match self {
            Colorspace::Rgb565 => &RGB565,
            Colorspace::Yuv => &YUV,
        }
    }
}

/// Manual output format, RGB565 with full 0-255 range
pub static RGB565: [Command; 3] = [
    Command::new(Register::Com7, COM7_RGB),
    Command::new(Register::Rgb444, 0),
    Command::new(Register::Com15, COM15_RGB565 | COM15_R00FF),
];

/// Manual output format, YUV with full output range
pub static YUV: [Command; 2] = [
    Command::new(Register::Com7, COM7_YUV),
    Command::new(Register::Com15, COM15_R00FF),
];

const fn gamma(point: u8, value: u8) -> Command {
    Command::raw(Register::GamBase as u8 + point, value)
}

/// Tuning applied after reset: gamma, AEC/AGC, AWB, color matrix.
/// Values are empirical; the reserved registers are undocumented.
pub static INIT: [Command; 97] = [
    Command::new(Register::Tslb, TSLB_YLAST), // no auto window
    Command::new(Register::Com10, COM10_VS_NEG),
    Command::new(Register::Slop, 0x20),
    gamma(0, 0x1c),
    gamma(1, 0x28),
    gamma(2, 0x3c),
    gamma(3, 0x55),
    gamma(4, 0x68),
    gamma(5, 0x76),
    gamma(6, 0x80),
    gamma(7, 0x88),
    gamma(8, 0x8f),
    gamma(9, 0x96),
    gamma(10, 0xa3),
    gamma(11, 0xaf),
    gamma(12, 0xc4),
    gamma(13, 0xd7),
    gamma(14, 0xe8),
    Command::new(
        Register::Com8,
        COM8_FASTAEC | COM8_AECSTEP | COM8_BANDING,
    ),
    Command::new(Register::Gain, 0x00),
    Command::new(Register::Aech, 0x00),
    Command::new(Register::Com4, 0x00),
    Command::new(Register::Com9, 0x20), // max AGC value
    Command::new(Register::Bd50max, 0x05),
    Command::new(Register::Bd60max, 0x07),
    Command::new(Register::Aew, 0x75),
    Command::new(Register::Aeb, 0x63),
    Command::new(Register::Vpt, 0xa5),
    Command::new(Register::Haecc1, 0x78),
    Command::new(Register::Haecc2, 0x68),
    Command::raw(0xa1, 0x03),
    // histogram-based AEC/AGC
    Command::new(Register::Haecc3, 0xdf),
    Command::new(Register::Haecc4, 0xdf),
    Command::new(Register::Haecc5, 0xf0),
    Command::new(Register::Haecc6, 0x90),
    Command::new(Register::Haecc7, 0x94),
    Command::new(
        Register::Com8,
        COM8_FASTAEC | COM8_AECSTEP | COM8_BANDING | COM8_AGC | COM8_AEC,
    ),
    Command::new(Register::Com5, 0x61),
    Command::new(Register::Com6, 0x4b),
    Command::raw(0x16, 0x02),
    Command::new(Register::Mvfp, 0x07),
    Command::new(Register::Adcctr1, 0x02),
    Command::new(Register::Adcctr2, 0x91),
    Command::raw(0x29, 0x07),
    Command::new(Register::Chlf, 0x0b),
    Command::raw(0x35, 0x0b),
    Command::new(Register::Adc, 0x1d),
    Command::new(Register::Acom, 0x71),
    Command::new(Register::Ofon, 0x2a),
    Command::new(Register::Com12, 0x78),
    Command::raw(0x4d, 0x40),
    Command::raw(0x4e, 0x20),
    Command::new(Register::Gfix, 0x5d),
    Command::new(Register::Reg74, 0x19),
    Command::raw(0x8d, 0x4f),
    Command::raw(0x8e, 0x00),
    Command::raw(0x8f, 0x00),
    Command::raw(0x90, 0x00),
    Command::raw(0x91, 0x00),
    Command::new(Register::DmLnl, 0x00),
    Command::raw(0x96, 0x00),
    Command::raw(0x9a, 0x80),
    Command::raw(0xb0, 0x84),
    Command::new(Register::Ablc1, 0x0c),
    Command::raw(0xb2, 0x0e),
    Command::new(Register::ThlSt, 0x82),
    Command::raw(0xb8, 0x0a),
    Command::new(Register::Awbc1, 0x14),
    Command::new(Register::Awbc2, 0xf0),
    Command::new(Register::Awbc3, 0x34),
    Command::new(Register::Awbc4, 0x58),
    Command::new(Register::Awbc5, 0x28),
    Command::new(Register::Awbc6, 0x3a),
    Command::raw(0x59, 0x88),
    Command::raw(0x5a, 0x88),
    Command::raw(0x5b, 0x44),
    Command::raw(0x5c, 0x67),
    Command::raw(0x5d, 0x49),
    Command::raw(0x5e, 0x0e),
    Command::new(Register::Lcc3, 0x04),
    Command::new(Register::Lcc4, 0x20),
    Command::new(Register::Lcc5, 0x05),
    Command::new(Register::Lcc6, 0x04),
    Command::new(Register::Lcc7, 0x08),
    Command::new(Register::Awbctr3, 0x0a),
    Command::new(Register::Awbctr2, 0x55),
    Command::new(Register::Mtx1, 0x80),
    Command::new(Register::Mtx2, 0x80),
    Command::new(Register::Mtx3, 0x00),
    Command::new(Register::Mtx4, 0x22),
    Command::new(Register::Mtx5, 0x5e),
    Command::new(Register::Mtx6, 0x80),
    Command::new(Register::Awbctr1, 0x11),
    Command::new(Register::Awbctr0, 0x9f), // 0x9e for advanced AWB
    Command::new(Register::Bright, 0x00),
    Command::new(Register::Contras, 0x40),
    Command::new(Register::ContrasCenter, 0x80),
];

impl<I2C, D, CommE> Ov7670<I2C, D>
where
    I2C: Write<Error = CommE> + Read<Error = CommE>,
    D: DelayMs<u32>,
{
    /// Write every command in order, settling after each one
    pub fn write_list(
        &mut self,
        commands: &[Command],
    ) -> Result<(), Error<CommE>> {
        for cmd in commands {
            self.write_settled(cmd)?;
        }
        Ok(())
    }

    /// Write commands up to (not including) the first `Command::END`.
    /// Prefer `write_list`: 0xFF is a real register on related sensors.
    pub fn write_list_terminated(
        &mut self,
        commands: &[Command],
    ) -> Result<(), Error<CommE>> {
        for cmd in commands.iter().take_while(|cmd| !cmd.is_end()) {
            self.write_settled(cmd)?;
        }
        Ok(())
    }

    fn write_settled(&mut self, cmd: &Command) -> Result<(), Error<CommE>> {
        #[cfg(feature = "rttdebug")]
        rprintln!("write reg {:02X} = {:02X}", cmd.reg, cmd.value);

        self.write_reg_u8(cmd.reg, cmd.value)?;
        self.delay.delay_ms(SETTLE_DELAY_MS);
        Ok(())
    }
}
