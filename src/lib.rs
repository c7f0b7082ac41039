/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/
#![cfg_attr(not(test), no_std)]

//! Configuration and capture driver for the OmniVision OV7670 image sensor
//! This imaging sensor has multiple interfaces:
//! - Two-wire SCCB (i2c compatible) for configuration registers
//! - parallel pixel data out (dout)
//! - pixel out sync (vsync, hsync, pix clock)
//! - clock input (xclk), which must run before the sensor answers on SCCB
//!
//! `Ov7670` sequences the sensor over SCCB and is the same on every host.
//! Clock generation and pixel capture differ per MCU and are supplied
//! through an `arch::Arch` backend.

#[cfg(feature = "rttdebug")]
use panic_rtt_core::rprintln;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Read, Write};
use embedded_hal::digital::v2::OutputPin;

pub mod arch;
pub mod color;
pub mod commands;
pub mod config;
pub mod controls;
pub mod error;
pub mod fps;
pub mod geometry;
pub mod regs;

#[cfg(test)]
mod mock;

pub use arch::{Arch, Deadline};
pub use commands::{Colorspace, Command};
pub use config::{Config, ControlPins, NoPin, PinAssignment};
pub use controls::{NightMode, Pattern};
pub use error::{ArchError, CaptureError, ConfigError, Error};
pub use geometry::{Size, Window};
pub use regs::Register;

/// 7-bit SCCB address of the OV7670
pub const DEFAULT_SCCB_ADDRESS: u8 = 0x21;

/// Startup time from the first XCLK edge; assumed similar to tS:REG
const XCLK_SETTLE_MS: u32 = 300;
const POWER_UP_MS: u32 = 300;
const RESET_PULSE_MS: u32 = 1;
/// tS:RESET
const RESET_SETTLE_MS: u32 = 1;
/// tS:REG, about ten frames
const REGISTER_SETTLE_MS: u32 = 300;

/// Main driver struct
pub struct Ov7670<I2C, D> {
    base_address: u8,
    i2c: I2C,
    delay: D,
    xclk_hz: u32,
}

impl<I2C, D, CommE> Ov7670<I2C, D>
where
    I2C: Write<Error = CommE> + Read<Error = CommE>,
    D: DelayMs<u32>,
{
    /// Create a new instance with an SCCB address:
    /// May use DEFAULT_SCCB_ADDRESS if in doubt.
    /// The bus must already be running (100 kHz is typical).
    pub fn new(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            base_address: address,
            i2c,
            delay,
            xclk_hz: config::DEFAULT_XCLK_HZ,
        }
    }

    pub fn default(i2c: I2C, delay: D) -> Self {
        Self::new(i2c, delay, DEFAULT_SCCB_ADDRESS)
    }

    /// XCLK assumed by frame rate calculations
    pub fn xclk_hz(&self) -> u32 {
        self.xclk_hz
    }

    pub fn set_xclk_hz(&mut self, xclk_hz: u32) {
        self.xclk_hz = xclk_hz;
    }

    /// Give back the bus and delay
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Bring up the capture backend, reset the sensor and configure it
    /// for `config`. Returns the achieved frame rate.
    /// Call once per session, before any capture.
    pub fn begin<A, EN, RST>(
        &mut self,
        arch: &mut A,
        pins: &PinAssignment,
        control: &mut ControlPins<EN, RST>,
        config: &Config,
    ) -> Result<f32, Error<CommE>>
    where
        A: Arch,
        EN: OutputPin,
        RST: OutputPin,
    {
        #[cfg(feature = "rttdebug")]
        rprintln!("ov7670 begin");

        config.validate()?;
        self.xclk_hz = config.xclk_hz;
        arch.begin(pins, config)?;

        // nothing stays claimed when the sensor cannot be brought up
        let result = self.configure_sensor(control, config);
        if result.is_err() {
            arch.end();
        }
        result
    }

    /// Power, reset and register setup, with XCLK already running
    fn configure_sensor<EN, RST>(
        &mut self,
        control: &mut ControlPins<EN, RST>,
        config: &Config,
    ) -> Result<f32, Error<CommE>>
    where
        EN: OutputPin,
        RST: OutputPin,
    {
        self.delay.delay_ms(XCLK_SETTLE_MS);

        if let Some(enable) = control.enable.as_mut() {
            // PWDN low enables the sensor
            enable.set_low().map_err(|_| Error::Pin)?;
            self.delay.delay_ms(POWER_UP_MS);
        }

        match control.reset.as_mut() {
            Some(reset) => {
                reset.set_low().map_err(|_| Error::Pin)?;
                self.delay.delay_ms(RESET_PULSE_MS);
                reset.set_high().map_err(|_| Error::Pin)?;
            }
            // soft reset is less reliable than the pin
            None => self.soft_reset()?,
        }
        self.delay.delay_ms(RESET_SETTLE_MS);

        let fps = self.set_fps(config.fps)?;
        self.write_list(config.colorspace.commands())?;
        self.write_list(&commands::INIT)?;
        self.set_size(config.size)?;

        self.delay.delay_ms(REGISTER_SETTLE_MS);

        #[cfg(feature = "rttdebug")]
        rprintln!("ov7670 begin done, {} fps", fps);

        Ok(fps)
    }

    /// Reset all registers to their defaults
    pub fn soft_reset(&mut self) -> Result<(), Error<CommE>> {
        self.write_reg(Register::Com7, regs::COM7_RESET)
    }

    /// (PID, VER)
    pub fn product_id(&mut self) -> Result<(u8, u8), Error<CommE>> {
        let pid = self.read_reg(Register::Pid)?;
        let ver = self.read_reg(Register::Ver)?;
        Ok((pid, ver))
    }

    /// (MIDH, MIDL)
    pub fn manufacturer_id(&mut self) -> Result<(u8, u8), Error<CommE>> {
        let high = self.read_reg(Register::Midh)?;
        let low = self.read_reg(Register::Midl)?;
        Ok((high, low))
    }

    /// Check that an OV7670 answers at this address
    pub fn probe(&mut self) -> Result<bool, Error<CommE>> {
        Ok(self.product_id()? == regs::PRODUCT_ID)
    }

    pub fn read_reg(&mut self, reg: Register) -> Result<u8, Error<CommE>> {
        self.read_reg_u8(reg as u8)
    }

    pub fn write_reg(
        &mut self,
        reg: Register,
        val: u8,
    ) -> Result<(), Error<CommE>> {
        self.write_reg_u8(reg as u8, val)
    }

    /// Replace only the bits in `mask` with those of `bits`,
    /// preserving everything else stored in the register
    pub fn update_reg(
        &mut self,
        reg: Register,
        mask: u8,
        bits: u8,
    ) -> Result<(), Error<CommE>> {
        let current = self.read_reg(reg)?;
        self.write_reg(reg, (current & !mask) | (bits & mask))
    }

    /// Read a u8 from an 8-bit address
    pub fn read_reg_u8(&mut self, reg: u8) -> Result<u8, Error<CommE>> {
        // SCCB has no repeated start: set the address, then read
        let cmd_buf = [reg];
        let mut recv_buf = [0u8];
        self.i2c
            .write(self.base_address, &cmd_buf)
            .map_err(Error::Comm)?;
        self.i2c
            .read(self.base_address, &mut recv_buf)
            .map_err(Error::Comm)?;

        Ok(recv_buf[0])
    }

    /// Write a u8 to an 8-bit address
    pub fn write_reg_u8(
        &mut self,
        reg: u8,
        val: u8,
    ) -> Result<(), Error<CommE>> {
        let write_buf = [reg, val];
        self.i2c
            .write(self.base_address, &write_buf)
            .map_err(Error::Comm)?;
        Ok(())
    }
}
