/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! Session configuration and the pin assignment shared with capture backends.

use core::convert::Infallible;

use embedded_hal::digital::v2::OutputPin;

use crate::arch::Deadline;
use crate::commands::Colorspace;
use crate::error::ConfigError;
use crate::geometry::Size;

/// XCLK fed to the sensor when nothing else is configured
pub const DEFAULT_XCLK_HZ: u32 = 24_000_000;
/// Input clock range accepted by the sensor
pub const MIN_XCLK_HZ: u32 = 10_000_000;
pub const MAX_XCLK_HZ: u32 = 48_000_000;

/// Pins are sampled through a single 32-bit input bank
pub const GPIO_BANK_WIDTH: u8 = 32;

/// Number of parallel data lines
pub const DATA_PINS: usize = 8;

/// Desired stream settings passed to `Ov7670::begin`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub colorspace: Colorspace,
    pub size: Size,
    /// Requested frames per second; the achieved rate is returned by `begin`
    pub fps: f32,
    pub xclk_hz: u32,
    /// Limit applied to every edge wait during capture
    pub deadline: Deadline,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            colorspace: Colorspace::Rgb565,
            size: Size::Div1,
            fps: 30.0,
            xclk_hz: DEFAULT_XCLK_HZ,
            deadline: Deadline::Unbounded,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_colorspace(mut self, colorspace: Colorspace) -> Self {
        self.colorspace = colorspace;
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn with_fps(mut self, fps: f32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_xclk_hz(mut self, xclk_hz: u32) -> Self {
        self.xclk_hz = xclk_hz;
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_XCLK_HZ..=MAX_XCLK_HZ).contains(&self.xclk_hz) {
            return Err(ConfigError::XclkOutOfRange(self.xclk_hz));
        }
        Ok(())
    }
}

/// GPIO numbers wired to the sensor's clock, sync and data lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinAssignment {
    /// Clock output to the sensor
    pub xclk: u8,
    pub hsync: u8,
    pub vsync: u8,
    /// Pixel clock from the sensor
    pub pclk: u8,
    /// D0 - D7, least significant bit first
    pub data: [u8; DATA_PINS],
}

impl PinAssignment {
    /// Assignment with the data lines on `data_base .. data_base + 8`
    pub fn new(
        xclk: u8,
        hsync: u8,
        vsync: u8,
        pclk: u8,
        data_base: u8,
    ) -> Self {
        let mut data = [0u8; DATA_PINS];
        for (bit, pin) in data.iter_mut().enumerate() {
            *pin = data_base.wrapping_add(bit as u8);
        }
        Self {
            xclk,
            hsync,
            vsync,
            pclk,
            data,
        }
    }

    /// First data line; the capture peripherals bind all eight from here
    pub fn data_base(&self) -> u8 {
        self.data[0]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let singles = [self.xclk, self.hsync, self.vsync, self.pclk];
        if let Some(&pin) = singles
            .iter()
            .chain(self.data.iter())
            .find(|&&pin| pin >= GPIO_BANK_WIDTH)
        {
            return Err(ConfigError::PinOutOfRange(pin));
        }
        let contiguous = self
            .data
            .windows(2)
            .all(|pair| pair[1] == pair[0].wrapping_add(1));
        if !contiguous {
            return Err(ConfigError::NonContiguousDataPins);
        }
        Ok(())
    }
}

/// Optional power-down and reset lines. Boards that hard-wire either
/// line use `NoPin` in its place.
pub struct ControlPins<EN, RST> {
    /// PWDN, driven low to enable the sensor
    pub enable: Option<EN>,
    /// RESET, active low
    pub reset: Option<RST>,
}

impl<EN, RST> ControlPins<EN, RST>
where
    EN: OutputPin,
    RST: OutputPin,
{
    pub fn new(enable: Option<EN>, reset: Option<RST>) -> Self {
        Self { enable, reset }
    }
}

impl ControlPins<NoPin, NoPin> {
    /// Neither line is connected; a soft reset is used instead
    pub fn none() -> Self {
        Self {
            enable: None,
            reset: None,
        }
    }
}

/// Placeholder for an unconnected control line
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPin;

impl OutputPin for NoPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
