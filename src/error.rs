/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

/// Errors in this crate
#[derive(Debug)]
pub enum Error<CommE> {
    /// Sensor communication error
    Comm(CommE),

    /// An enable or reset control pin could not be driven
    Pin,

    /// The sensor did not respond in a timely manner
    Timeout,

    /// Architecture bring-up failed
    Arch(ArchError),

    /// Frame capture failed for a reason other than a timeout
    Capture(CaptureError),
}

/// Outcome of architecture bring-up other than success
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchError {
    /// No free capture resource (state machine, instruction memory, channel)
    ResourceUnavailable,

    /// The requested pins or clocks cannot be served by this backend
    UnsupportedConfiguration(ConfigError),
}

/// Configuration problems detected before any hardware is touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The eight data lines must be consecutive GPIO numbers
    NonContiguousDataPins,

    /// A GPIO number does not fit in the 32-bit input bank
    PinOutOfRange(u8),

    /// XCLK frequency outside the sensor's supported input range
    XclkOutOfRange(u32),

    /// The core clock cannot be divided down to the requested XCLK
    ClockDividerOutOfRange,
}

/// Frame capture failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureError {
    /// `begin` has not completed on this backend
    NotStarted,

    /// The destination cannot hold one frame
    BufferTooSmall { needed: usize },

    /// A sync or data-ready edge did not arrive before the deadline
    Timeout,
}

impl From<ConfigError> for ArchError {
    fn from(err: ConfigError) -> Self {
        ArchError::UnsupportedConfiguration(err)
    }
}

impl<CommE> From<ArchError> for Error<CommE> {
    fn from(err: ArchError) -> Self {
        Error::Arch(err)
    }
}

impl<CommE> From<ConfigError> for Error<CommE> {
    fn from(err: ConfigError) -> Self {
        Error::Arch(err.into())
    }
}

impl<CommE> From<CaptureError> for Error<CommE> {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Timeout => Error::Timeout,
            other => Error::Capture(other),
        }
    }
}
