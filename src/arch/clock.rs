/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

use crate::error::{ArchError, ConfigError};

/// PWM-style counter wrap: two counts per XCLK period
const WRAP: u16 = 1;
/// Compare level for 50% duty at `WRAP`
const LEVEL: u16 = 1;
/// Divider is 8.4 fixed point
const FRAC_BITS: u32 = 4;
const MIN_DIV_FIXED: u32 = 1 << FRAC_BITS;
const MAX_DIV_FIXED: u32 = (256 << FRAC_BITS) - 1;

/// Clock generator settings that produce XCLK from the core clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSetting {
    pub div_int: u8,
    /// Sixteenths
    pub div_frac: u8,
    pub wrap: u16,
    pub level: u16,
}

impl ClockSetting {
    /// Fixed 50% duty setting closest to (not below) `xclk_hz`.
    /// The divider is truncated, so the output may run slightly fast.
    pub fn for_xclk(core_hz: u32, xclk_hz: u32) -> Result<Self, ConfigError> {
        if xclk_hz == 0 {
            return Err(ConfigError::ClockDividerOutOfRange);
        }
        let periods = u64::from(WRAP) + 1;
        let fixed = (u64::from(core_hz) << FRAC_BITS)
            / (u64::from(xclk_hz) * periods);
        if fixed < u64::from(MIN_DIV_FIXED)
            || fixed > u64::from(MAX_DIV_FIXED)
        {
            return Err(ConfigError::ClockDividerOutOfRange);
        }
        let fixed = fixed as u32;
        Ok(Self {
            div_int: (fixed >> FRAC_BITS) as u8,
            div_frac: (fixed & ((1 << FRAC_BITS) - 1)) as u8,
            wrap: WRAP,
            level: LEVEL,
        })
    }

    /// Frequency actually produced from `core_hz`
    pub fn output_hz(&self, core_hz: u32) -> u32 {
        let fixed =
            (u64::from(self.div_int) << FRAC_BITS) | u64::from(self.div_frac);
        let periods = u64::from(self.wrap) + 1;
        ((u64::from(core_hz) << FRAC_BITS) / (fixed * periods)) as u32
    }
}

/// Peripheral that drives XCLK on a pin
pub trait ClockGenerator {
    fn start(
        &mut self,
        pin: u8,
        setting: &ClockSetting,
    ) -> Result<(), ArchError>;
    fn stop(&mut self, pin: u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rp2040_core_clock_gives_about_24mhz() {
        let setting = ClockSetting::for_xclk(125_000_000, 24_000_000).unwrap();
        assert_eq!((setting.div_int, setting.div_frac), (2, 9));
        assert_eq!((setting.wrap, setting.level), (1, 1));
        assert_eq!(setting.output_hz(125_000_000), 24_390_243);
    }

    #[test]
    fn exact_division() {
        let setting = ClockSetting::for_xclk(48_000_000, 12_000_000).unwrap();
        assert_eq!((setting.div_int, setting.div_frac), (2, 0));
        assert_eq!(setting.output_hz(48_000_000), 12_000_000);
    }

    #[test]
    fn output_never_below_request() {
        for &core in [48_000_000u32, 120_000_000, 125_000_000, 133_000_000]
            .iter()
        {
            for xclk in (10..=24).map(|mhz| mhz * 1_000_000) {
                let setting = ClockSetting::for_xclk(core, xclk).unwrap();
                let out = setting.output_hz(core);
                assert!(out >= xclk, "{} {} {}", core, xclk, out);
                // within one sixteenth of a divider step
                assert!(u64::from(out) * 16 < u64::from(xclk) * 17);
            }
        }
    }

    #[test]
    fn core_too_slow_for_xclk() {
        assert_eq!(
            ClockSetting::for_xclk(24_000_000, 24_000_000),
            Err(ConfigError::ClockDividerOutOfRange)
        );
    }

    #[test]
    fn core_too_fast_for_divider() {
        assert!(ClockSetting::for_xclk(u32::MAX, 10_000).is_err());
        assert!(ClockSetting::for_xclk(125_000_000, 0).is_err());
    }
}
