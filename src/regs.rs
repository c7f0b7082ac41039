/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

//! OV7670 register addresses and the bit fields this driver touches.
//! Addresses follow the OmniVision datasheet naming.

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// AGC gain bits [7:0]
    Gain = 0x00,
    /// Frame vertical window start/end low bits
    Vref = 0x03,
    Com2 = 0x09,
    /// Product id MSB (read only)
    Pid = 0x0a,
    /// Product id LSB (read only)
    Ver = 0x0b,
    Com3 = 0x0c,
    Com4 = 0x0d,
    Com5 = 0x0e,
    Com6 = 0x0f,
    /// Exposure value bits [9:2]
    Aech = 0x10,
    /// Internal clock prescaler
    Clkrc = 0x11,
    Com7 = 0x12,
    Com8 = 0x13,
    Com9 = 0x14,
    Com10 = 0x15,
    /// Horizontal frame start high bits
    Hstart = 0x17,
    /// Horizontal frame end high bits
    Hstop = 0x18,
    /// Vertical frame start high bits
    Vstart = 0x19,
    /// Vertical frame end high bits
    Vstop = 0x1a,
    /// Manufacturer id MSB (read only)
    Midh = 0x1c,
    /// Manufacturer id LSB (read only)
    Midl = 0x1d,
    /// Mirror / vertical flip
    Mvfp = 0x1e,
    Adcctr1 = 0x21,
    Adcctr2 = 0x22,
    /// AGC/AEC stable operating region, upper limit
    Aew = 0x24,
    /// AGC/AEC stable operating region, lower limit
    Aeb = 0x25,
    /// AGC/AEC fast mode operating region
    Vpt = 0x26,
    /// HREF control: edge offset and horizontal window low bits
    Href = 0x32,
    /// Array current control
    Chlf = 0x33,
    Adc = 0x37,
    Acom = 0x38,
    Ofon = 0x39,
    /// Line buffer test option
    Tslb = 0x3a,
    Com11 = 0x3b,
    Com12 = 0x3c,
    Com14 = 0x3e,
    Com15 = 0x40,
    Awbc1 = 0x43,
    Awbc2 = 0x44,
    Awbc3 = 0x45,
    Awbc4 = 0x46,
    Awbc5 = 0x47,
    Awbc6 = 0x48,
    Mtx1 = 0x4f,
    Mtx2 = 0x50,
    Mtx3 = 0x51,
    Mtx4 = 0x52,
    Mtx5 = 0x53,
    Mtx6 = 0x54,
    Bright = 0x55,
    Contras = 0x56,
    ContrasCenter = 0x57,
    Lcc3 = 0x64,
    Lcc4 = 0x65,
    Lcc5 = 0x66,
    /// Fix gain control
    Gfix = 0x69,
    /// PLL control
    Dblv = 0x6b,
    Awbctr3 = 0x6c,
    Awbctr2 = 0x6d,
    Awbctr1 = 0x6e,
    Awbctr0 = 0x6f,
    /// Horizontal scale factor; bit 7 is test pattern [0]
    ScalingXsc = 0x70,
    /// Vertical scale factor; bit 7 is test pattern [1]
    ScalingYsc = 0x71,
    /// Downsample control
    ScalingDcwctr = 0x72,
    /// DSP scale clock divider
    ScalingPclkDiv = 0x73,
    Reg74 = 0x74,
    /// Gamma curve highest segment slope
    Slop = 0x7a,
    /// First of fifteen gamma curve points (GAM1 - GAM15)
    GamBase = 0x7b,
    Rgb444 = 0x8c,
    /// Dummy line low bits
    DmLnl = 0x92,
    Lcc6 = 0x94,
    Lcc7 = 0x95,
    Haecc1 = 0x9f,
    Haecc2 = 0xa0,
    /// Scaling output delay
    ScalingPclkDelay = 0xa2,
    Bd50max = 0xa5,
    Haecc3 = 0xa6,
    Haecc4 = 0xa7,
    Haecc5 = 0xa8,
    Haecc6 = 0xa9,
    Haecc7 = 0xaa,
    Bd60max = 0xab,
    Ablc1 = 0xb1,
    /// ABLC target
    ThlSt = 0xb3,
}

/// Expected product id (PID, VER)
pub const PRODUCT_ID: (u8, u8) = (0x76, 0x73);
/// Expected manufacturer id (MIDH, MIDL)
pub const MANUFACTURER_ID: (u8, u8) = (0x7f, 0xa2);

pub const CLKRC_EXT: u8 = 0x40;

pub const COM3_SCALEEN: u8 = 0x08;
pub const COM3_DCWEN: u8 = 0x04;

pub const COM7_RESET: u8 = 0x80;
pub const COM7_RGB: u8 = 0x04;
pub const COM7_YUV: u8 = 0x00;

pub const COM8_FASTAEC: u8 = 0x80;
pub const COM8_AECSTEP: u8 = 0x40;
pub const COM8_BANDING: u8 = 0x20;
pub const COM8_AGC: u8 = 0x04;
pub const COM8_AEC: u8 = 0x01;

pub const COM10_VS_NEG: u8 = 0x02;

/// Night mode field, COM11[7:5]
pub const COM11_NIGHT_MASK: u8 = 0b1110_0000;

pub const COM15_RGB565: u8 = 0x10;
/// Full 0x00 - 0xFF output range
pub const COM15_R00FF: u8 = 0xc0;

pub const MVFP_MIRROR: u8 = 0x20;
pub const MVFP_VFLIP: u8 = 0x10;

/// Test pattern bit carried in both SCALING_XSC and SCALING_YSC
pub const SCALING_TEST_PATTERN: u8 = 0x80;

pub const TSLB_YLAST: u8 = 0x04;
