/*
Copyright (c) 2020 Todd Stellanova
LICENSE: BSD3 (see LICENSE file)
*/

/// Convert captured YUV words to grayscale RGB565 in place, for preview
/// on a TFT. The Y byte is the low byte of each word; output is
/// big-endian like the input.
pub fn y_to_rgb565(pixels: &mut [u16]) {
    for pixel in pixels.iter_mut() {
        let y = *pixel & 0xff;
        let rgb = ((y >> 3) * 0x801) | ((y & 0xfc) << 3);
        *pixel = rgb.swap_bytes();
    }
}
