//! Packed 32-bit colors
//!
//! Pixels are stored as `0xAARRGGBB` with the alpha byte always `0xFF`.
//! Opacity only exists at draw time: [`Color::blend`] mixes two opaque
//! colors channel by channel and returns another opaque color.

use embedded_graphics_core::pixelcolor::{Rgb888, RgbColor};

/// An opaque ARGB8888 pixel value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0xFF00_0000);
    pub const WHITE: Color = Color(0xFFFF_FFFF);
    pub const RED: Color = Color(0xFFFF_0000);
    pub const GREEN: Color = Color(0xFF00_FF00);
    pub const BLUE: Color = Color(0xFF00_00FF);
    pub const CYAN: Color = Color(0xFF00_FFFF);
    pub const MAGENTA: Color = Color(0xFFFF_00FF);
    pub const YELLOW: Color = Color(0xFFFF_FF00);
    pub const INDIGO: Color = Color(0xFF4B_0082);
    pub const GRAY: Color = Color(0xFF80_8080);
    pub const DARK_GRAY: Color = Color(0xFF40_4040);

    /// Value returned for reads outside the drawable area. Not a real
    /// color: its alpha byte is zero.
    pub const NONE: Color = Color(0);

    /// Pack an opaque color from its channels
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(0xFF00_0000 | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    #[inline]
    pub const fn red(self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    #[inline]
    pub const fn green(self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    #[inline]
    pub const fn blue(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Paint `over` on top of `self` with the given opacity.
    ///
    /// Each channel becomes `round(over * opacity + self * (1 - opacity))`.
    /// The opacity is clamped to `[0, 1]` and every channel result is
    /// clamped to `[0, 255]`, so out-of-range weights saturate instead of
    /// bleeding into the neighbouring channel.
    pub fn blend(self, over: Color, opacity: f64) -> Color {
        let opacity = opacity.clamp(0.0, 1.0);
        let mix = |new: u8, old: u8| -> u8 {
            let v = libm::floor(new as f64 * opacity + old as f64 * (1.0 - opacity) + 0.5);
            v.clamp(0.0, 255.0) as u8
        };

        Color::rgb(
            mix(over.red(), self.red()),
            mix(over.green(), self.green()),
            mix(over.blue(), self.blue()),
        )
    }
}

impl From<Rgb888> for Color {
    fn from(c: Rgb888) -> Self {
        Color::rgb(c.r(), c.g(), c.b())
    }
}

impl From<Color> for Rgb888 {
    fn from(c: Color) -> Self {
        Rgb888::new(c.red(), c.green(), c.blue())
    }
}
