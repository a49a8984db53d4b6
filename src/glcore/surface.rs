//! Bounds-checked view of one framebuffer band
//!
//! A [`Surface`] is the only way drawing code touches firmware memory.
//! It carries the band's base address, its visible size and the
//! firmware pitch, and every access is checked against the visible
//! size. Rows may be padded past `width`; the padding is only ever
//! touched by [`Surface::clear`].

use core::marker::PhantomData;
use core::ptr;

use embedded_graphics_core::Pixel;
use embedded_graphics_core::draw_target::DrawTarget;
use embedded_graphics_core::geometry::{OriginDimensions, Size};
use embedded_graphics_core::pixelcolor::Rgb888;

use crate::color::Color;

/// Mutable view of a `width` x `height` pixel band
///
/// Only [`FrameBuffer`](crate::FrameBuffer) hands these out; there is
/// no way to build one from an address outside this crate.
///
/// ```compile_fail
/// let mut words = [0u32; 16];
/// let _ = unsafe { glcore::Surface::from_raw(words.as_mut_ptr(), 4, 4, 16) };
/// ```
pub struct Surface<'a> {
    base: *mut u32,
    width: u32,
    height: u32,
    /// Row length in 32-bit words, including padding
    stride: usize,
    _band: PhantomData<&'a mut [u32]>,
}

impl<'a> Surface<'a> {
    /// Wrap a raw band.
    ///
    /// # Safety
    ///
    /// `base` must be 4-byte aligned and valid for reads and writes of
    /// `pitch * height` bytes for `'a`, with no other live reference to
    /// that memory.
    pub(crate) unsafe fn from_raw(base: *mut u32, width: u32, height: u32, pitch: u32) -> Self {
        Self {
            base,
            width,
            height,
            stride: pitch as usize / 4,
            _band: PhantomData,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.stride + x as usize)
    }

    /// Write one pixel. Writes outside the band are dropped.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(i) = self.index(x, y) {
            // SAFETY: index() keeps i below stride * height
            unsafe { ptr::write_volatile(self.base.add(i), color.0) }
        }
    }

    /// Read one pixel. Reads outside the band return [`Color::NONE`].
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Color {
        match self.index(x, y) {
            // SAFETY: index() keeps i below stride * height
            Some(i) => Color(unsafe { ptr::read_volatile(self.base.add(i)) }),
            None => Color::NONE,
        }
    }

    /// Fill the whole band, row padding included.
    pub fn clear(&mut self, color: Color) {
        let words = self.stride * self.height as usize;
        for i in 0..words {
            // SAFETY: the band spans pitch * height bytes
            unsafe { ptr::write_volatile(self.base.add(i), color.0) }
        }
    }
}

// ============================================================================
// embedded-graphics
// ============================================================================

impl OriginDimensions for Surface<'_> {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Surface<'_> {
    type Color = Rgb888;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color.into());
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        Surface::clear(self, color.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Canvas;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::{Line, PrimitiveStyle};

    fn checksum(words: &[u32]) -> u64 {
        words
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, &w)| acc.wrapping_mul(31).wrapping_add(w as u64 ^ i as u64))
    }

    #[test]
    fn test_set_get_round_trip() {
        let mut band = Canvas::new(16, 8);
        let mut s = band.surface();

        for y in 0..8 {
            for x in 0..16 {
                let c = Color::rgb(x as u8 * 10, y as u8 * 20, 7);
                s.set_pixel(x, y, c);
                assert_eq!(s.get_pixel(x, y), c);
            }
        }
    }

    #[test]
    fn test_out_of_bounds_write_is_dropped() {
        let mut band = Canvas::new(16, 8);
        band.surface().clear(Color::BLUE);
        let before = checksum(&band.words);

        let mut s = band.surface();
        for &(x, y) in &[(-1, 0), (0, -1), (16, 0), (0, 8), (16, 8), (i32::MIN, i32::MAX), (100, 3)] {
            s.set_pixel(x, y, Color::RED);
        }

        assert_eq!(checksum(&band.words), before);
    }

    #[test]
    fn test_out_of_bounds_read_is_sentinel() {
        let mut band = Canvas::new(4, 4);
        let mut s = band.surface();
        s.clear(Color::WHITE);

        assert_eq!(s.get_pixel(-1, 0), Color::NONE);
        assert_eq!(s.get_pixel(4, 0), Color::NONE);
        assert_eq!(s.get_pixel(0, 4), Color::NONE);
        assert_eq!(s.get_pixel(3, 3), Color::WHITE);
    }

    #[test]
    fn test_padding_is_not_visible() {
        // Column 16 lies in the row padding: not addressable by (x, y)
        let mut band = Canvas::new(16, 4);
        let stride = band.stride;
        let mut s = band.surface();
        s.set_pixel(16, 0, Color::RED);

        assert!(stride > 16);
        assert_eq!(band.words[16], 0);
    }

    #[test]
    fn test_clear_fills_padding() {
        let mut band = Canvas::new(16, 4);
        band.surface().clear(Color::GRAY);
        assert!(band.words.iter().all(|&w| w == Color::GRAY.0));
    }

    #[test]
    fn test_embedded_graphics_draws_through() {
        let mut band = Canvas::new(16, 8);
        let mut s = band.surface();

        Line::new(Point::new(0, 2), Point::new(30, 2))
            .into_styled(PrimitiveStyle::with_stroke(Rgb888::WHITE, 1))
            .draw(&mut s)
            .unwrap();

        assert_eq!(s.size(), Size::new(16, 8));
        for x in 0..16 {
            assert_eq!(s.get_pixel(x, 2), Color::WHITE);
        }
        assert_eq!(s.get_pixel(0, 1), Color(0));
    }
}
