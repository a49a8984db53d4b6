//! Software rasterizer
//!
//! Drawing primitives on top of [`Surface`]. Everything here goes
//! through `set_pixel`/`get_pixel`, so clipping is inherited from the
//! surface and nothing can write outside the band.

use core::mem::swap;

use embedded_graphics_core::geometry::Point;

use crate::color::Color;
use crate::font::FontProvider;
use crate::surface::Surface;

/// Round half up, the way the scanline fill expects.
#[inline]
fn round(v: f64) -> i32 {
    libm::floor(v + 0.5) as i32
}

impl Surface<'_> {
    // ========================================================================
    // Pixels and Rectangles
    // ========================================================================

    /// Paint `color` over the current pixel with `opacity` in `[0, 1]`.
    #[inline]
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color, opacity: f64) {
        let under = self.get_pixel(x, y);
        self.set_pixel(x, y, under.blend(color, opacity));
    }

    /// Fill `[x, x + w) x [y, y + h)`, clipped to the band.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width() as i32);
        let y1 = y.saturating_add(h).min(self.height() as i32);

        for py in y0..y1 {
            for px in x0..x1 {
                self.set_pixel(px, py, color);
            }
        }
    }

    /// Fill the `width` x `width` square centered on (`x`, `y`).
    ///
    /// The square covers `[x - width/2, x + width/2)` on both axes, so an
    /// odd width loses its last column and row.
    pub fn draw_centered_square(&mut self, x: i32, y: i32, width: i32, color: Color) {
        let half = width / 2;
        self.fill_rect(x - half, y - half, 2 * half, 2 * half, color);
    }

    // ========================================================================
    // Text
    // ========================================================================

    /// Draw one character with its top-left corner at (`x`, `y`).
    ///
    /// Characters the font has no glyph for draw nothing.
    pub fn draw_char<F: FontProvider>(&mut self, font: &F, x: i32, y: i32, ch: char, color: Color) {
        let Some(glyph) = font.glyph(ch) else {
            return;
        };

        for row in 0..font.glyph_height() {
            for col in 0..font.glyph_width() {
                if glyph.is_set(col, row) {
                    self.set_pixel(x + col as i32, y + row as i32, color);
                }
            }
        }
    }

    /// Draw `text` left to right, one glyph width per character.
    pub fn draw_string<F: FontProvider>(&mut self, font: &F, x: i32, y: i32, text: &str, color: Color) {
        let advance = font.glyph_width() as i32;
        let mut cx = x;
        for ch in text.chars() {
            self.draw_char(font, cx, y, ch, color);
            cx += advance;
        }
    }

    // ========================================================================
    // Lines
    // ========================================================================

    /// Anti-aliased line from (`x1`, `y1`) to (`x2`, `y2`), endpoints included.
    ///
    /// Xiaolin Wu's algorithm: walk the major axis one pixel at a time
    /// and split each step's coverage between the two pixels straddling
    /// the exact minor-axis coordinate. Only the stretch of the major
    /// axis that lies inside the band is walked.
    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        let (mut x1, mut y1, mut x2, mut y2) = (x1, y1, x2, y2);

        // Differences of two i32s need 33 bits
        let steep = (y2 as i64 - y1 as i64).abs() > (x2 as i64 - x1 as i64).abs();
        if steep {
            swap(&mut x1, &mut y1);
            swap(&mut x2, &mut y2);
        }
        if x2 < x1 {
            swap(&mut x1, &mut x2);
            swap(&mut y1, &mut y2);
        }

        let slope = if x1 == x2 {
            1.0
        } else {
            (y2 as i64 - y1 as i64) as f64 / (x2 as i64 - x1 as i64) as f64
        };

        let extent = (if steep { self.height() } else { self.width() }) as i32;
        let first = x1.max(0);
        let last = x2.min(extent - 1);
        if first > last {
            return;
        }

        let mut y = y1 as f64 + slope * (first as i64 - x1 as i64) as f64;
        for x in first..=last {
            let whole = libm::floor(y);
            let frac = y - whole;
            let minor = whole as i32;

            if steep {
                self.blend_pixel(minor, x, color, 1.0 - frac);
                self.blend_pixel(minor.saturating_add(1), x, color, frac);
            } else {
                self.blend_pixel(x, minor, color, 1.0 - frac);
                self.blend_pixel(x, minor.saturating_add(1), color, frac);
            }
            y += slope;
        }
    }

    // ========================================================================
    // Triangles
    // ========================================================================

    /// Filled triangle with an anti-aliased outline.
    ///
    /// The vertices are sorted top to bottom and the shape is split at
    /// the middle vertex into a flat-bottom and a flat-top half, each
    /// filled one scanline at a time.
    pub fn draw_triangle(&mut self, p1: Point, p2: Point, p3: Point, color: Color) {
        let (mut p1, mut p2, mut p3) = (p1, p2, p3);
        if p2.y > p3.y {
            swap(&mut p2, &mut p3);
        }
        if p1.y > p2.y {
            swap(&mut p1, &mut p2);
        }
        if p2.y > p3.y {
            swap(&mut p2, &mut p3);
        }

        self.draw_line(p1.x, p1.y, p2.x, p2.y, color);
        self.draw_line(p2.x, p2.y, p3.x, p3.y, color);
        self.draw_line(p3.x, p3.y, p1.x, p1.y, color);

        // Degenerate: all three on one row, the outline is the whole shape
        if p1.y == p3.y {
            return;
        }

        // Where the long edge p1 -> p3 crosses the middle vertex's row
        let inv_slope = (p1.x as i64 - p3.x as i64) as f64 / (p1.y as i64 - p3.y as i64) as f64;
        let split = p1.x as f64 + libm::floor(inv_slope * (p2.y as i64 - p1.y as i64) as f64 + 0.5);
        let (x1, x2) = (p1.x as f64, p2.x as f64);

        let (left, right) = if split <= x2 { (split, x2) } else { (x2, split) };

        if p2.y > p1.y {
            let rows = (p2.y as i64 - p1.y as i64) as f64;
            self.fill_scanlines(
                p1.y,
                p2.y,
                (x1, (left - x1) / rows),
                (x1, (right - x1) / rows),
                color,
            );
        }

        if p3.y > p2.y {
            let rows = (p3.y as i64 - p2.y as i64) as f64;
            let x3 = p3.x as f64;
            self.fill_scanlines(
                p2.y,
                p3.y,
                (left, (x3 - left) / rows),
                (right, (x3 - right) / rows),
                color,
            );
        }
    }

    /// Fill rows `[top, bottom)` between two edges given as
    /// `(x at top, x step per row)`. Rows and columns outside the band
    /// are skipped, not walked.
    fn fill_scanlines(&mut self, top: i32, bottom: i32, left: (f64, f64), right: (f64, f64), color: Color) {
        let first = top.max(0);
        let end = bottom.min(self.height() as i32);
        let skipped = (first as i64 - top as i64) as f64;
        let max_x = self.width() as i32 - 1;

        let (xs, step_s) = left;
        let (xe, step_e) = right;
        let mut xs = xs + step_s * skipped;
        let mut xe = xe + step_e * skipped;

        for y in first..end {
            let from = round(xs + 0.5).max(0);
            let to = round(xe - 0.5).min(max_x);
            for x in from..=to {
                self.set_pixel(x, y, color);
            }
            xs += step_s;
            xe += step_e;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::Font8x8;
    use crate::testing::Canvas;
    use std::vec::Vec;

    fn black(w: u32, h: u32) -> Canvas {
        let mut c = Canvas::new(w, h);
        c.surface().clear(Color::BLACK);
        c
    }

    fn lit(s: &Surface<'_>) -> Vec<(i32, i32, Color)> {
        let mut out = Vec::new();
        for y in 0..s.height() as i32 {
            for x in 0..s.width() as i32 {
                let c = s.get_pixel(x, y);
                if c != Color::BLACK {
                    out.push((x, y, c));
                }
            }
        }
        out
    }

    #[test]
    fn test_blend_pixel() {
        let mut c = black(4, 4);
        let mut s = c.surface();

        s.blend_pixel(1, 1, Color::WHITE, 0.5);
        s.blend_pixel(2, 2, Color::WHITE, 0.0);
        s.blend_pixel(-1, 2, Color::WHITE, 1.0);

        assert_eq!(s.get_pixel(1, 1), Color(0xFF80_8080));
        assert_eq!(s.get_pixel(2, 2), Color::BLACK);
        assert_eq!(lit(&s).len(), 1);
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut c = black(10, 10);
        let mut s = c.surface();
        s.fill_rect(-3, 8, 5, 10, Color::RED);

        // Visible part is x in [0, 2), y in [8, 10)
        let px = lit(&s);
        assert_eq!(px.len(), 4);
        assert!(px.iter().all(|&(x, y, c)| x < 2 && y >= 8 && c == Color::RED));
    }

    #[test]
    fn test_fill_rect_offscreen_is_noop() {
        let mut c = black(10, 10);
        let mut s = c.surface();
        s.fill_rect(20, 0, 5, 5, Color::RED);
        s.fill_rect(0, 0, 0, 5, Color::RED);
        s.fill_rect(0, 0, i32::MAX, -1, Color::RED);
        assert!(lit(&s).is_empty());
    }

    #[test]
    fn test_centered_square() {
        let mut c = black(20, 20);
        let mut s = c.surface();
        s.draw_centered_square(10, 10, 6, Color::WHITE);

        let px = lit(&s);
        assert_eq!(px.len(), 36);
        assert!(px.iter().all(|&(x, y, _)| (7..13).contains(&x) && (7..13).contains(&y)));
    }

    #[test]
    fn test_centered_square_near_corner() {
        let mut c = black(20, 20);
        let mut s = c.surface();
        s.draw_centered_square(1, 1, 6, Color::WHITE);

        // [-2, 4) clipped to [0, 4)
        assert_eq!(lit(&s).len(), 16);
    }

    #[test]
    fn test_draw_char() {
        let mut c = black(16, 16);
        let mut s = c.surface();
        s.draw_char(&Font8x8, 4, 4, '_', Color::GREEN);

        // Underscore is the bottom row, seven pixels wide
        let px = lit(&s);
        assert_eq!(px.len(), 7);
        assert!(px.iter().all(|&(x, y, c)| y == 11 && (4..11).contains(&x) && c == Color::GREEN));
    }

    #[test]
    fn test_missing_glyph_draws_nothing() {
        let mut c = black(16, 16);
        let mut s = c.surface();
        s.draw_char(&Font8x8, 0, 0, '\u{1F41C}', Color::WHITE);
        s.draw_char(&Font8x8, 0, 0, ' ', Color::WHITE);
        assert!(lit(&s).is_empty());
    }

    #[test]
    fn test_draw_string_advances() {
        let mut c = black(32, 8);
        let mut s = c.surface();
        s.draw_string(&Font8x8, 0, 0, "__\u{7f}_", Color::WHITE);

        // Third cell has no glyph but still takes its slot
        let columns: Vec<i32> = lit(&s).iter().map(|&(x, _, _)| x).collect();
        assert!(columns.iter().all(|&x| x < 7 || (8..15).contains(&x) || (24..31).contains(&x)));
        assert_eq!(columns.len(), 21);
    }

    #[test]
    fn test_horizontal_line_is_opaque() {
        let mut c = black(20, 20);
        let mut s = c.surface();
        s.draw_line(2, 5, 15, 5, Color::WHITE);

        let px = lit(&s);
        assert_eq!(px.len(), 14);
        assert!(px.iter().all(|&(_, y, c)| y == 5 && c == Color::WHITE));
    }

    #[test]
    fn test_vertical_line_is_opaque() {
        let mut c = black(20, 20);
        let mut s = c.surface();
        s.draw_line(7, 17, 7, 3, Color::WHITE);

        let px = lit(&s);
        assert_eq!(px.len(), 15);
        assert!(px.iter().all(|&(x, _, c)| x == 7 && c == Color::WHITE));
    }

    #[test]
    fn test_diagonal_line_is_exact() {
        let mut c = black(20, 20);
        let mut s = c.surface();
        s.draw_line(0, 0, 9, 9, Color::WHITE);

        let px = lit(&s);
        assert_eq!(px.len(), 10);
        assert!(px.iter().all(|&(x, y, c)| x == y && c == Color::WHITE));
    }

    #[test]
    fn test_shallow_line_is_antialiased() {
        let mut c = black(20, 20);
        let mut s = c.surface();
        s.draw_line(2, 3, 12, 8, Color::WHITE);

        let half = Color(0xFF80_8080);
        for &(x, y) in &[(2, 3), (4, 4), (6, 5), (8, 6), (10, 7), (12, 8)] {
            assert_eq!(s.get_pixel(x, y), Color::WHITE);
        }
        for &(x, y) in &[(3, 3), (3, 4), (5, 4), (5, 5), (11, 7), (11, 8)] {
            assert_eq!(s.get_pixel(x, y), half);
        }
        assert_eq!(lit(&s).len(), 16);
    }

    #[test]
    fn test_line_direction_does_not_matter() {
        let mut a = black(20, 20);
        let mut b = black(20, 20);
        a.surface().draw_line(2, 3, 12, 8, Color::WHITE);
        b.surface().draw_line(12, 8, 2, 3, Color::WHITE);
        assert_eq!(a.words, b.words);
    }

    #[test]
    fn test_line_clips() {
        let mut c = black(10, 10);
        let mut s = c.surface();
        s.draw_line(-5, 2, 30, 2, Color::WHITE);
        assert_eq!(lit(&s).len(), 10);
    }

    #[test]
    fn test_line_from_extreme_coordinates() {
        let mut c = black(10, 10);
        let mut s = c.surface();
        s.draw_line(i32::MIN, 0, 0, 0, Color::WHITE);
        assert_eq!(lit(&s), [(0, 0, Color::WHITE)]);

        s.clear(Color::BLACK);
        s.draw_line(i32::MIN, i32::MIN, i32::MAX, i32::MAX, Color::WHITE);
        let px = lit(&s);
        assert_eq!(px.len(), 10);
        assert!(px.iter().all(|&(x, y, c)| x == y && c == Color::WHITE));
    }

    #[test]
    fn test_triangle_from_extreme_coordinates() {
        let mut c = black(10, 10);
        let mut s = c.surface();
        s.draw_triangle(
            Point::new(i32::MIN, 0),
            Point::new(i32::MAX, 0),
            Point::new(0, i32::MAX),
            Color::WHITE,
        );

        // The band is deep inside the shape
        assert_eq!(lit(&s).len(), 100);
    }

    #[test]
    fn test_single_point_line() {
        let mut c = black(10, 10);
        let mut s = c.surface();
        s.draw_line(4, 4, 4, 4, Color::WHITE);
        assert_eq!(lit(&s), [(4, 4, Color::WHITE)]);
    }

    #[test]
    fn test_right_triangle_area() {
        let mut c = black(40, 40);
        let mut s = c.surface();
        s.draw_triangle(Point::new(0, 0), Point::new(0, 20), Point::new(20, 0), Color::WHITE);

        let px = lit(&s);
        // 20 * 20 / 2 plus the outline and the hypotenuse's pixel row
        assert!((200..=240).contains(&px.len()), "{} pixels", px.len());
        assert!(px.iter().all(|&(x, y, _)| x + y <= 20));
        assert_eq!(s.get_pixel(5, 5), Color::WHITE);
        assert_eq!(s.get_pixel(15, 15), Color::BLACK);
    }

    #[test]
    fn test_triangle_vertex_order_does_not_matter() {
        let (a, b, d) = (Point::new(3, 2), Point::new(17, 9), Point::new(6, 18));

        let mut first = black(24, 24);
        first.surface().draw_triangle(a, b, d, Color::CYAN);
        let mut second = black(24, 24);
        second.surface().draw_triangle(d, a, b, Color::CYAN);

        assert_eq!(first.words, second.words);
    }

    #[test]
    fn test_flat_triangle_is_outline() {
        let mut c = black(20, 20);
        let mut s = c.surface();
        s.draw_triangle(Point::new(2, 5), Point::new(9, 5), Point::new(15, 5), Color::WHITE);

        let px = lit(&s);
        assert_eq!(px.len(), 14);
        assert!(px.iter().all(|&(_, y, _)| y == 5));
    }
}
