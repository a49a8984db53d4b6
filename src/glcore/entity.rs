//! Bug sprite simulation
//!
//! A bug is a solid square that moves across the playfield. Drawing
//! erases with a one-frame delay: the rectangle cleared each frame is
//! the one drawn two frames earlier, which is exactly what the
//! double-buffered band now being drawn still contains.

use crate::color::Color;
use crate::platform::TickSource;
use crate::surface::Surface;

/// Fixed-point scale of the erase trail
pub const TRAIL_SCALE: f64 = 1000.0;

// ============================================================================
// Random Numbers
// ============================================================================

/// Hash a tick count into `0..n`. Returns 0 for `n == 0`.
pub fn tick_random(ticks: u32, n: u32) -> u32 {
    if n == 0 {
        return 0;
    }
    let mut x = ticks.wrapping_add(1 << 31);
    x = ((x >> 17) ^ x).wrapping_mul(16_547_387);
    x = (x >> 9) ^ (x % 138);
    x % n
}

/// Random source that re-reads the tick counter on every draw
pub struct TickRng<'a, T: TickSource> {
    clock: &'a T,
}

impl<'a, T: TickSource> TickRng<'a, T> {
    pub fn new(clock: &'a T) -> Self {
        Self { clock }
    }

    /// Value in `0..n`
    pub fn below(&mut self, n: u32) -> u32 {
        tick_random(self.clock.ticks(), n)
    }

    /// Speed in `[1, 21]` with a random sign
    fn velocity(&mut self) -> (f64, f64) {
        let vx = self.below(301) as f64 / 15.0 + 1.0;
        let vy = self.below(301) as f64 / 15.0 + 1.0;
        let sx = if self.below(2) != 0 { 1.0 } else { -1.0 };
        let sy = if self.below(2) != 0 { 1.0 } else { -1.0 };
        (vx * sx, vy * sy)
    }
}

// ============================================================================
// Playfield
// ============================================================================

/// Area the bug lives in: the screen minus a status bar at the top
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Playfield {
    pub width: u32,
    pub height: u32,
    /// Rows reserved for the status bar
    pub top_border: u32,
    /// Side of the bug square in pixels
    pub sprite_width: u32,
}

impl Playfield {
    #[inline]
    pub const fn half(&self) -> i32 {
        (self.sprite_width / 2) as i32
    }

    /// Allowed range of the sprite center on the x axis
    pub fn x_range(&self) -> (f64, f64) {
        let half = self.half() as f64;
        (half, self.width as f64 - half)
    }

    /// Allowed range of the sprite center on the y axis
    pub fn y_range(&self) -> (f64, f64) {
        let half = self.half() as f64;
        (half + self.top_border as f64, self.height as f64 - half)
    }
}

// ============================================================================
// Erase Trail
// ============================================================================

/// Two-entry FIFO of drawn positions, scaled by [`TRAIL_SCALE`].
///
/// It is always full: every draw takes the oldest entry out and puts
/// the current one in, so it acts as a one-frame delay line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trail {
    slots: [(i32, i32); 2],
    oldest: usize,
}

impl Trail {
    /// A trail holding `seed` twice
    pub const fn new(seed: (i32, i32)) -> Self {
        Self {
            slots: [seed, seed],
            oldest: 0,
        }
    }

    /// Enqueue `newest` and return the entry it displaces.
    pub fn cycle(&mut self, newest: (i32, i32)) -> (i32, i32) {
        let out = self.slots[self.oldest];
        self.slots[self.oldest] = newest;
        self.oldest ^= 1;
        out
    }

    /// The entry the next [`Trail::cycle`] will return
    pub fn oldest(&self) -> (i32, i32) {
        self.slots[self.oldest]
    }
}

// ============================================================================
// Bug
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BugKind {
    /// Moves in a straight line and bounces off the playfield edges
    Ant,
    /// Has a velocity but never moves
    Fly,
}

impl BugKind {
    pub const fn color(self) -> Color {
        match self {
            BugKind::Ant => Color::GREEN,
            BugKind::Fly => Color::INDIGO,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Bug {
    pub kind: BugKind,
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    trail: Trail,
}

impl Bug {
    /// A motionless bug at the origin, its trail seeded there too.
    pub fn new(kind: BugKind) -> Self {
        let mut bug = Self {
            kind,
            x: 0.0,
            y: 0.0,
            vel_x: 0.0,
            vel_y: 0.0,
            trail: Trail::new((0, 0)),
        };
        bug.trail = Trail::new(bug.encoded());
        bug
    }

    /// A bug at a random spot of `field` with a random velocity.
    ///
    /// The trail keeps the pre-spawn position, so the first two draws
    /// erase around the origin.
    pub fn spawn<T: TickSource>(kind: BugKind, field: &Playfield, clock: &T) -> Self {
        let mut bug = Self::new(kind);
        let mut rng = TickRng::new(clock);
        let half = field.half() as u32;
        let sprite = field.sprite_width;

        bug.x = (half + rng.below(field.width.saturating_sub(sprite))) as f64;
        bug.y = (half + field.top_border + rng.below(field.height.saturating_sub(sprite + field.top_border))) as f64;

        let (vx, vy) = rng.velocity();
        bug.vel_x = vx;
        bug.vel_y = vy;
        bug
    }

    /// Current position in trail units
    #[inline]
    fn encoded(&self) -> (i32, i32) {
        ((self.x * TRAIL_SCALE) as i32, (self.y * TRAIL_SCALE) as i32)
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    /// Advance one simulation tick.
    pub fn step(&mut self, field: &Playfield) {
        match self.kind {
            BugKind::Ant => {
                self.x += self.vel_x;
                self.y += self.vel_y;

                // No clamping: a large overshoot can flip again next tick
                let (x_min, x_max) = field.x_range();
                if self.x < x_min || self.x > x_max {
                    self.vel_x = -self.vel_x;
                }
                let (y_min, y_max) = field.y_range();
                if self.y < y_min || self.y > y_max {
                    self.vel_y = -self.vel_y;
                }
            }
            BugKind::Fly => {}
        }
    }

    /// Erase the position from two draws ago and draw the current one.
    pub fn draw(&mut self, surface: &mut Surface<'_>, field: &Playfield, background: Color) {
        let half = field.half();
        let side = field.sprite_width as i32;

        let (old_x, old_y) = self.trail.cycle(self.encoded());
        surface.fill_rect(old_x / 1000 - half, old_y / 1000 - half, side, side, background);
        surface.fill_rect(self.x as i32 - half, self.y as i32 - half, side, side, self.kind.color());
    }
}
