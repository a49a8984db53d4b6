//! Button press handling
//!
//! A falling edge on the button pin flashes a white square over the bug
//! on the overlay band, then returns to the double buffer with both
//! bands wiped. Presses closer together than the trigger delay are
//! acknowledged and otherwise ignored.

use crate::color::Color;
use crate::entity::Bug;
use crate::framebuffer::FrameBuffer;
use crate::platform::{EventPin, FramebufferMailbox, TickSource};
use crate::{GameConfig, Result};

/// What a button edge ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    /// The overlay was shown for the flash delay
    Flashed,
    /// Too soon after the last accepted press
    RateLimited,
}

/// Rate-limited overlay flash. Owns the timestamp of the last accepted
/// press.
#[derive(Debug, Clone, Copy)]
pub struct ButtonFlash {
    last_press: u32,
    trigger_delay: u32,
    flash_delay: u32,
    sprite_width: u32,
}

impl ButtonFlash {
    pub const fn new(trigger_delay: u32, flash_delay: u32, sprite_width: u32) -> Self {
        Self {
            last_press: 0,
            trigger_delay,
            flash_delay,
            sprite_width,
        }
    }

    pub const fn from_config(config: &GameConfig) -> Self {
        Self::new(config.trigger_delay, config.flash_delay, config.sprite_width)
    }

    /// Tick count of the last accepted press, 0 before the first one
    pub fn last_press(&self) -> u32 {
        self.last_press
    }

    /// Handle one falling edge on `pin`.
    ///
    /// Blocks for the whole flash delay when the press is accepted. The
    /// pin's pending event is cleared on every path, including errors.
    pub fn on_falling_edge<M, T, P>(
        &mut self,
        fb: &mut FrameBuffer<M>,
        bug: &Bug,
        clock: &T,
        pin: &mut P,
    ) -> Result<PressOutcome>
    where
        M: FramebufferMailbox,
        T: TickSource,
        P: EventPin,
    {
        let outcome = self.flash(fb, bug, clock);
        pin.clear_event();
        outcome
    }

    fn flash<M: FramebufferMailbox, T: TickSource>(
        &mut self,
        fb: &mut FrameBuffer<M>,
        bug: &Bug,
        clock: &T,
    ) -> Result<PressOutcome> {
        let now = clock.ticks();
        if now <= self.last_press.wrapping_add(self.trigger_delay) {
            return Ok(PressOutcome::RateLimited);
        }

        let (x, y) = (bug.x as i32, bug.y as i32);
        let side = self.sprite_width as i32;

        fb.overlay_buffer().draw_centered_square(x, y, side, Color::WHITE);
        fb.present_overlay()?;

        // Nothing else runs until the flash is over
        let elapsed = clock.ticks().wrapping_sub(now);
        clock.delay_us(self.flash_delay.saturating_sub(elapsed));

        fb.overlay_buffer().draw_centered_square(x, y, side, Color::BLACK);

        // Restart the double buffer from two clean bands
        fb.present_next()?;
        fb.back_buffer().clear(Color::BLACK);
        fb.present_next()?;
        fb.back_buffer().clear(Color::BLACK);

        self.last_press = clock.ticks();
        Ok(PressOutcome::Flashed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::BugKind;
    use crate::framebuffer::Band;
    use crate::testing::{CountingPin, FakeClock, FakeFirmware};

    const W: u32 = 64;
    const H: u32 = 48;

    fn setup() -> (FrameBuffer<FakeFirmware>, Bug, ButtonFlash) {
        let fb = FrameBuffer::negotiate(FakeFirmware::new(), W, H, 4).unwrap();
        let mut bug = Bug::new(BugKind::Ant);
        bug.x = 20.7;
        bug.y = 30.2;
        (fb, bug, ButtonFlash::new(1_000_000, 100_000, 8))
    }

    fn overlay_shows(fb: &FrameBuffer<FakeFirmware>) -> usize {
        fb.mailbox().y_offsets().iter().filter(|&&y| y == 2 * H).count()
    }

    #[test]
    fn test_accepted_press_flashes_overlay() {
        let (mut fb, bug, mut flash) = setup();
        let clock = FakeClock::new(2_000_000, 1_000);
        let mut pin = CountingPin::default();

        let outcome = flash.on_falling_edge(&mut fb, &bug, &clock, &mut pin).unwrap();

        assert_eq!(outcome, PressOutcome::Flashed);
        assert_eq!(overlay_shows(&fb), 1);
        assert_eq!(pin.cleared, 1);
        // Waited out the flash before recording the press
        assert!(flash.last_press() >= 2_100_000);
        assert!(clock.peek() > flash.last_press());
    }

    #[test]
    fn test_flash_waits_out_the_delay_through_the_clock() {
        let (mut fb, bug, mut flash) = setup();
        let clock = FakeClock::new(2_000_000, 1_000);
        let mut pin = CountingPin::default();

        flash.on_falling_edge(&mut fb, &bug, &clock, &mut pin).unwrap();

        // One tick read after the press, the rest is a single delay
        assert_eq!(clock.delayed(), 99_000);
        assert!(flash.last_press() >= 2_000_000 + 100_000);
    }

    #[test]
    fn test_slow_overlay_draw_skips_the_delay() {
        let (mut fb, bug, _) = setup();
        let mut flash = ButtonFlash::new(1_000_000, 500, 8);
        let clock = FakeClock::new(2_000_000, 1_000);
        let mut pin = CountingPin::default();

        let outcome = flash.on_falling_edge(&mut fb, &bug, &clock, &mut pin).unwrap();
        assert_eq!(outcome, PressOutcome::Flashed);
        assert_eq!(clock.delayed(), 0);
    }

    #[test]
    fn test_flash_sequence() {
        let (mut fb, bug, mut flash) = setup();
        let clock = FakeClock::new(2_000_000, 1_000);
        let mut pin = CountingPin::default();
        fb.back_buffer().fill_rect(0, 0, 10, 10, Color::GREEN);

        flash.on_falling_edge(&mut fb, &bug, &clock, &mut pin).unwrap();

        // negotiate, overlay, then two double-buffer presents
        assert_eq!(fb.mailbox().y_offsets(), [0, 2 * H, H, 0]);
        assert_eq!(fb.displayed_band(), Band::Zero);

        // Square erased again, both bands wiped
        assert_eq!(fb.overlay_buffer().get_pixel(20, 30), Color::BLACK);
        assert_eq!(fb.back_buffer().get_pixel(1, 1), Color::BLACK);
        fb.present_next().unwrap();
        assert_eq!(fb.back_buffer().get_pixel(1, 1), Color::BLACK);
    }

    #[test]
    fn test_flash_square_position() {
        let (mut fb, bug, mut flash) = setup();
        let clock = FakeClock::new(2_000_000, 1_000);
        let mut pin = CountingPin::default();

        flash.on_falling_edge(&mut fb, &bug, &clock, &mut pin).unwrap();

        // What the firmware was showing while the overlay was up
        let fw = fb.mailbox();
        let stride = (fw.pitch / 4) as usize;
        let shown = &fw.frames[1];
        let at = |x: usize, y: usize| shown[2 * H as usize * stride + y * stride + x];

        // Truncated center (20, 30), square [16, 24) x [26, 34)
        assert_eq!(at(16, 26), Color::WHITE.0);
        assert_eq!(at(23, 33), Color::WHITE.0);
        assert_eq!(at(24, 33), 0);
        assert_eq!(at(15, 26), 0);
        assert_eq!(at(16, 25), 0);
    }

    #[test]
    fn test_rate_limit_allows_one_flash() {
        let (mut fb, bug, mut flash) = setup();
        let clock = FakeClock::new(2_000_000, 1_000);
        let mut pin = CountingPin::default();

        let first = flash.on_falling_edge(&mut fb, &bug, &clock, &mut pin).unwrap();
        clock.set(flash.last_press() + 400_000);
        let second = flash.on_falling_edge(&mut fb, &bug, &clock, &mut pin).unwrap();

        assert_eq!(first, PressOutcome::Flashed);
        assert_eq!(second, PressOutcome::RateLimited);
        assert_eq!(overlay_shows(&fb), 1);
        // Rejected presses are still acknowledged
        assert_eq!(pin.cleared, 2);
    }

    #[test]
    fn test_press_after_delay_is_accepted() {
        let (mut fb, bug, mut flash) = setup();
        let clock = FakeClock::new(2_000_000, 1_000);
        let mut pin = CountingPin::default();

        flash.on_falling_edge(&mut fb, &bug, &clock, &mut pin).unwrap();
        clock.set(flash.last_press() + 1_000_001);
        let again = flash.on_falling_edge(&mut fb, &bug, &clock, &mut pin).unwrap();

        assert_eq!(again, PressOutcome::Flashed);
        assert_eq!(overlay_shows(&fb), 2);
    }

    #[test]
    fn test_presses_right_after_boot_are_ignored() {
        let (mut fb, bug, mut flash) = setup();
        let clock = FakeClock::new(500_000, 1_000);
        let mut pin = CountingPin::default();

        let outcome = flash.on_falling_edge(&mut fb, &bug, &clock, &mut pin).unwrap();
        assert_eq!(outcome, PressOutcome::RateLimited);
        assert_eq!(fb.mailbox().requests.len(), 1);
    }

    #[test]
    fn test_failed_present_still_clears_event() {
        let (mut fb, bug, mut flash) = setup();
        let clock = FakeClock::new(2_000_000, 1_000);
        let mut pin = CountingPin::default();
        fb_reject(&mut fb);

        let result = flash.on_falling_edge(&mut fb, &bug, &clock, &mut pin);
        assert_eq!(result, Err(crate::Error::MailboxFailed));
        assert_eq!(pin.cleared, 1);
        assert_eq!(flash.last_press(), 0);
    }

    fn fb_reject(fb: &mut FrameBuffer<FakeFirmware>) {
        fb.mailbox_mut().accept = false;
    }
}
