//! Main loop state
//!
//! [`Game`] ties the framebuffer, the bug and the button handler
//! together. The kernel keeps exactly one of these in an
//! [`Exclusive`](crate::sync::Exclusive) and drives it from two places:
//! the polling loop calls [`Game::tick`], the GPIO interrupt calls
//! [`Game::on_button`].

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle};
use embedded_graphics_core::pixelcolor::Rgb888;

use crate::color::Color;
use crate::entity::{Bug, BugKind};
use crate::font::Font8x8;
use crate::framebuffer::FrameBuffer;
use crate::input::{ButtonFlash, PressOutcome};
use crate::platform::{EventPin, FramebufferMailbox, TickSource};
use crate::{GameConfig, Result};

const BACKGROUND: Color = Color::BLACK;
const STATUS_COLOR: Color = Color::WHITE;
const DIVIDER_COLOR: Color = Color::DARK_GRAY;

/// Status text position
const STATUS_X: i32 = 10;
const STATUS_Y: i32 = 10;

// ============================================================================
// Frame Pacing
// ============================================================================

/// Decides when the next frame is due by comparing frame numbers, so a
/// late frame is rendered once instead of being caught up.
#[derive(Debug, Clone, Copy)]
pub struct FramePacer {
    period: u32,
    last_tick: u32,
}

impl FramePacer {
    pub const fn new(period: u32) -> Self {
        Self {
            period: if period == 0 { 1 } else { period },
            last_tick: 0,
        }
    }

    /// True if `now` is in a later frame than the last rendered one.
    ///
    /// A counter that went backwards has wrapped, which also makes a
    /// frame due.
    pub fn is_due(&self, now: u32) -> bool {
        now < self.last_tick || now / self.period > self.last_tick / self.period
    }

    /// Record that a frame finished at `now`.
    pub fn mark(&mut self, now: u32) {
        self.last_tick = now;
    }
}

// ============================================================================
// Game
// ============================================================================

pub struct Game<M: FramebufferMailbox> {
    fb: FrameBuffer<M>,
    bug: Bug,
    pacer: FramePacer,
    flash: ButtonFlash,
    config: GameConfig,
    font: Font8x8,
}

impl<M: FramebufferMailbox> Game<M> {
    /// Negotiate the framebuffer, spawn the bug and show the first frame.
    pub fn start<T: TickSource>(mailbox: M, config: GameConfig, clock: &T, kind: BugKind) -> Result<Self> {
        let mut fb = FrameBuffer::negotiate(mailbox, config.width, config.height, 4)?;
        fb.overlay_buffer().clear(BACKGROUND);
        fb.back_buffer().clear(BACKGROUND);

        let field = config.playfield();
        let mut bug = Bug::spawn(kind, &field, clock);
        bug.draw(&mut fb.back_buffer(), &field, BACKGROUND);

        fb.present_next()?;
        fb.back_buffer().clear(BACKGROUND);

        Ok(Self {
            fb,
            bug,
            pacer: FramePacer::new(config.frame_period()),
            flash: ButtonFlash::from_config(&config),
            config,
            font: Font8x8,
        })
    }

    pub fn framebuffer(&self) -> &FrameBuffer<M> {
        &self.fb
    }

    pub fn bug(&self) -> &Bug {
        &self.bug
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Render a frame if one is due. Returns whether it did.
    pub fn tick<T: TickSource>(&mut self, clock: &T) -> Result<bool> {
        if !self.pacer.is_due(clock.ticks()) {
            return Ok(false);
        }
        let presented = self.render_frame();
        self.pacer.mark(clock.ticks());
        presented.map(|_| true)
    }

    /// Move the bug, draw everything into the back buffer and present it.
    pub fn render_frame(&mut self) -> Result<()> {
        let field = self.config.playfield();
        self.bug.step(&field);

        let mut back = self.fb.back_buffer();
        self.bug.draw(&mut back, &field, BACKGROUND);
        back.draw_string(&self.font, STATUS_X, STATUS_Y, self.config.status_text, STATUS_COLOR);

        let y = self.config.top_border as i32 - 1;
        let right = self.config.width as i32 - 1;
        let Ok(()) = Line::new(Point::new(0, y), Point::new(right, y))
            .into_styled(PrimitiveStyle::with_stroke(Rgb888::from(DIVIDER_COLOR), 1))
            .draw(&mut back);

        self.fb.present_next()
    }

    /// Service a falling edge on the button pin.
    pub fn on_button<T: TickSource, P: EventPin>(&mut self, clock: &T, pin: &mut P) -> Result<PressOutcome> {
        self.flash.on_falling_edge(&mut self.fb, &self.bug, clock, pin)
    }
}
