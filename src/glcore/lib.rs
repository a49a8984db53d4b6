//! # glcore - Triple-Band Framebuffer Graphics Core
//!
//! A `no_std` drawing core for firmware-allocated framebuffers on the
//! Raspberry Pi. The framebuffer is negotiated three screens tall: two
//! bands form a tear-free double buffer and the third is an overlay an
//! interrupt handler can flash without disturbing the main loop.
//!
//! All board access is abstracted through traits the kernel implements.
//!
//! ## Platform Traits
//!
//! - [`FramebufferMailbox`] - Firmware negotiation transport
//! - [`TickSource`] - Free-running microsecond counter
//! - [`EventPin`] - Edge-latched input pin
//! - [`InterruptMask`] - CPU interrupt masking for [`Exclusive`]
//! - [`FontProvider`] - Glyph bitmaps for text
//!
//! ## Usage
//!
//! ```ignore
//! use glcore::{BugKind, Game, GameConfig};
//!
//! let mut game = Game::start(mailbox, GameConfig::DEFAULT, &timer, BugKind::Ant)?;
//!
//! loop {
//!     game.tick(&timer)?;
//! }
//! ```

#![no_std]
#![allow(clippy::new_without_default)]

#[cfg(test)]
extern crate std;

pub mod color;
pub mod entity;
pub mod font;
pub mod framebuffer;
pub mod game;
pub mod input;
pub mod platform;
pub mod raster;
pub mod surface;
pub mod sync;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use color::Color;
pub use entity::{Bug, BugKind, Playfield};
pub use font::{Font8x8, FontProvider, Glyph};
pub use framebuffer::{Band, FbConfig, FrameBuffer};
pub use game::{FramePacer, Game};
pub use input::{ButtonFlash, PressOutcome};
pub use platform::{EventPin, FramebufferMailbox, InterruptMask, TickSource};
pub use surface::Surface;
pub use sync::Exclusive;

/// Result type for core operations
pub type Result<T> = core::result::Result<T, Error>;

/// Core error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Error {
    /// Firmware rejected a framebuffer request
    MailboxFailed,
    /// Firmware answered without a buffer pointer or pitch
    NoBuffer,
    /// Firmware buffer cannot hold all three bands
    BufferTooSmall,
    /// No framebuffer has been negotiated yet
    NotNegotiated,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Error::MailboxFailed => "mailbox request rejected",
            Error::NoBuffer => "firmware returned no framebuffer",
            Error::BufferTooSmall => "framebuffer too small for three bands",
            Error::NotNegotiated => "framebuffer not negotiated",
        };
        f.write_str(msg)
    }
}

/// Game configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    /// Physical screen width in pixels
    pub width: u32,
    /// Physical screen height in pixels
    pub height: u32,
    /// Frames per second of the main loop
    pub frame_rate: u32,
    /// Minimum ticks between two accepted button presses
    pub trigger_delay: u32,
    /// How long the overlay flash stays on screen, in ticks
    pub flash_delay: u32,
    /// Side of the bug square in pixels
    pub sprite_width: u32,
    /// Rows reserved at the top for the status bar
    pub top_border: u32,
    /// BCM GPIO number of the button
    pub button_pin: u32,
    /// Drawn in the status bar every frame
    pub status_text: &'static str,
}

impl GameConfig {
    pub const DEFAULT: Self = Self {
        width: 640,
        height: 512,
        frame_rate: 30,
        trigger_delay: 1_000_000,
        flash_delay: 100_000,
        sprite_width: 32,
        top_border: 70,
        button_pin: 17,
        status_text: "Test",
    };

    /// Ticks per frame
    pub const fn frame_period(&self) -> u32 {
        if self.frame_rate == 0 {
            return 1_000_000;
        }
        1_000_000 / self.frame_rate
    }

    pub const fn playfield(&self) -> Playfield {
        Playfield {
            width: self.width,
            height: self.height,
            top_border: self.top_border,
            sprite_width: self.sprite_width,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
