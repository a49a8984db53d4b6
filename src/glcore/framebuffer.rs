//! Firmware framebuffer negotiation and band swapping
//!
//! The virtual framebuffer is three physical screens tall:
//!
//! ```text
//! y_offset = 0        ┌──────────────┐
//!                     │    band 0    │  ┐
//! y_offset = h        ├──────────────┤  ├─ double buffer
//!                     │    band 1    │  ┘
//! y_offset = 2h       ├──────────────┤
//!                     │   overlay    │  interrupt-context drawing only
//!                     └──────────────┘
//! ```
//!
//! Bands 0 and 1 take turns being displayed. Drawing always targets the
//! band that is not on screen. The overlay band is shown only by an
//! explicit [`FrameBuffer::present_overlay`], which leaves the 0/1
//! parity untouched so the next [`FrameBuffer::present_next`] behaves
//! as if the overlay had never been shown.

use crate::platform::FramebufferMailbox;
use crate::surface::Surface;
use crate::{Error, Result};

/// Bits per pixel requested from the firmware
pub const BITS_PER_PIXEL: u32 = 32;

/// Number of stacked bands in the virtual framebuffer
pub const BAND_COUNT: u32 = 3;

// ============================================================================
// Wire Message
// ============================================================================

/// Framebuffer request/response exchanged with the firmware by address.
///
/// Field order and the 16-byte alignment are part of the firmware
/// contract. `pitch`, `framebuffer` and `total_bytes` must be zero in
/// the first request and are written by the firmware.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FbConfig {
    /// Physical screen width in pixels
    pub width: u32,
    /// Physical screen height in pixels
    pub height: u32,
    pub virtual_width: u32,
    pub virtual_height: u32,
    /// Bytes per row, firmware-assigned
    pub pitch: u32,
    pub bit_depth: u32,
    pub x_offset: u32,
    /// Row of the virtual framebuffer shown at the top of the screen
    pub y_offset: u32,
    /// Bus address of the buffer, firmware-assigned
    pub framebuffer: u32,
    /// Buffer size in bytes, firmware-assigned
    pub total_bytes: u32,
}

impl FbConfig {
    /// Build the initial request for a `width` x `height` screen.
    pub const fn request(width: u32, height: u32, bytes_per_pixel: u32) -> Self {
        Self {
            width,
            height,
            virtual_width: width,
            virtual_height: height * BAND_COUNT,
            pitch: 0,
            bit_depth: bytes_per_pixel * 8,
            x_offset: 0,
            y_offset: 0,
            framebuffer: 0,
            total_bytes: 0,
        }
    }

    /// Bus address and byte length of the band `y_offset` selects, or
    /// `None` before the firmware has assigned a buffer.
    ///
    /// With a write-back cache this is the range that must be cleaned
    /// before the message goes out, since the display starts reading it
    /// as soon as the firmware applies the offset.
    pub const fn displayed_region(&self) -> Option<(u32, u32)> {
        if self.framebuffer == 0 {
            return None;
        }
        let start = self.framebuffer.wrapping_add(self.y_offset.wrapping_mul(self.pitch));
        Some((start, self.pitch.wrapping_mul(self.height)))
    }
}

// ============================================================================
// Bands
// ============================================================================

/// One of the three stacked screens in the virtual framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Zero,
    One,
    Overlay,
}

impl Band {
    /// Index of the band from the top of the virtual framebuffer
    #[inline]
    pub const fn index(self) -> u32 {
        match self {
            Band::Zero => 0,
            Band::One => 1,
            Band::Overlay => 2,
        }
    }

    /// The other half of the double buffer. The overlay has no partner.
    #[inline]
    pub const fn partner(self) -> Band {
        match self {
            Band::Zero => Band::One,
            Band::One => Band::Zero,
            Band::Overlay => Band::Overlay,
        }
    }
}

// ============================================================================
// Framebuffer
// ============================================================================

/// The negotiated framebuffer and its presentation state
pub struct FrameBuffer<M: FramebufferMailbox> {
    mailbox: M,
    config: FbConfig,
    /// Double-buffer half most recently presented. Tracked apart from
    /// `config.y_offset` so an overlay excursion cannot disturb it.
    front: Band,
}

impl<M: FramebufferMailbox> FrameBuffer<M> {
    /// Ask the firmware for a `width` x `height` screen with three bands.
    ///
    /// The caller decides what a failure means; the kernel treats it as
    /// fatal since nothing can be drawn without a buffer.
    pub fn negotiate(mut mailbox: M, width: u32, height: u32, bytes_per_pixel: u32) -> Result<Self> {
        let mut config = FbConfig::request(width, height, bytes_per_pixel);

        if !mailbox.exchange(&mut config) {
            return Err(Error::MailboxFailed);
        }
        if config.framebuffer == 0 || config.pitch == 0 {
            return Err(Error::NoBuffer);
        }

        let needed = config.pitch as u64 * config.virtual_height as u64;
        if (config.total_bytes as u64) < needed {
            return Err(Error::BufferTooSmall);
        }

        Ok(Self {
            mailbox,
            config,
            front: Band::Zero,
        })
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    #[inline]
    pub fn width(&self) -> u32 {
        self.config.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.config.height
    }

    #[inline]
    pub fn pitch(&self) -> u32 {
        self.config.pitch
    }

    /// Bytes per pixel
    #[inline]
    pub fn depth(&self) -> u32 {
        self.config.bit_depth / 8
    }

    /// Last message exchanged with the firmware
    #[inline]
    pub fn config(&self) -> &FbConfig {
        &self.config
    }

    #[inline]
    pub fn mailbox(&self) -> &M {
        &self.mailbox
    }

    #[inline]
    pub fn mailbox_mut(&mut self) -> &mut M {
        &mut self.mailbox
    }

    // ========================================================================
    // Presentation
    // ========================================================================

    /// Band currently selected for display
    pub fn displayed_band(&self) -> Band {
        match self.config.y_offset / self.config.height.max(1) {
            0 => Band::Zero,
            1 => Band::One,
            _ => Band::Overlay,
        }
    }

    /// Double-buffer half that drawing goes to
    #[inline]
    pub fn back_band(&self) -> Band {
        self.front.partner()
    }

    /// Show the back buffer and make the old front the new back buffer.
    pub fn present_next(&mut self) -> Result<()> {
        self.front = self.front.partner();
        self.show(self.front)
    }

    /// Show the overlay band without touching the double-buffer parity.
    pub fn present_overlay(&mut self) -> Result<()> {
        self.show(Band::Overlay)
    }

    fn show(&mut self, band: Band) -> Result<()> {
        self.config.y_offset = band.index() * self.config.height;
        if self.mailbox.exchange(&mut self.config) {
            Ok(())
        } else {
            Err(Error::MailboxFailed)
        }
    }

    // ========================================================================
    // Band Access
    // ========================================================================

    /// Byte offset of `band` from the start of the buffer
    #[inline]
    pub(crate) fn band_offset(&self, band: Band) -> usize {
        self.config.pitch as usize * self.config.height as usize * band.index() as usize
    }

    /// Drawable view of the non-displayed double-buffer half
    pub fn back_buffer(&mut self) -> Surface<'_> {
        self.surface(self.back_band())
    }

    /// Drawable view of the overlay band, whatever is on screen
    pub fn overlay_buffer(&mut self) -> Surface<'_> {
        self.surface(Band::Overlay)
    }

    fn surface(&mut self, band: Band) -> Surface<'_> {
        let offset = self.band_offset(band);
        let base = self.mailbox.map_buffer(self.config.framebuffer);
        let (width, height, pitch) = (self.config.width, self.config.height, self.config.pitch);

        // SAFETY: negotiate() checked that the firmware buffer holds
        // BAND_COUNT bands of pitch * height bytes, so every band starts
        // in bounds and spans pitch * height bytes. The returned view
        // borrows self mutably, so no other view can alias it.
        unsafe { Surface::from_raw(base.cast::<u8>().add(offset).cast::<u32>(), width, height, pitch) }
    }
}
