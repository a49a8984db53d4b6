//! Host doubles for the platform traits

use core::cell::Cell;
use std::vec;
use std::vec::Vec;

use crate::framebuffer::FbConfig;
use crate::platform::{EventPin, FramebufferMailbox, InterruptMask, TickSource};
use crate::surface::Surface;

/// Extra bytes the fake firmware adds to every row
const ROW_PADDING: u32 = 64;

/// Bus address handed out by the fake firmware. Only meaningful to
/// [`FakeFirmware::map_buffer`].
const FAKE_BUS_ADDR: u32 = 0xC100_0000;

// ============================================================================
// Firmware
// ============================================================================

/// Mailbox that allocates the framebuffer in host memory and keeps a
/// copy of every message it was sent.
pub struct FakeFirmware {
    pub memory: Vec<u32>,
    pub requests: Vec<FbConfig>,
    /// Buffer contents at each exchange, i.e. what went to the display
    pub frames: Vec<Vec<u32>>,
    pub pitch: u32,
    /// Answer every request with failure when false
    pub accept: bool,
    /// Report a null buffer pointer
    pub null_buffer: bool,
    /// Under-report the buffer size by this many bytes
    pub short_by: u32,
}

impl FakeFirmware {
    pub fn new() -> Self {
        Self {
            memory: Vec::new(),
            requests: Vec::new(),
            frames: Vec::new(),
            pitch: 0,
            accept: true,
            null_buffer: false,
            short_by: 0,
        }
    }

    /// Display offsets of every request so far
    pub fn y_offsets(&self) -> Vec<u32> {
        self.requests.iter().map(|r| r.y_offset).collect()
    }
}

impl FramebufferMailbox for FakeFirmware {
    fn exchange(&mut self, message: &mut FbConfig) -> bool {
        self.requests.push(*message);
        if !self.accept {
            return false;
        }

        if message.framebuffer == 0 {
            self.pitch = message.virtual_width * message.bit_depth / 8 + ROW_PADDING;
            let bytes = self.pitch * message.virtual_height;
            self.memory = vec![0; bytes as usize / 4];

            message.pitch = self.pitch;
            message.framebuffer = if self.null_buffer { 0 } else { FAKE_BUS_ADDR };
            message.total_bytes = bytes - self.short_by;
        }
        self.frames.push(self.memory.clone());
        true
    }

    fn map_buffer(&mut self, bus_addr: u32) -> *mut u32 {
        assert_eq!(bus_addr, FAKE_BUS_ADDR);
        self.memory.as_mut_ptr()
    }
}

// ============================================================================
// Plain Surface
// ============================================================================

/// A single band in host memory, rows padded like the firmware's
pub struct Canvas {
    pub words: Vec<u32>,
    /// Row length in words
    pub stride: usize,
    width: u32,
    height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        let stride = width as usize + 4;
        Self {
            words: vec![0; stride * height as usize],
            stride,
            width,
            height,
        }
    }

    pub fn surface(&mut self) -> Surface<'_> {
        let pitch = (self.stride * 4) as u32;
        // SAFETY: words holds stride * height words and stays borrowed
        unsafe { Surface::from_raw(self.words.as_mut_ptr(), self.width, self.height, pitch) }
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Tick source that advances by `step` on every read. Delays jump the
/// counter forward instead of spinning.
pub struct FakeClock {
    now: Cell<u32>,
    step: u32,
    delayed: Cell<u32>,
}

impl FakeClock {
    pub fn new(start: u32, step: u32) -> Self {
        Self {
            now: Cell::new(start),
            step,
            delayed: Cell::new(0),
        }
    }

    /// Total microseconds spent in `delay_us`
    pub fn delayed(&self) -> u32 {
        self.delayed.get()
    }

    pub fn set(&self, ticks: u32) {
        self.now.set(ticks);
    }

    /// Current value without advancing
    pub fn peek(&self) -> u32 {
        self.now.get()
    }
}

impl TickSource for FakeClock {
    fn ticks(&self) -> u32 {
        let t = self.now.get();
        self.now.set(t.wrapping_add(self.step));
        t
    }

    fn delay_us(&self, us: u32) {
        self.now.set(self.now.get().wrapping_add(us));
        self.delayed.set(self.delayed.get() + us);
    }
}

// ============================================================================
// Pin
// ============================================================================

#[derive(Default)]
pub struct CountingPin {
    pub cleared: u32,
}

impl EventPin for CountingPin {
    fn clear_event(&mut self) {
        self.cleared += 1;
    }
}

// ============================================================================
// Interrupt Mask
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct MaskCounts {
    pub disables: u32,
    pub restores: u32,
    pub masked: bool,
}

std::thread_local! {
    static MASK: Cell<MaskCounts> = Cell::new(MaskCounts::default());
}

/// Interrupt mask that only records what it was asked to do. State is
/// per test thread.
pub struct CountingMask;

impl CountingMask {
    pub fn snapshot() -> MaskCounts {
        MASK.with(|m| m.get())
    }

    pub fn is_masked() -> bool {
        Self::snapshot().masked
    }
}

impl InterruptMask for CountingMask {
    fn disable() -> usize {
        MASK.with(|m| {
            let mut s = m.get();
            let was = s.masked;
            s.masked = true;
            s.disables += 1;
            m.set(s);
            was as usize
        })
    }

    fn restore(saved: usize) {
        MASK.with(|m| {
            let mut s = m.get();
            s.masked = saved != 0;
            s.restores += 1;
            m.set(s);
        })
    }
}
