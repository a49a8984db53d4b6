//! VideoCore Mailbox Interface
//!
//! The framebuffer is negotiated over the legacy framebuffer channel:
//! the ARM passes the address of an [`FbConfig`] and the firmware fills
//! in pitch, pointer and size in place. Re-sending the same message
//! with a new `y_offset` pans the display.
//!
//! RAM is cached write-back, so the message is cleaned before the
//! VideoCore reads it and invalidated before the ARM reads the answer.

use glcore::{FbConfig, FramebufferMailbox};

use crate::platform_core::cache::{clean_dcache_range, clean_invalidate_dcache_range};
use crate::platform_core::mmio::{dmb, mmio_read, mmio_write, PERIPHERAL_BASE};

// ============================================================================
// Mailbox Registers
// ============================================================================

const MBOX_BASE: usize = PERIPHERAL_BASE + 0x0000_B880;

const MBOX_READ: usize = MBOX_BASE + 0x00;
const MBOX_STATUS: usize = MBOX_BASE + 0x18;
const MBOX_WRITE: usize = MBOX_BASE + 0x20;

// Status register bits
const MBOX_FULL: u32 = 0x8000_0000;
const MBOX_EMPTY: u32 = 0x4000_0000;

/// Legacy framebuffer channel
pub const CHANNEL_FRAMEBUFFER: u8 = 1;

// ============================================================================
// Mailbox Operations
// ============================================================================

/// Send the address of `message` on `channel` and wait for the answer.
///
/// The message must be 16-byte aligned and must not share a cache line
/// with anything the CPU writes while waiting. Returns the 28-bit
/// response value the firmware sent back.
pub fn mailbox_call<T>(message: &mut T, channel: u8) -> u32 {
    let ptr = message as *mut T as usize;
    let len = core::mem::size_of::<T>();
    let addr = ptr as u32;

    clean_invalidate_dcache_range(ptr, len);

    // Wait for mailbox to be not full
    while (mmio_read(MBOX_STATUS) & MBOX_FULL) != 0 {
        core::hint::spin_loop();
    }

    dmb();
    // Write address (with channel in low 4 bits)
    mmio_write(MBOX_WRITE, (addr & !0xF) | (channel as u32 & 0xF));

    loop {
        // Wait for mailbox to be not empty
        while (mmio_read(MBOX_STATUS) & MBOX_EMPTY) != 0 {
            core::hint::spin_loop();
        }

        let response = mmio_read(MBOX_READ);

        // Check if this is our response (matching channel)
        if (response & 0xF) == channel as u32 {
            dmb();
            // Drop lines the CPU may have speculatively refetched
            clean_invalidate_dcache_range(ptr, len);
            return response >> 4;
        }
    }
}

// ============================================================================
// Framebuffer Transport
// ============================================================================

/// A message padded out to whole cache lines, so invalidating it can
/// never discard a neighbour's dirty data.
#[repr(C, align(64))]
struct LineAligned<T>(T);

/// The real firmware, reached through the VideoCore mailbox
pub struct VideoCoreMailbox;

impl FramebufferMailbox for VideoCoreMailbox {
    fn exchange(&mut self, message: &mut FbConfig) -> bool {
        // The band about to go on screen was drawn through the cache
        if let Some((bus, len)) = message.displayed_region() {
            let start = self.map_buffer(bus) as usize;
            clean_dcache_range(start, len as usize);
        }

        let mut wire = LineAligned(*message);
        let accepted = mailbox_call(&mut wire, CHANNEL_FRAMEBUFFER) == 0;
        *message = wire.0;
        accepted
    }
}
