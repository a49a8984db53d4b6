//! Platform traits
//!
//! Everything the core needs from the board goes through these traits.
//! The Raspberry Pi kernel implements them on top of MMIO; the unit
//! tests implement them on plain memory.

use crate::framebuffer::FbConfig;

/// Firmware transport for the framebuffer negotiation message.
pub trait FramebufferMailbox {
    /// Hand `message` to the firmware and wait for the answer.
    ///
    /// The firmware fills in `pitch`, `framebuffer` and `total_bytes`
    /// in place. Returns true if the firmware accepted the request.
    fn exchange(&mut self, message: &mut FbConfig) -> bool;

    /// Translate the firmware's bus address into a CPU pointer.
    ///
    /// The default strips the VideoCore cache-alias bits, which is what
    /// the BCM2837 needs.
    fn map_buffer(&mut self, bus_addr: u32) -> *mut u32 {
        (bus_addr & 0x3FFF_FFFF) as usize as *mut u32
    }
}

/// Free-running microsecond counter
pub trait TickSource {
    /// Current counter value. Wraps at `u32::MAX`.
    fn ticks(&self) -> u32;

    /// Spin until `us` ticks have elapsed. Nothing else runs meanwhile.
    fn delay_us(&self, us: u32) {
        let start = self.ticks();
        while self.ticks().wrapping_sub(start) < us {
            core::hint::spin_loop();
        }
    }
}

/// An input pin with edge-event latching
pub trait EventPin {
    /// Acknowledge the latched edge event. Must be called before the
    /// interrupt handler returns, otherwise the interrupt fires again.
    fn clear_event(&mut self);
}

/// CPU interrupt masking
pub trait InterruptMask {
    /// Mask interrupts and return the previous mask state.
    fn disable() -> usize;

    /// Restore a state returned by [`InterruptMask::disable`].
    fn restore(saved: usize);
}
