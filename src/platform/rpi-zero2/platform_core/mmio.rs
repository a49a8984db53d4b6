//! Low-level MMIO, timing, and memory barrier primitives
//!
//! Every driver in this kernel reaches the hardware through these
//! functions. The peripheral window is mapped Device-nGnRnE, so these
//! accesses bypass the cache and the barriers only order them.

use core::ptr::{read_volatile, write_volatile};

// ============================================================================
// Hardware Base Addresses
// ============================================================================

/// BCM2837 peripheral base address (Pi Zero 2W / Pi 3)
pub const PERIPHERAL_BASE: usize = 0x3F00_0000;

// ============================================================================
// System Timer Registers
// ============================================================================

const SYSTIMER_BASE: usize = PERIPHERAL_BASE + 0x0000_3000;

/// System timer counter low 32 bits (1MHz)
const SYSTIMER_CLO: usize = SYSTIMER_BASE + 0x04;

// ============================================================================
// MMIO Access Functions
// ============================================================================

/// Read a 32-bit value from an MMIO address
#[inline(always)]
pub fn mmio_read(addr: usize) -> u32 {
    unsafe { read_volatile(addr as *const u32) }
}

/// Write a 32-bit value to an MMIO address
#[inline(always)]
pub fn mmio_write(addr: usize, val: u32) {
    unsafe { write_volatile(addr as *mut u32, val) }
}

// ============================================================================
// Memory Barriers
// ============================================================================

/// Data Memory Barrier
#[inline(always)]
pub fn dmb() {
    unsafe { core::arch::asm!("dmb sy"); }
}

/// Wait For Event - low-power wait until event
#[inline(always)]
pub fn wfe() {
    unsafe { core::arch::asm!("wfe"); }
}

// ============================================================================
// Timing Functions
// ============================================================================

/// Get current system timer value in microseconds
#[inline]
pub fn micros() -> u32 {
    mmio_read(SYSTIMER_CLO)
}

/// Delay for specified number of microseconds
pub fn delay_us(us: u32) {
    let start = micros();
    while micros().wrapping_sub(start) < us {
        core::hint::spin_loop();
    }
}
