//! CPU control: exception level, interrupt masking, halting

use glcore::InterruptMask;

use crate::platform_core::mmio::wfe;

// ============================================================================
// Exception Level
// ============================================================================

/// Get current exception level (1, 2, or 3)
pub fn get_exception_level() -> u8 {
    let el: u64;
    unsafe {
        core::arch::asm!("mrs {}, CurrentEL", out(reg) el);
    }
    ((el >> 2) & 0x3) as u8
}

// ============================================================================
// Interrupt Masking
// ============================================================================

/// DAIF.I, the IRQ mask bit as read from the `daif` register
const DAIF_IRQ: u64 = 1 << 7;

/// Unmask IRQs at the CPU.
#[inline]
pub fn enable_irq() {
    unsafe { core::arch::asm!("msr daifclr, #2", options(nomem, nostack)) }
}

/// Mask IRQs at the CPU.
#[inline]
pub fn disable_irq() {
    unsafe { core::arch::asm!("msr daifset, #2", options(nomem, nostack)) }
}

/// IRQ masking through the DAIF register.
///
/// Saving and restoring the previous state makes nested use from the
/// IRQ handler (where IRQs are already masked) harmless.
pub struct DaifMask;

impl InterruptMask for DaifMask {
    fn disable() -> usize {
        let daif: u64;
        unsafe {
            core::arch::asm!("mrs {}, daif", out(reg) daif, options(nomem, nostack));
        }
        disable_irq();
        (daif & DAIF_IRQ) as usize
    }

    fn restore(saved: usize) {
        if saved as u64 & DAIF_IRQ == 0 {
            enable_irq();
        }
    }
}

// ============================================================================
// Halting
// ============================================================================

pub fn halt() -> ! {
    disable_irq();
    loop {
        wfe();
    }
}
