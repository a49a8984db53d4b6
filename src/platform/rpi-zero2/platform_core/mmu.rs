//! MMU setup for RPi Zero 2W (BCM2837)
//!
//! Identity map with 2MB blocks:
//!   0x00000000 - 0x3EFFFFFF: RAM (Normal, write-back, inner shareable)
//!   0x3F000000 - 0x3FFFFFFF: Peripherals (Device-nGnRnE)
//!   0x40000000 - 0x7FFFFFFF: Local peripherals (Device-nGnRnE)
//!
//! RAM has to be cacheable before any lock is taken: the A53 only
//! completes exclusive load/store pairs through its local monitor on
//! cacheable memory, and the BCM2837 has no global monitor. The
//! framebuffer shares the RAM mapping, so whatever the VideoCore scans
//! out or reads from a mailbox message is cleaned first (see
//! [`super::cache`]).

use core::arch::asm;

// 4KB-aligned page tables
#[repr(C, align(4096))]
struct PageTable([u64; 512]);

static mut L1_TABLE: PageTable = PageTable([0; 512]);
static mut L2_TABLE: PageTable = PageTable([0; 512]);

// Descriptor type bits [1:0]
const DESC_BLOCK: u64 = 0b01; // Block entry (L1=1GB, L2=2MB)
const DESC_TABLE: u64 = 0b11; // Table entry (points to next level)

// Block descriptor attribute bits
const ATTR_IDX_SHIFT: u64 = 2; // AttrIndx[2:0] at bits [4:2]
const SH_INNER: u64 = 3 << 8; // SH[1:0]: Inner Shareable
const AF: u64 = 1 << 10; // Access Flag (must be 1)

// MAIR attribute indices
const ATTR_DEVICE: u64 = 0; // Device-nGnRnE
const ATTR_NORMAL: u64 = 1; // Normal, Write-Back

/// First 2MB block of the peripheral window
const PERIPHERAL_BLOCK: usize = 0x3F00_0000 / 0x20_0000;
const BLOCK_SIZE: u64 = 0x20_0000;

/// Build the identity map and turn on the MMU with both caches.
///
/// # Safety
///
/// Must run once, at EL1, before any lock or atomic is used and while
/// nothing else holds references into memory whose attributes change.
pub unsafe fn init() {
    build_tables();

    // Attr0 = 0x00: Device-nGnRnE
    // Attr1 = 0xFF: Normal, Write-Back, Read/Write-Allocate
    let mair: u64 = (0x00 << (ATTR_DEVICE * 8)) | (0xFF << (ATTR_NORMAL * 8));

    let tcr: u64 = 25           // T0SZ=25: 39-bit VA space, walks start at L1
        | (0b01 << 8)           // IRGN0: Inner Write-Back Cacheable
        | (0b01 << 10)          // ORGN0: Outer Write-Back Cacheable
        | (0b11 << 12)          // SH0: Inner Shareable
        | (0b00 << 14)          // TG0: 4KB granule
        | (1 << 23);            // EPD1: no TTBR1 walks

    let ttbr = &raw const L1_TABLE as u64;

    unsafe {
        asm!("msr mair_el1, {}", in(reg) mair, options(nostack));
        asm!("msr tcr_el1, {}", in(reg) tcr, options(nostack));
        asm!("msr ttbr0_el1, {}", in(reg) ttbr, options(nostack));

        // Tables must be visible to the walker before it starts
        asm!("dsb sy", "isb", options(nostack));
        asm!("tlbi vmalle1", "dsb sy", "isb", options(nostack));

        let mut sctlr: u64;
        asm!("mrs {}, sctlr_el1", out(reg) sctlr, options(nostack));
        sctlr |= 1 << 0; // M: MMU enable
        sctlr |= 1 << 2; // C: Data cache enable
        sctlr |= 1 << 12; // I: Instruction cache enable
        asm!("msr sctlr_el1, {}", "isb", in(reg) sctlr, options(nostack));
    }
}

fn build_tables() {
    let l1 = &raw mut L1_TABLE;
    let l2 = &raw mut L2_TABLE;

    let normal = DESC_BLOCK | (ATTR_NORMAL << ATTR_IDX_SHIFT) | SH_INNER | AF;
    let device = DESC_BLOCK | (ATTR_DEVICE << ATTR_IDX_SHIFT) | AF;

    // SAFETY: only called from init(), before the MMU is on and before
    // anything else could look at the tables.
    unsafe {
        for i in 0..512 {
            let base = i as u64 * BLOCK_SIZE;
            let attrs = if i < PERIPHERAL_BLOCK { normal } else { device };
            (*l2).0[i] = base | attrs;
        }

        // 0x00000000 - 0x3FFFFFFF through the L2 table
        (*l1).0[0] = l2 as u64 | DESC_TABLE;
        // 0x40000000 - 0x7FFFFFFF as one 1GB device block
        (*l1).0[1] = 0x4000_0000 | device;
    }
}
