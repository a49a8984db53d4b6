//! Data cache maintenance by virtual address
//!
//! RAM is mapped write-back, so memory the VideoCore reads (mailbox
//! messages, the band being scanned out) has to be cleaned to the point
//! of coherency first, and memory it writes has to be invalidated
//! before the CPU reads it back.

use core::arch::asm;

/// Smallest data cache line in bytes, from CTR_EL0.DminLine
#[inline]
fn dcache_line() -> usize {
    let ctr: u64;
    unsafe {
        asm!("mrs {}, ctr_el0", out(reg) ctr, options(nomem, nostack));
    }
    4 << ((ctr >> 16) & 0xF)
}

fn for_each_line(start: usize, len: usize, op: impl Fn(usize)) {
    if len == 0 {
        return;
    }
    let line = dcache_line();
    let end = start + len;
    let mut addr = start & !(line - 1);
    while addr < end {
        op(addr);
        addr += line;
    }
    unsafe {
        asm!("dsb sy", options(nostack));
    }
}

/// Write dirty lines in `[start, start + len)` back to memory.
pub fn clean_dcache_range(start: usize, len: usize) {
    for_each_line(start, len, |addr| unsafe {
        asm!("dc cvac, {}", in(reg) addr, options(nostack));
    });
}

/// Write back and drop every line in `[start, start + len)`, so the
/// next CPU read comes from memory.
pub fn clean_invalidate_dcache_range(start: usize, len: usize) {
    for_each_line(start, len, |addr| unsafe {
        asm!("dc civac, {}", in(reg) addr, options(nostack));
    });
}
