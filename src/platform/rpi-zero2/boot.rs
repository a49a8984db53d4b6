//! Boot entry and exception vectors for AArch64.
//!
//! The firmware enters `_start` on all four cores at EL2. Core 0 drops to
//! EL1h, unlocks FP/SIMD, sets its stack, clears BSS and jumps to
//! `kernel_main`; the other cores sleep forever. The MMU comes up later
//! in `kernel_main`, before the first lock is taken.

use core::arch::global_asm;

global_asm!(
    r#"
.section .text._start
.global _start

_start:
    mrs     x0, mpidr_el1
    and     x0, x0, #0xFF
    cbnz    x0, .Lpark

    mrs     x0, CurrentEL
    lsr     x0, x0, #2
    cmp     x0, #2
    b.ne    .Lin_el1

    // EL1 runs AArch64, no FP traps at EL2
    mov     x0, #(1 << 31)
    msr     hcr_el2, x0
    mov     x0, #0x33ff
    msr     cptr_el2, x0
    msr     hstr_el2, xzr

    // MMU and caches off at EL1
    ldr     x0, =0x30d00800
    msr     sctlr_el1, x0

    // EL1h with DAIF masked
    mov     x0, #0x3c5
    msr     spsr_el2, x0
    adr     x0, .Lin_el1
    msr     elr_el2, x0
    eret

.Lin_el1:
    mov     x0, #(3 << 20)
    msr     cpacr_el1, x0
    isb

    ldr     x0, =__stack_top
    mov     sp, x0

    ldr     x0, =__bss_start
    ldr     x1, =__bss_end
.Lclear_bss:
    cmp     x0, x1
    b.ge    .Ldone_bss
    str     xzr, [x0], #8
    b       .Lclear_bss
.Ldone_bss:

    bl      kernel_main

.Lhalt:
    wfe
    b       .Lhalt

.Lpark:
    wfe
    b       .Lpark
"#
);

// Each entry is 128 bytes (0x80). Only the current-EL/SPx group is live:
// the kernel never leaves EL1h.
global_asm!(
    r#"
.section .text.vectors
.balign 0x800
.global __exception_vectors
__exception_vectors:

// Current EL with SP0
.balign 0x80
    b       __exception_hang
.balign 0x80
    b       __exception_hang
.balign 0x80
    b       __exception_hang
.balign 0x80
    b       __exception_hang

// Current EL with SPx
.balign 0x80
    b       __exception_sync_spx
.balign 0x80
    b       __exception_irq_spx
.balign 0x80
    b       __exception_hang
.balign 0x80
    b       __exception_hang

// Lower EL using AArch64
.balign 0x80
    b       __exception_hang
.balign 0x80
    b       __exception_hang
.balign 0x80
    b       __exception_hang
.balign 0x80
    b       __exception_hang

// Lower EL using AArch32
.balign 0x80
    b       __exception_hang
.balign 0x80
    b       __exception_hang
.balign 0x80
    b       __exception_hang
.balign 0x80
    b       __exception_hang

__exception_sync_spx:
    mrs     x0, esr_el1
    mrs     x1, far_el1
    mrs     x2, elr_el1
    bl      handle_sync_exception
    b       __exception_hang

// Saves all caller-saved integer and SIMD state plus ELR/SPSR.
// The interrupted frame may be in the middle of float rasterizing.
__exception_irq_spx:
    sub     sp, sp, #(16 * 12)
    stp     x0, x1, [sp, #16 * 0]
    stp     x2, x3, [sp, #16 * 1]
    stp     x4, x5, [sp, #16 * 2]
    stp     x6, x7, [sp, #16 * 3]
    stp     x8, x9, [sp, #16 * 4]
    stp     x10, x11, [sp, #16 * 5]
    stp     x12, x13, [sp, #16 * 6]
    stp     x14, x15, [sp, #16 * 7]
    stp     x16, x17, [sp, #16 * 8]
    stp     x18, x29, [sp, #16 * 9]
    mrs     x0, elr_el1
    mrs     x1, spsr_el1
    stp     x30, x0, [sp, #16 * 10]
    str     x1, [sp, #16 * 11]

    sub     sp, sp, #(16 * 33)
    mrs     x0, fpcr
    mrs     x1, fpsr
    stp     x0, x1, [sp]
    stp     q0, q1, [sp, #16 + 32 * 0]
    stp     q2, q3, [sp, #16 + 32 * 1]
    stp     q4, q5, [sp, #16 + 32 * 2]
    stp     q6, q7, [sp, #16 + 32 * 3]
    stp     q8, q9, [sp, #16 + 32 * 4]
    stp     q10, q11, [sp, #16 + 32 * 5]
    stp     q12, q13, [sp, #16 + 32 * 6]
    stp     q14, q15, [sp, #16 + 32 * 7]
    stp     q16, q17, [sp, #16 + 32 * 8]
    stp     q18, q19, [sp, #16 + 32 * 9]
    stp     q20, q21, [sp, #16 + 32 * 10]
    stp     q22, q23, [sp, #16 + 32 * 11]
    stp     q24, q25, [sp, #16 + 32 * 12]
    stp     q26, q27, [sp, #16 + 32 * 13]
    stp     q28, q29, [sp, #16 + 32 * 14]
    stp     q30, q31, [sp, #16 + 32 * 15]

    bl      handle_irq

    ldp     q30, q31, [sp, #16 + 32 * 15]
    ldp     q28, q29, [sp, #16 + 32 * 14]
    ldp     q26, q27, [sp, #16 + 32 * 13]
    ldp     q24, q25, [sp, #16 + 32 * 12]
    ldp     q22, q23, [sp, #16 + 32 * 11]
    ldp     q20, q21, [sp, #16 + 32 * 10]
    ldp     q18, q19, [sp, #16 + 32 * 9]
    ldp     q16, q17, [sp, #16 + 32 * 8]
    ldp     q14, q15, [sp, #16 + 32 * 7]
    ldp     q12, q13, [sp, #16 + 32 * 6]
    ldp     q10, q11, [sp, #16 + 32 * 5]
    ldp     q8, q9, [sp, #16 + 32 * 4]
    ldp     q6, q7, [sp, #16 + 32 * 3]
    ldp     q4, q5, [sp, #16 + 32 * 2]
    ldp     q2, q3, [sp, #16 + 32 * 1]
    ldp     q0, q1, [sp, #16 + 32 * 0]
    ldp     x0, x1, [sp]
    msr     fpcr, x0
    msr     fpsr, x1
    add     sp, sp, #(16 * 33)

    ldr     x1, [sp, #16 * 11]
    ldp     x30, x0, [sp, #16 * 10]
    msr     elr_el1, x0
    msr     spsr_el1, x1
    ldp     x18, x29, [sp, #16 * 9]
    ldp     x16, x17, [sp, #16 * 8]
    ldp     x14, x15, [sp, #16 * 7]
    ldp     x12, x13, [sp, #16 * 6]
    ldp     x10, x11, [sp, #16 * 5]
    ldp     x8, x9, [sp, #16 * 4]
    ldp     x6, x7, [sp, #16 * 3]
    ldp     x4, x5, [sp, #16 * 2]
    ldp     x2, x3, [sp, #16 * 1]
    ldp     x0, x1, [sp, #16 * 0]
    add     sp, sp, #(16 * 12)
    eret

__exception_hang:
    wfe
    b       __exception_hang
"#
);

/// Point VBAR_EL1 at the vector table above.
pub fn install_vector_table() {
    unsafe extern "C" {
        static __exception_vectors: u8;
    }

    let vectors = &raw const __exception_vectors as u64;
    unsafe {
        core::arch::asm!(
            "msr vbar_el1, {}",
            "isb",
            in(reg) vectors,
            options(nostack)
        );
    }
}
