//! BCM2837 interrupt controller
//!
//! Only the GPU-side controller is used. IRQs 0-31 live in the
//! "IRQ 1" registers and 32-63 in "IRQ 2"; the GPIO banks are 49-52.

use crate::platform_core::mmio::{mmio_read, mmio_write, PERIPHERAL_BASE};

const IRQ_BASE: usize = PERIPHERAL_BASE + 0x0000_B200;

const IRQ_PENDING_1: usize = IRQ_BASE + 0x04;
const IRQ_PENDING_2: usize = IRQ_BASE + 0x08;
const ENABLE_IRQS_1: usize = IRQ_BASE + 0x10;
const ENABLE_IRQS_2: usize = IRQ_BASE + 0x14;
const DISABLE_IRQS_1: usize = IRQ_BASE + 0x1C;
const DISABLE_IRQS_2: usize = IRQ_BASE + 0x20;

/// GPIO bank 0 (pins 0-27)
pub const IRQ_GPIO_BANK0: u32 = 49;

/// Enable one GPU interrupt line.
pub fn enable(irq: u32) {
    if irq < 32 {
        mmio_write(ENABLE_IRQS_1, 1 << irq);
    } else {
        mmio_write(ENABLE_IRQS_2, 1 << (irq - 32));
    }
}

/// Disable every GPU interrupt line.
pub fn disable_all() {
    mmio_write(DISABLE_IRQS_1, 0xFFFF_FFFF);
    mmio_write(DISABLE_IRQS_2, 0xFFFF_FFFF);
}

/// True if `irq` is asserted
pub fn is_pending(irq: u32) -> bool {
    if irq < 32 {
        mmio_read(IRQ_PENDING_1) & (1 << irq) != 0
    } else {
        mmio_read(IRQ_PENDING_2) & (1 << (irq - 32)) != 0
    }
}
