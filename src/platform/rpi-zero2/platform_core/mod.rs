//! Low-Level Core Modules
//!
//! Foundation layer with no dependencies on other platform modules.
//! Provides memory-mapped I/O, CPU control, the MMU and cache
//! maintenance, and the interrupt controller.

pub mod cache;
pub mod cpu;
pub mod irq;
pub mod mmio;
pub mod mmu;

// Re-exports for convenience
pub use cpu::{halt, DaifMask};
