//! BCM2837 system timer as the game's tick source

use glcore::TickSource;

use crate::platform_core::mmio::{delay_us, micros};

/// Free-running 1 MHz counter
pub struct SystemTimer;

impl TickSource for SystemTimer {
    #[inline]
    fn ticks(&self) -> u32 {
        micros()
    }

    fn delay_us(&self, us: u32) {
        delay_us(us);
    }
}
