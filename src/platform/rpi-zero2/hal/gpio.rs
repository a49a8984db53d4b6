//! GPIO configuration for Raspberry Pi Zero 2W
//!
//! Pin function selection, pull-up/down and edge-event detection. The
//! button input is an [`EventPin`] backed by the falling-edge detector
//! and the event status register.

use glcore::EventPin;

use crate::platform_core::mmio::{mmio_read, mmio_write, delay_us, PERIPHERAL_BASE};

// ============================================================================
// GPIO Register Addresses
// ============================================================================

const GPIO_BASE: usize = PERIPHERAL_BASE + 0x0020_0000;

/// GPIO Event Detect Status registers (write 1 to clear)
const GPEDS0: usize = GPIO_BASE + 0x40;  // GPIO 0-31
const GPEDS1: usize = GPIO_BASE + 0x44;  // GPIO 32-53

/// GPIO Falling Edge Detect Enable registers
const GPFEN0: usize = GPIO_BASE + 0x58;  // GPIO 0-31
const GPFEN1: usize = GPIO_BASE + 0x5C;  // GPIO 32-53

/// GPIO Pull-up/down Enable register
const GPPUD: usize = GPIO_BASE + 0x94;

/// GPIO Pull-up/down Enable Clock registers
const GPPUDCLK0: usize = GPIO_BASE + 0x98; // GPIO 0-31
const GPPUDCLK1: usize = GPIO_BASE + 0x9C; // GPIO 32-53

// ============================================================================
// GPIO Function Select Values
// ============================================================================

/// GPIO function select values (3 bits each)
#[repr(u32)]
#[derive(Clone, Copy)]
pub enum GpioFunction {
    Input  = 0b000,
    Alt5   = 0b010,
}

/// GPIO pull-up/down configuration
#[repr(u32)]
#[derive(Clone, Copy)]
pub enum GpioPull {
    Off  = 0,
    Up   = 2,
}

// ============================================================================
// GPIO Operations
// ============================================================================

/// Pick the bank-0 or bank-1 register for `pin` and the bit within it
#[inline]
fn bank(pin: u32, reg0: usize, reg1: usize) -> (usize, u32) {
    if pin < 32 {
        (reg0, 1 << pin)
    } else {
        (reg1, 1 << (pin - 32))
    }
}

/// Set the function of a single GPIO pin
pub fn set_pin_function(pin: u32, function: GpioFunction) {
    let reg_offset = (pin / 10) as usize * 4;
    let reg_addr = GPIO_BASE + reg_offset;
    let shift = (pin % 10) * 3;
    let mask = 0b111 << shift;

    let mut val = mmio_read(reg_addr);
    val = (val & !mask) | ((function as u32) << shift);
    mmio_write(reg_addr, val);
}

/// Configure pull-up/down for a GPIO pin
pub fn set_pin_pull(pin: u32, pull: GpioPull) {
    let (clk, bit) = bank(pin, GPPUDCLK0, GPPUDCLK1);

    // Set the pull type
    mmio_write(GPPUD, pull as u32);
    delay_us(150);

    // Clock the configuration to the specific pin
    mmio_write(clk, bit);
    delay_us(150);

    // Clear the configuration
    mmio_write(GPPUD, 0);
    mmio_write(clk, 0);
}

/// Latch an event on every high-to-low transition of `pin`
pub fn enable_falling_edge(pin: u32) {
    let (reg, bit) = bank(pin, GPFEN0, GPFEN1);
    mmio_write(reg, mmio_read(reg) | bit);
}

/// True if an edge event is latched for `pin`
pub fn event_pending(pin: u32) -> bool {
    let (reg, bit) = bank(pin, GPEDS0, GPEDS1);
    mmio_read(reg) & bit != 0
}

/// Acknowledge the latched event for `pin`
pub fn clear_event(pin: u32) {
    let (reg, bit) = bank(pin, GPEDS0, GPEDS1);
    mmio_write(reg, bit);
}

// ============================================================================
// Button
// ============================================================================

/// Active-low push button with falling-edge interrupts
pub struct ButtonPin {
    pin: u32,
}

impl ButtonPin {
    /// Configure `pin` as a pulled-up input that latches falling edges.
    pub fn configure(pin: u32) -> Self {
        set_pin_function(pin, GpioFunction::Input);
        set_pin_pull(pin, GpioPull::Up);
        clear_event(pin);
        enable_falling_edge(pin);
        Self { pin }
    }

    /// Handle for a pin that is already configured
    pub const fn attach(pin: u32) -> Self {
        Self { pin }
    }

    pub fn event_pending(&self) -> bool {
        event_pending(self.pin)
    }
}

impl EventPin for ButtonPin {
    fn clear_event(&mut self) {
        clear_event(self.pin);
    }
}
