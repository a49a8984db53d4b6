//! Mini UART debug console
//!
//! The Mini UART sits in the AUX block and needs no mailbox clock setup,
//! which makes it the simplest log sink on the Pi Zero 2W. Output goes
//! through [`kprint!`]/[`kprintln!`], which are no-ops unless the
//! `debug_uart` feature is enabled.
//!
//! Pins: GPIO14 (TXD1), GPIO15 (RXD1), both ALT5.

use core::fmt;

use glcore::Exclusive;

use crate::hal::gpio::{set_pin_function, set_pin_pull, GpioFunction, GpioPull};
use crate::platform_core::mmio::{mmio_read, mmio_write, PERIPHERAL_BASE};
use crate::platform_core::DaifMask;

/// AUX peripheral base (contains Mini UART, SPI1, SPI2)
const AUX_BASE: usize = PERIPHERAL_BASE + 0x0021_5000;

/// Mini UART registers
mod regs {
    use super::AUX_BASE;

    pub const AUX_ENABLES: usize = AUX_BASE + 0x04;
    pub const AUX_MU_IO: usize = AUX_BASE + 0x40;
    pub const AUX_MU_IER: usize = AUX_BASE + 0x44;
    pub const AUX_MU_IIR: usize = AUX_BASE + 0x48;
    pub const AUX_MU_LCR: usize = AUX_BASE + 0x4C;
    pub const AUX_MU_MCR: usize = AUX_BASE + 0x50;
    pub const AUX_MU_LSR: usize = AUX_BASE + 0x54;
    pub const AUX_MU_CNTL: usize = AUX_BASE + 0x60;
    pub const AUX_MU_BAUD: usize = AUX_BASE + 0x68;
}

/// Line status: transmitter can accept a byte
const LSR_TX_EMPTY: u32 = 1 << 5;

const TX_PIN: u32 = 14;
const RX_PIN: u32 = 15;

/// VPU clock the Mini UART baud generator runs from
const SYSTEM_CLOCK: u32 = 250_000_000;

pub const DEFAULT_BAUD: u32 = 115_200;

/// Shared console used by the log macros. Empty until [`init`], so
/// early output is dropped. Prints run with IRQs masked, which lets the
/// button handler log while the main loop is mid-line.
pub static CONSOLE: Exclusive<MiniUart, DaifMask> = Exclusive::new();

pub struct MiniUart {
    _private: (),
}

impl MiniUart {
    /// Formula: baudrate_reg = (system_clock / (8 * baud)) - 1
    fn divisor(baud: u32) -> u32 {
        (SYSTEM_CLOCK / (8 * baud)) - 1
    }

    pub fn init(baud: u32) -> Self {
        mmio_write(regs::AUX_ENABLES, mmio_read(regs::AUX_ENABLES) | 1);

        // Disable TX/RX and interrupts while configuring
        mmio_write(regs::AUX_MU_CNTL, 0);
        mmio_write(regs::AUX_MU_IER, 0);

        // 8-bit mode
        mmio_write(regs::AUX_MU_LCR, 3);
        mmio_write(regs::AUX_MU_MCR, 0);

        // Clear FIFOs
        mmio_write(regs::AUX_MU_IIR, 0xC6);
        mmio_write(regs::AUX_MU_BAUD, Self::divisor(baud));

        set_pin_pull(TX_PIN, GpioPull::Off);
        set_pin_pull(RX_PIN, GpioPull::Up);
        set_pin_function(TX_PIN, GpioFunction::Alt5);
        set_pin_function(RX_PIN, GpioFunction::Alt5);

        mmio_write(regs::AUX_MU_CNTL, 3);
        Self { _private: () }
    }

    pub fn write_byte(&mut self, byte: u8) {
        while mmio_read(regs::AUX_MU_LSR) & LSR_TX_EMPTY == 0 {
            core::hint::spin_loop();
        }
        mmio_write(regs::AUX_MU_IO, byte as u32);
    }
}

impl fmt::Write for MiniUart {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
        Ok(())
    }
}

/// Bring up the console. Without `debug_uart` the pins are left alone.
pub fn init() {
    if cfg!(feature = "debug_uart") {
        CONSOLE.install(MiniUart::init(DEFAULT_BAUD));
    }
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    use core::fmt::Write;
    CONSOLE.with(|uart| {
        let _ = uart.write_fmt(args);
    });
}

#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {{
        if cfg!(feature = "debug_uart") {
            $crate::hal::uart::_print(format_args!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! kprintln {
    () => { $crate::kprint!("\n") };
    ($($arg:tt)*) => {{
        if cfg!(feature = "debug_uart") {
            $crate::hal::uart::_print(format_args!("{}\n", format_args!($($arg)*)));
        }
    }};
}
