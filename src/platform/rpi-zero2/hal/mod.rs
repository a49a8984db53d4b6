//! Hardware Abstraction Layer
//!
//! GPIO, the VideoCore mailbox, the system timer and the Mini UART
//! console. Depends on: platform_core

pub mod gpio;
pub mod mailbox;
pub mod timer;
pub mod uart;

// Re-exports for convenience
pub use gpio::ButtonPin;
pub use mailbox::VideoCoreMailbox;
pub use timer::SystemTimer;
