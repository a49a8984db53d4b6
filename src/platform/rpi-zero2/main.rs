//! # Raspberry Pi Zero 2W Bare-Metal Kernel Entry Point
//!
//! Negotiates the triple-band framebuffer, runs the paced render loop
//! and services the button interrupt on GPIO17. All game state lives in
//! one [`Exclusive`] cell shared by the loop and the IRQ handler, so a
//! press is only ever handled between two frames.

#![no_std]
#![no_main]

mod boot;
mod hal;
mod platform_core;

use core::panic::PanicInfo;

use glcore::{BugKind, EventPin, Exclusive, Game, GameConfig, PressOutcome};

use crate::hal::{ButtonPin, SystemTimer, VideoCoreMailbox};
use crate::platform_core::cpu::{enable_irq, get_exception_level};
use crate::platform_core::irq::{self, IRQ_GPIO_BANK0};
use crate::platform_core::{halt, DaifMask};

// =============================================================================
// Shared State
// =============================================================================

/// Everything the main loop and the button handler both touch
struct Scene {
    game: Game<VideoCoreMailbox>,
    button: ButtonPin,
}

static SCENE: Exclusive<Scene, DaifMask> = Exclusive::new();

// =============================================================================
// Kernel Entry Point
// =============================================================================

#[unsafe(no_mangle)]
pub extern "C" fn kernel_main() -> ! {
    // SAFETY: first thing on the only running core, nothing is borrowed
    // yet and no lock has been taken
    unsafe { platform_core::mmu::init(); }

    hal::uart::init();
    kprintln!();
    kprintln!("bugflash: running at EL{}", get_exception_level());

    let config = GameConfig::DEFAULT;

    let game = match Game::start(VideoCoreMailbox, config, &SystemTimer, BugKind::Ant) {
        Ok(game) => game,
        Err(e) => {
            kprintln!("framebuffer: {}", e);
            halt_with_message("framebuffer negotiation failed");
        }
    };

    let fb = game.framebuffer();
    kprintln!(
        "framebuffer: {}x{} pitch {} size {} bytes at {:#010x}",
        fb.width(),
        fb.height(),
        fb.pitch(),
        fb.config().total_bytes,
        fb.config().framebuffer,
    );

    // =========================================================================
    // BUTTON INTERRUPT
    // =========================================================================

    let button = ButtonPin::configure(config.button_pin);
    SCENE.install(Scene { game, button });

    irq::disable_all();
    irq::enable(IRQ_GPIO_BANK0);
    boot::install_vector_table();
    enable_irq();

    kprintln!("button: GPIO{} falling edge on IRQ {}", config.button_pin, IRQ_GPIO_BANK0);

    // =========================================================================
    // MAIN LOOP
    // =========================================================================

    loop {
        if let Some(Err(e)) = SCENE.with(|scene| scene.game.tick(&SystemTimer)) {
            kprintln!("present failed: {}", e);
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn halt_with_message(msg: &str) -> ! {
    kprintln!("halt: {}", msg);
    halt()
}

// =============================================================================
// Exception Handling
// =============================================================================

#[unsafe(no_mangle)]
pub extern "C" fn handle_irq() {
    if !irq::is_pending(IRQ_GPIO_BANK0) {
        return;
    }

    let handled = SCENE.with(|scene| {
        if !scene.button.event_pending() {
            return None;
        }
        Some(scene.game.on_button(&SystemTimer, &mut scene.button))
    });

    match handled {
        Some(Some(Ok(PressOutcome::Flashed))) => kprintln!("button: flash"),
        Some(Some(Ok(PressOutcome::RateLimited))) => kprintln!("button: ignored, too soon"),
        Some(Some(Err(e))) => kprintln!("button: {}", e),
        Some(None) => {}
        None => {
            // Edge before the scene exists: drop it so the line deasserts
            let mut pin = ButtonPin::attach(GameConfig::DEFAULT.button_pin);
            pin.clear_event();
            kprintln!("button: {}", glcore::Error::NotNegotiated);
        }
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn handle_sync_exception(esr: u64, far: u64, elr: u64) -> ! {
    kprintln!("sync exception: esr {:#x} far {:#x} elr {:#x}", esr, far, elr);
    halt()
}

// =============================================================================
// Panic Handler
// =============================================================================

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    if let Some(loc) = info.location() {
        kprintln!("panic at {}:{}", loc.file(), loc.line());
    }
    kprintln!("{}", info.message());
    halt()
}
