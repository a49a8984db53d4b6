//! State shared between the main loop and interrupt handlers
//!
//! On a single core the only contender for shared state is an interrupt
//! handler. [`Exclusive`] masks interrupts for the whole access and then
//! takes a spin lock, so a handler can never observe a half-finished
//! read-modify-write. The lock itself should never spin: if it does,
//! something touched the value with interrupts enabled.

use core::marker::PhantomData;

use spin::Mutex;

use crate::platform::InterruptMask;

/// A value that is only touched with interrupts masked
pub struct Exclusive<T, I: InterruptMask> {
    inner: Mutex<Option<T>>,
    _mask: PhantomData<fn() -> I>,
}

impl<T, I: InterruptMask> Exclusive<T, I> {
    /// An empty cell, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
            _mask: PhantomData,
        }
    }

    /// Store `value`, returning the previous one if any.
    pub fn install(&self, value: T) -> Option<T> {
        self.with_slot(|slot| slot.replace(value))
    }

    /// Run `f` on the value with interrupts masked.
    ///
    /// Returns `None` without calling `f` if nothing is installed yet,
    /// e.g. when an interrupt arrives before initialization finished.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.with_slot(|slot| slot.as_mut().map(f))
    }

    /// True once a value has been installed
    pub fn is_installed(&self) -> bool {
        self.with_slot(|slot| slot.is_some())
    }

    fn with_slot<R>(&self, f: impl FnOnce(&mut Option<T>) -> R) -> R {
        let saved = I::disable();
        let result = {
            let mut slot = self.inner.lock();
            f(&mut slot)
        };
        I::restore(saved);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingMask;

    #[test]
    fn test_empty_cell_skips_closure() {
        let cell: Exclusive<u32, CountingMask> = Exclusive::new();
        let mut called = false;

        assert_eq!(cell.with(|_| called = true), None);
        assert!(!called);
        assert!(!cell.is_installed());
    }

    #[test]
    fn test_install_and_mutate() {
        let cell: Exclusive<u32, CountingMask> = Exclusive::new();
        assert_eq!(cell.install(5), None);

        assert_eq!(cell.with(|v| { *v += 1; *v }), Some(6));
        assert_eq!(cell.install(10), Some(6));
        assert_eq!(cell.with(|v| *v), Some(10));
    }

    #[test]
    fn test_mask_wraps_every_access() {
        let cell: Exclusive<u32, CountingMask> = Exclusive::new();
        let before = CountingMask::snapshot();

        cell.install(1);
        cell.with(|v| {
            // Masked for the duration of the closure
            assert!(CountingMask::is_masked());
            *v += 1;
        });

        let after = CountingMask::snapshot();
        assert_eq!(after.disables - before.disables, 2);
        assert_eq!(after.restores - before.restores, 2);
        assert!(!CountingMask::is_masked());
    }

    #[test]
    fn test_inner_cell_leaves_outer_masked() {
        let scene: Exclusive<u32, CountingMask> = Exclusive::new();
        let console: Exclusive<u32, CountingMask> = Exclusive::new();
        scene.install(0);
        console.install(0);

        scene.with(|_| {
            console.with(|lines| *lines += 1);
            // Logging from inside a critical section must not unmask it
            assert!(CountingMask::is_masked());
        });

        assert!(!CountingMask::is_masked());
        assert_eq!(console.with(|lines| *lines), Some(1));
    }
}
