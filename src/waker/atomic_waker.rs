use std::cell::UnsafeCell;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering::*};
use std::task::Waker;

/// Idle state
const WAITING: usize = 0b00;

/// The stored waker is being taken out to be woken.
const WAKING: usize = 0b01;

/// A new waker is being stored.
const REGISTERING: usize = 0b10;

/// A waker cell shared between one registering reader and any number of wakers.
///
/// A [`CompletionSlot`](crate::CompletionSlot) keeps one of these for the
/// consumer that is suspended on it. `register` and `wake` may race freely, a
/// wake that lands while a registration is in progress is handed to the
/// registering side, so no notification is lost.
pub struct AtomicWaker {
    state: AtomicUsize,
    waker: UnsafeCell<Option<Waker>>,
}

unsafe impl Send for AtomicWaker {}
unsafe impl Sync for AtomicWaker {}

impl AtomicWaker {
    /// Create an empty [`AtomicWaker`].
    pub const fn new() -> Self {
        Self {
            state: AtomicUsize::new(WAITING),
            waker: UnsafeCell::new(None),
        }
    }

    /// Wakes the last [`Waker`] passed to `register`, if any.
    #[inline]
    pub fn wake(&self) {
        if let Some(waker) = self.take() {
            waker.wake();
        }
    }

    /// Takes the last [`Waker`] passed to `register`.
    ///
    /// Returns `None` if nothing is registered or a registration is in flight,
    /// in which case the registering side wakes itself.
    pub fn take(&self) -> Option<Waker> {
        match self.state.fetch_or(WAKING, AcqRel) {
            WAITING => {
                let waker = unsafe { (*self.waker.get()).take() };
                self.state.fetch_and(!WAKING, Release);
                waker
            }
            state => {
                debug_assert!(
                    state == REGISTERING || state == REGISTERING | WAKING || state == WAKING
                );
                None
            }
        }
    }

    /// Stores `waker` to be notified by the next call to `wake`.
    pub fn register(&self, waker: &Waker) {
        match self
            .state
            .compare_exchange(WAITING, REGISTERING, Acquire, Acquire)
        {
            Ok(_) => {
                unsafe {
                    match &mut *self.waker.get() {
                        Some(old) if old.will_wake(waker) => (),
                        slot => *slot = Some(waker.clone()),
                    }
                }

                let res = self
                    .state
                    .compare_exchange(REGISTERING, WAITING, AcqRel, Acquire);
                if let Err(actual) = res {
                    // a wake arrived while we were registering
                    debug_assert_eq!(actual, REGISTERING | WAKING);
                    let waker = unsafe { (*self.waker.get()).take() };
                    self.state.swap(WAITING, AcqRel);
                    if let Some(waker) = waker {
                        waker.wake();
                    }
                }
            }
            Err(WAKING) => {
                waker.wake_by_ref();
            }
            Err(state) => {
                debug_assert!(state == REGISTERING || state == REGISTERING | WAKING);
            }
        }
    }
}

impl Default for AtomicWaker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AtomicWaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AtomicWaker")
    }
}

#[cfg(test)]
mod tests {
    use super::AtomicWaker;
    use crate::waker::parker_and_waker;
    use std::time::Duration;

    #[test]
    fn wake_without_register() {
        let cell = AtomicWaker::new();
        cell.wake();
        assert!(cell.take().is_none());
    }

    #[test]
    fn register_then_wake() {
        let (parker, waker) = parker_and_waker();
        let cell = AtomicWaker::new();
        cell.register(&waker);
        cell.wake();
        assert!(parker.park_timeout(Duration::from_secs(1)));
        assert!(cell.take().is_none());
    }
}
