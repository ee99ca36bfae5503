//! Thread parking for blocking consumers.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::*;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::task::{Wake, Waker};
use std::time::{Duration, Instant};

/// Creates a parker and a [`Waker`] that unparks it.
#[inline]
pub fn parker_and_waker() -> (Parker, Waker) {
    let parker = Parker::new();
    let waker = Waker::from(parker.inner.clone());
    (parker, waker)
}

/// Waits for a notification.
///
/// Not `Sync`: only the thread that owns it parks on it.
pub struct Parker {
    inner: Arc<Inner>,
    _marker: PhantomData<Cell<()>>,
}

struct Inner {
    state: AtomicUsize,
    lock: Mutex<()>,
    cvar: Condvar,
}

const EMPTY: usize = 0;
const PARKED: usize = 1;
const NOTIFIED: usize = 2;

impl Parker {
    /// Creates a new parker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: AtomicUsize::new(EMPTY),
                lock: Mutex::new(()),
                cvar: Condvar::new(),
            }),
            _marker: PhantomData,
        }
    }

    /// Blocks until notified and then goes back into unnotified state.
    pub fn park(&self) {
        self.inner.park();
    }

    /// Like [`park`](Parker::park), but gives up after `timeout`.
    ///
    /// A timeout too large to be represented as an [`Instant`] waits without
    /// a deadline. Returns `true` if notified.
    pub fn park_timeout(&self, timeout: Duration) -> bool {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.inner.park_deadline(deadline),
            None => {
                self.inner.park();
                true
            }
        }
    }

    /// Like [`park`](Parker::park), but gives up at `deadline`.
    ///
    /// Returns `true` if notified.
    pub fn park_deadline(&self, deadline: Instant) -> bool {
        self.inner.park_deadline(deadline)
    }
}

impl Default for Parker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Parker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("Parker { .. }")
    }
}

impl Inner {
    fn park(&self) {
        if self
            .state
            .compare_exchange(NOTIFIED, EMPTY, AcqRel, Acquire)
            .is_ok()
        {
            return;
        }

        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        match self.state.compare_exchange(EMPTY, PARKED, AcqRel, Acquire) {
            Ok(_) => (),
            Err(NOTIFIED) => {
                self.state.swap(EMPTY, AcqRel);
                return;
            }
            Err(_) => panic!("inconsistent state in park"),
        }

        loop {
            guard = self
                .cvar
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);

            if self
                .state
                .compare_exchange(NOTIFIED, EMPTY, AcqRel, Acquire)
                .is_ok()
            {
                return;
            }
        }
    }

    fn park_deadline(&self, deadline: Instant) -> bool {
        if self
            .state
            .compare_exchange(NOTIFIED, EMPTY, AcqRel, Acquire)
            .is_ok()
        {
            return true;
        }

        if deadline <= Instant::now() {
            return false;
        }

        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        match self.state.compare_exchange(EMPTY, PARKED, AcqRel, Acquire) {
            Ok(_) => (),
            Err(NOTIFIED) => {
                self.state.store(EMPTY, Release);
                return true;
            }
            Err(_) => panic!("inconsistent state in park_deadline"),
        }

        // condvars wake spuriously, keep waiting until notified or past the deadline
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            guard = self
                .cvar
                .wait_timeout(guard, left)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
            if self.state.load(Acquire) == NOTIFIED {
                break;
            }
        }

        match self.state.swap(EMPTY, AcqRel) {
            NOTIFIED => true,
            PARKED => false,
            _ => panic!("inconsistent state in park_deadline"),
        }
    }

    fn unpark(&self) {
        match self.state.swap(NOTIFIED, AcqRel) {
            EMPTY | NOTIFIED => return,
            PARKED => (),
            _ => panic!("inconsistent state in unpark"),
        }

        drop(self.lock.lock().unwrap_or_else(PoisonError::into_inner));
        self.cvar.notify_one();
    }
}

impl Wake for Inner {
    #[inline]
    fn wake(self: Arc<Self>) {
        self.unpark();
    }

    #[inline]
    fn wake_by_ref(self: &Arc<Self>) {
        self.unpark();
    }
}

#[cfg(test)]
mod tests {
    use super::parker_and_waker;
    use std::time::Duration;

    #[test]
    fn notified_before_park() {
        let (parker, waker) = parker_and_waker();
        waker.wake_by_ref();
        assert!(parker.park_timeout(Duration::MAX));
        assert!(!parker.park_timeout(Duration::from_millis(10)));

        waker.wake();
        parker.park();
    }
}
