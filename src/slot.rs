//! Write-once handoff cell between one producer and one consumer.

use std::cell::UnsafeCell;
use std::fmt;
use std::future::Future;
use std::mem::MaybeUninit;
use std::pin::Pin;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::*;
use std::task::{Context, Poll};

use crate::error::DoubleFulfilment;
use crate::waker::AtomicWaker;

const EMPTY: usize = 1 << 0;
const FULL: usize = 1 << 1;
const LOCK: usize = 1 << 2;
const TAKEN: usize = 1 << 3;

/// A cell that is written exactly once and read by a single consumer.
///
/// The slot starts empty. [`fulfil`](CompletionSlot::fulfil) moves it to the
/// filled state and wakes a reader suspended in [`read`](CompletionSlot::read).
/// Every write after the first is rejected with [`DoubleFulfilment`], the
/// stored value is never overwritten.
pub struct CompletionSlot<T> {
    state: AtomicUsize,
    value: UnsafeCell<MaybeUninit<T>>,
    reader: AtomicWaker,
}

unsafe impl<T: Send> Send for CompletionSlot<T> {}
unsafe impl<T: Send + Sync> Sync for CompletionSlot<T> {}

impl<T> CompletionSlot<T> {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        Self {
            state: AtomicUsize::new(EMPTY),
            value: UnsafeCell::new(MaybeUninit::uninit()),
            reader: AtomicWaker::new(),
        }
    }

    /// Stores `value` and wakes the reader.
    ///
    /// Fails, handing `value` back, if the slot was ever written before.
    pub fn fulfil(&self, value: T) -> Result<(), DoubleFulfilment<T>> {
        match self
            .state
            .compare_exchange(EMPTY, LOCK | FULL, Acquire, Acquire)
        {
            Ok(_) => {
                unsafe { (*self.value.get()).write(value) };
                self.state.store(FULL, Release);
                self.reader.wake();
                Ok(())
            }
            Err(_) => Err(DoubleFulfilment(value)),
        }
    }

    /// Waits until the slot is filled and returns a reference to the value.
    ///
    /// Reading is idempotent: every read of a filled slot yields the same value.
    pub fn read(&self) -> Read<'_, T> {
        Read { slot: self }
    }

    /// Returns the value if the slot is already filled.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        if self.is_filled() {
            Some(unsafe { (*self.value.get()).assume_init_ref() })
        } else {
            None
        }
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.state.load(Acquire) == FULL
    }

    /// Polls until the slot is filled, registering the reader's waker meanwhile.
    pub(crate) fn poll_filled(&self, cx: &mut Context<'_>) -> Poll<()> {
        if self.is_filled() {
            return Poll::Ready(());
        }
        self.reader.register(cx.waker());
        // the writer may have finished between the check and the registration
        if self.is_filled() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }

    /// Moves the value out, leaving the slot permanently drained.
    ///
    /// # Safety
    ///
    /// The caller must be the slot's only reader and must not hold a reference
    /// obtained from [`get`](CompletionSlot::get) or [`read`](CompletionSlot::read).
    pub(crate) unsafe fn take(&self) -> Option<T> {
        match self.state.compare_exchange(FULL, TAKEN, AcqRel, Acquire) {
            Ok(_) => Some((*self.value.get()).assume_init_read()),
            Err(_) => None,
        }
    }
}

impl<T> Default for CompletionSlot<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for CompletionSlot<T> {
    fn drop(&mut self) {
        if *self.state.get_mut() == FULL {
            unsafe { self.value.get_mut().assume_init_drop() }
        }
    }
}

impl<T> fmt::Debug for CompletionSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSlot")
            .field(
                "state",
                &match self.state.load(Acquire) {
                    EMPTY => "EMPTY",
                    FULL => "FULL",
                    TAKEN => "TAKEN",
                    state if state == LOCK | FULL => "LOCK|FULL",
                    _ => unreachable!("invalid state"),
                },
            )
            .finish()
    }
}

/// Future returned by [`CompletionSlot::read`].
#[must_use = "futures do nothing unless polled"]
pub struct Read<'a, T> {
    slot: &'a CompletionSlot<T>,
}

impl<'a, T> Future for Read<'a, T> {
    type Output = &'a T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let slot = self.slot;
        match slot.poll_filled(cx) {
            Poll::Ready(()) => Poll::Ready(unsafe { (*slot.value.get()).assume_init_ref() }),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> fmt::Debug for Read<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Read").field("slot", self.slot).finish()
    }
}
