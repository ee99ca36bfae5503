//! Pending results and a one-shot promise that implements them.

use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

/// A value that becomes available exactly once, at some unknown time.
///
/// The only way to observe it is to register a completion callback. The
/// callback runs on whichever thread resolves the value, or right away on the
/// registering thread if the value is already there.
pub trait PendingResult<T> {
    /// Registers `callback` to receive the value. Must not block.
    fn when_ready<C>(self, callback: C)
    where
        C: FnOnce(T) + Send + 'static;
}

type Callback<T> = Box<dyn FnOnce(T) + Send>;

enum State<T> {
    Waiting,
    Polled(Waker),
    Registered(Callback<T>),
    Resolved(T),
    Done,
}

struct Shared<T> {
    state: Mutex<State<T>>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Creates a connected resolver and promise.
pub fn promise<T>() -> (Resolver<T>, Promise<T>) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State::Waiting),
    });
    (
        Resolver {
            shared: shared.clone(),
        },
        Promise { shared },
    )
}

/// The producing half of a [`promise`].
///
/// Dropping it without calling [`resolve`](Resolver::resolve) leaves the
/// promise pending forever.
pub struct Resolver<T> {
    shared: Arc<Shared<T>>,
}

/// The consuming half of a [`promise`].
///
/// Either register a callback through [`PendingResult::when_ready`] or await it.
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Resolver<T> {
    /// Resolves the promise with `value`.
    ///
    /// A registered callback is invoked on the current thread, outside the lock.
    pub fn resolve(self, value: T) {
        let mut state = self.shared.lock();
        match mem::replace(&mut *state, State::Done) {
            State::Waiting => *state = State::Resolved(value),
            State::Polled(waker) => {
                *state = State::Resolved(value);
                drop(state);
                waker.wake();
            }
            State::Registered(callback) => {
                drop(state);
                callback(value);
            }
            State::Resolved(_) | State::Done => unreachable!("promise resolved twice"),
        }
    }
}

impl<T> PendingResult<T> for Promise<T> {
    fn when_ready<C>(self, callback: C)
    where
        C: FnOnce(T) + Send + 'static,
    {
        let mut state = self.shared.lock();
        match mem::replace(&mut *state, State::Done) {
            State::Resolved(value) => {
                drop(state);
                callback(value);
            }
            State::Waiting | State::Polled(_) => *state = State::Registered(Box::new(callback)),
            State::Registered(_) | State::Done => unreachable!("promise consumed twice"),
        }
    }
}

impl<T> Future for Promise<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut state = self.shared.lock();
        match mem::replace(&mut *state, State::Done) {
            State::Resolved(value) => Poll::Ready(value),
            State::Waiting | State::Polled(_) => {
                *state = State::Polled(cx.waker().clone());
                Poll::Pending
            }
            State::Registered(_) | State::Done => panic!("`Promise` polled after completion"),
        }
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("Resolver { .. }")
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("Promise { .. }")
    }
}
