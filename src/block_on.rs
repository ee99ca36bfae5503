use crate::waker::parker_and_waker;
use std::{
    future::Future,
    pin,
    task::{Context, Poll},
    time::{Duration, Instant},
};

/// Drives `fut` to completion on the current thread, parking between polls.
pub fn block_on<F: Future>(fut: F) -> F::Output {
    let (parker, waker) = parker_and_waker();
    let mut cx = Context::from_waker(&waker);
    let mut fut = pin::pin!(fut);
    loop {
        match fut.as_mut().poll(&mut cx) {
            Poll::Pending => parker.park(),
            Poll::Ready(res) => return res,
        }
    }
}

/// Like [`block_on`], but gives up once `timeout` has elapsed.
///
/// Returns `None` on timeout. The future is dropped without being polled to
/// completion. A timeout too large to be represented as an [`Instant`], such
/// as [`Duration::MAX`], waits without a deadline.
pub fn block_on_timeout<F: Future>(fut: F, timeout: Duration) -> Option<F::Output> {
    let Some(deadline) = Instant::now().checked_add(timeout) else {
        return Some(block_on(fut));
    };
    let (parker, waker) = parker_and_waker();
    let mut cx = Context::from_waker(&waker);
    let mut fut = pin::pin!(fut);
    loop {
        if let Poll::Ready(res) = fut.as_mut().poll(&mut cx) {
            return Some(res);
        }
        if !parker.park_deadline(deadline) {
            // one last look, the wake may have raced the deadline
            return match fut.as_mut().poll(&mut cx) {
                Poll::Ready(res) => Some(res),
                Poll::Pending => None,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{block_on, block_on_timeout};
    use std::future::pending;
    use std::time::{Duration, Instant};

    #[test]
    fn ready_immediately() {
        assert_eq!(block_on(async { 1 }), 1);
    }

    #[test]
    fn timeout_on_pending() {
        let dur = Duration::from_millis(50);
        let start = Instant::now();
        assert_eq!(block_on_timeout(pending::<()>(), dur), None);
        assert!(start.elapsed() >= dur);
    }

    #[test]
    fn unbounded_timeout() {
        assert_eq!(block_on_timeout(async { 7 }, Duration::MAX), Some(7));
    }
}
