use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use super::Completer;

/// Runs a source future and delivers its output into a
/// [`Multiplexer`](super::Multiplexer).
///
/// Created by [`Multiplexer::from_futures`](super::Multiplexer::from_futures).
#[must_use = "futures do nothing unless polled"]
pub struct Deliver<F: Future> {
    future: F,
    completer: Option<Completer<F::Output>>,
}

impl<F: Future> Deliver<F> {
    pub(super) fn new(future: F, completer: Completer<F::Output>) -> Self {
        Self {
            future,
            completer: Some(completer),
        }
    }
}

impl<F: Future> Future for Deliver<F> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        // `future` is structurally pinned, `completer` is not
        let this = unsafe { self.get_unchecked_mut() };
        if this.completer.is_none() {
            return Poll::Ready(());
        }

        let value = ready!(unsafe { Pin::new_unchecked(&mut this.future) }.poll(cx));
        if let Some(completer) = this.completer.take() {
            let res = completer.complete(value);
            debug_assert!(res.is_ok(), "completion rejected: {res:?}");
        }
        Poll::Ready(())
    }
}

impl<F: Future> fmt::Debug for Deliver<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deliver")
            .field("delivered", &self.completer.is_none())
            .finish()
    }
}
