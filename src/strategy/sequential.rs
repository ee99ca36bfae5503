use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::stream::{FusedStream, Stream};
use tracing::trace;

/// Awaits the sources one after another, in submission order.
///
/// A slow source at the front holds back every later one, even those that have
/// long finished.
pub fn sequential<I>(futures: I) -> Sequential<I::Item>
where
    I: IntoIterator,
    I::Item: Future,
{
    Sequential {
        queue: futures.into_iter().map(Box::pin).collect(),
        registrations: 0,
    }
}

/// Stream returned by [`sequential`].
pub struct Sequential<F> {
    queue: VecDeque<Pin<Box<F>>>,
    registrations: usize,
}

impl<F> Sequential<F> {
    /// Number of times a pending source was polled and kept our waker.
    pub fn registrations(&self) -> usize {
        self.registrations
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl<F: Future> Stream for Sequential<F> {
    type Item = F::Output;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<F::Output>> {
        let this = &mut *self;
        let Some(front) = this.queue.front_mut() else {
            return Poll::Ready(None);
        };
        match front.as_mut().poll(cx) {
            Poll::Ready(value) => {
                this.queue.pop_front();
                trace!(remaining = this.queue.len(), "sequential source finished");
                Poll::Ready(Some(value))
            }
            Poll::Pending => {
                this.registrations += 1;
                Poll::Pending
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.queue.len(), Some(self.queue.len()))
    }
}

impl<F: Future> FusedStream for Sequential<F> {
    fn is_terminated(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<F> fmt::Debug for Sequential<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequential")
            .field("remaining", &self.queue.len())
            .field("registrations", &self.registrations)
            .finish()
    }
}
