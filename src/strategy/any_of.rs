use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::stream::{FusedStream, Stream};
use tracing::trace;

use crate::future::MaybeDone;

/// Repeatedly asks the whole remaining set which source is done.
///
/// Every poll re-polls each unfinished source, so a step costs one
/// registration per remaining source and draining N sources costs O(N²)
/// registrations. Among several finished sources the one submitted first wins.
pub fn any_of_remaining<I>(futures: I) -> AnyOfRemaining<I::Item>
where
    I: IntoIterator,
    I::Item: Future,
{
    AnyOfRemaining {
        remaining: futures
            .into_iter()
            .map(|future| Box::pin(MaybeDone::from_future(future)))
            .collect(),
        registrations: 0,
    }
}

/// Stream returned by [`any_of_remaining`].
pub struct AnyOfRemaining<F: Future> {
    remaining: Vec<Pin<Box<MaybeDone<F>>>>,
    registrations: usize,
}

impl<F: Future> AnyOfRemaining<F> {
    /// Number of times an unfinished source was polled.
    pub fn registrations(&self) -> usize {
        self.registrations
    }

    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }
}

impl<F: Future> Stream for AnyOfRemaining<F> {
    type Item = F::Output;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<F::Output>> {
        let this = &mut *self;
        if this.remaining.is_empty() {
            return Poll::Ready(None);
        }

        let mut first_done = None;
        for (index, source) in this.remaining.iter_mut().enumerate() {
            if source.is_future() {
                this.registrations += 1;
                _ = source.as_mut().poll(cx);
            }
            if first_done.is_none() && source.is_done() {
                first_done = Some(index);
            }
        }

        let Some(index) = first_done else {
            return Poll::Pending;
        };
        // scan first, remove after, the set is never edited mid-iteration
        let mut source = this.remaining.remove(index);
        trace!(
            remaining = this.remaining.len(),
            registrations = this.registrations,
            "any-of step finished"
        );
        match source.as_mut().take_output() {
            Some(value) => Poll::Ready(Some(value)),
            None => unreachable!("finished source without output"),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining.len(), Some(self.remaining.len()))
    }
}

impl<F: Future> FusedStream for AnyOfRemaining<F> {
    fn is_terminated(&self) -> bool {
        self.remaining.is_empty()
    }
}

impl<F: Future> fmt::Debug for AnyOfRemaining<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyOfRemaining")
            .field("remaining", &self.remaining.len())
            .field("registrations", &self.registrations)
            .finish()
    }
}
