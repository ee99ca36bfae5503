//! Completion-order multiplexing of many pending results.
//!
//! A [`Multiplexer`] owns one [`CompletionSlot`] per source and a
//! [`RankAllocator`]. Every source gets exactly one completion callback up
//! front. When a source finishes, its callback claims the next free rank and
//! writes the value into the slot with that rank. The consumer drains the slots
//! in rank order, so values come out in the order the sources finished without
//! any sorting, and without looking at sources that are still running.
//!
//! Every source must eventually complete. A rank nobody fills keeps the
//! consumer suspended forever; use [`Multiplexer::next_timeout`] to bound the
//! wait.

mod deliver;
pub use deliver::Deliver;

use std::fmt;
use std::future::Future;
use std::iter::FusedIterator;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use std::time::Duration;

use futures_core::stream::{FusedStream, Stream};
use tracing::{debug, error, trace};

use crate::block_on::{block_on, block_on_timeout};
use crate::error::{Error, Result};
use crate::pending::PendingResult;
use crate::rank::RankAllocator;
use crate::slot::CompletionSlot;
use crate::stream::StreamNextExt;

struct Shared<T> {
    slots: Box<[CompletionSlot<T>]>,
    ranks: RankAllocator,
}

impl<T> Shared<T> {
    fn with_len(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| CompletionSlot::new()).collect(),
            ranks: RankAllocator::new(len),
        }
    }

    /// `rank := ranks.next(); slots[rank].fulfil(value)`
    fn deliver(&self, value: T) -> Result<usize> {
        let Some(rank) = self.ranks.next() else {
            let len = self.ranks.len();
            error!(len, "completion arrived after every rank was taken");
            return Err(Error::Oversubscribed { len });
        };
        self.fill(rank, value)?;
        Ok(rank)
    }

    fn fill(&self, rank: usize, value: T) -> Result<()> {
        match self.slots[rank].fulfil(value) {
            Ok(()) => {
                trace!(rank, "source completed");
                Ok(())
            }
            Err(_) => {
                error!(rank, "completion slot fulfilled twice");
                Err(Error::DoubleFulfilment { rank })
            }
        }
    }
}

/// Yields the results of N sources in the order they complete.
///
/// Implements [`Stream`]; use [`blocking`](Multiplexer::blocking) or
/// [`next_blocking`](Multiplexer::next_blocking) to drain it from synchronous
/// code. Single pass: once drained it stays empty.
pub struct Multiplexer<T> {
    shared: Arc<Shared<T>>,
    next: usize,
    registrations: usize,
}

impl<T> Multiplexer<T> {
    fn with_len(len: usize) -> Self {
        debug!(len, "creating completion-order multiplexer");
        Self {
            shared: Arc::new(Shared::with_len(len)),
            next: 0,
            registrations: 0,
        }
    }

    /// Creates a multiplexer for `len` sources along with one [`Completer`]
    /// per source.
    ///
    /// Hand each completer to a source; calling
    /// [`complete`](Completer::complete) is that source's completion callback.
    pub fn new(len: usize) -> (Self, Vec<Completer<T>>) {
        let mut mux = Self::with_len(len);
        let completers = (0..len)
            .map(|_| Completer {
                shared: mux.shared.clone(),
            })
            .collect();
        mux.registrations = len;
        (mux, completers)
    }

    /// Registers one completion callback on each pending result.
    ///
    /// All slots exist before the first registration, so a source that has
    /// already resolved may fire its callback during this call.
    ///
    /// Callbacks run on whatever thread resolves the source, so `T` must be
    /// `Send`. Slots also lend out `&T` through [`CompletionSlot::get`] and
    /// [`CompletionSlot::read`], so they are only `Sync` when `T: Sync` too.
    /// Values that are `Send` but not `Sync`, like ones holding a `Cell`, are
    /// rejected.
    pub fn from_pending<I, P>(pending: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: PendingResult<T>,
        T: Send + Sync + 'static,
    {
        let pending: Vec<P> = pending.into_iter().collect();
        let mut mux = Self::with_len(pending.len());

        for source in pending {
            let completer = Completer {
                shared: mux.shared.clone(),
            };
            source.when_ready(move |value| {
                let res = completer.complete(value);
                debug_assert!(res.is_ok(), "completion rejected: {res:?}");
            });
            mux.registrations += 1;
        }

        debug!(registrations = mux.registrations, "completion callbacks registered");
        mux
    }

    /// Wraps each future so that its output is delivered into the multiplexer.
    ///
    /// The multiplexer never spawns anything: the caller runs the returned
    /// [`Deliver`] futures on its own executor. Dropping one before it
    /// completes leaves a rank unfilled.
    pub fn from_futures<I>(futures: I) -> (Self, Vec<Deliver<I::Item>>)
    where
        I: IntoIterator,
        I::Item: Future<Output = T>,
    {
        let futures: Vec<I::Item> = futures.into_iter().collect();
        let (mux, completers) = Self::new(futures.len());
        let delivers = futures
            .into_iter()
            .zip(completers)
            .map(|(future, completer)| Deliver::new(future, completer))
            .collect();
        (mux, delivers)
    }

    /// Total number of sources.
    #[inline]
    pub fn len(&self) -> usize {
        self.shared.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of values not yet yielded.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.len() - self.next
    }

    /// Number of completion callbacks attached, one per source.
    #[inline]
    pub fn registrations(&self) -> usize {
        self.registrations
    }

    /// Number of ranks claimed by completed sources so far.
    #[inline]
    pub fn completions(&self) -> usize {
        self.shared.ranks.issued()
    }

    /// Blocks the current thread until the next value is available.
    pub fn next_blocking(&mut self) -> Option<T> {
        block_on(StreamNextExt::next(self))
    }

    /// Like [`next_blocking`](Multiplexer::next_blocking), but fails with
    /// [`Error::Timeout`] if no source fills the next rank within `timeout`.
    ///
    /// A timeout consumes nothing; the same rank can be waited on again.
    pub fn next_timeout(&mut self, timeout: Duration) -> Result<Option<T>> {
        let rank = self.next;
        block_on_timeout(StreamNextExt::next(self), timeout).ok_or_else(|| {
            debug!(rank, ?timeout, "timed out waiting for completion");
            Error::Timeout { rank, timeout }
        })
    }

    /// Turns the multiplexer into a blocking iterator.
    pub fn blocking(self) -> Blocking<T> {
        Blocking { mux: self }
    }
}

impl<T> Stream for Multiplexer<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = &mut *self;
        let Some(slot) = this.shared.slots.get(this.next) else {
            return Poll::Ready(None);
        };
        ready!(slot.poll_filled(cx));

        // the multiplexer is the only reader of its slots and never lends them out
        match unsafe { slot.take() } {
            Some(value) => {
                this.next += 1;
                Poll::Ready(Some(value))
            }
            None => unreachable!("rank {} drained twice", this.next),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl<T> FusedStream for Multiplexer<T> {
    fn is_terminated(&self) -> bool {
        self.next >= self.len()
    }
}

impl<T> fmt::Debug for Multiplexer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Multiplexer")
            .field("len", &self.len())
            .field("next", &self.next)
            .field("completions", &self.completions())
            .finish()
    }
}

/// One source's completion path into a [`Multiplexer`].
///
/// Consumed by [`complete`](Completer::complete), so a source can only
/// complete once.
pub struct Completer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Completer<T> {
    /// Delivers `value`, returning the completion rank it was assigned.
    pub fn complete(self, value: T) -> Result<usize> {
        self.shared.deliver(value)
    }
}

impl<T> fmt::Debug for Completer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("Completer { .. }")
    }
}

/// Blocking iterator over a [`Multiplexer`], see [`Multiplexer::blocking`].
#[derive(Debug)]
pub struct Blocking<T> {
    mux: Multiplexer<T>,
}

impl<T> Blocking<T> {
    pub fn into_inner(self) -> Multiplexer<T> {
        self.mux
    }
}

impl<T> Iterator for Blocking<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.mux.next_blocking()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.mux.size_hint()
    }
}

impl<T> ExactSizeIterator for Blocking<T> {}

impl<T> FusedIterator for Blocking<T> {}
