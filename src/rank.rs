use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::*;

/// Hands out completion ranks `0..len` in first-come order.
///
/// Producers never wait on each other beyond a single `fetch_add`.
#[derive(Debug)]
pub struct RankAllocator {
    next: AtomicUsize,
    len: usize,
}

impl RankAllocator {
    pub const fn new(len: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            len,
        }
    }

    /// Claims the next rank.
    ///
    /// Returns `None` once all `len` ranks have been claimed.
    #[inline]
    pub fn next(&self) -> Option<usize> {
        // the slot publishes the value, the counter only has to be unique
        let rank = self.next.fetch_add(1, Relaxed);
        (rank < self.len).then_some(rank)
    }

    /// Number of ranks claimed so far.
    #[inline]
    pub fn issued(&self) -> usize {
        self.next.load(Relaxed).min(self.len)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether every rank has been claimed.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.next.load(Relaxed) >= self.len
    }
}
