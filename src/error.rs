use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors reported by a [`Multiplexer`](crate::Multiplexer) and its completers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A completion was written into a rank that already holds a value.
    #[error("completion slot at rank {rank} was fulfilled twice")]
    DoubleFulfilment { rank: usize },

    /// More completions arrived than there are sources.
    #[error("all {len} ranks are already taken, a source completed more than once")]
    Oversubscribed { len: usize },

    /// No source completed for `rank` before the deadline.
    #[error("no source completed for rank {rank} within {timeout:?}")]
    Timeout { rank: usize, timeout: Duration },
}

/// Returned by [`CompletionSlot::fulfil`](crate::CompletionSlot::fulfil) when
/// the slot was already written.
///
/// The rejected value is handed back to the caller.
#[derive(Clone, PartialEq, Eq, Error)]
#[error("completion slot was already fulfilled")]
pub struct DoubleFulfilment<T>(pub T);

impl<T> DoubleFulfilment<T> {
    /// Returns the value that was rejected.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for DoubleFulfilment<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("DoubleFulfilment(..)")
    }
}
