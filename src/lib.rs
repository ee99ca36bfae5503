//! Consume many pending results in the order they actually complete.
//!
//! [`Multiplexer`] is the core: one completion callback per source, an atomic
//! rank counter and a write-once [`CompletionSlot`] per rank. The
//! [`strategy`] module holds the slower ways of doing the same thing.

mod block_on;
pub use block_on::{block_on, block_on_timeout};

pub mod error;
pub use error::{DoubleFulfilment, Error, Result};

pub mod future;

mod multiplexer;
pub use multiplexer::{Blocking, Completer, Deliver, Multiplexer};

pub mod pending;
pub use pending::{promise, PendingResult, Promise, Resolver};

pub mod rank;
pub use rank::RankAllocator;

pub mod slot;
pub use slot::{CompletionSlot, Read};

pub mod strategy;

mod stream;

pub mod waker;
