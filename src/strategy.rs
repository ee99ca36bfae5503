//! Other ways of draining the same sources, kept for comparison with
//! [`Multiplexer`](crate::Multiplexer).

mod any_of;
pub use any_of::{any_of_remaining, AnyOfRemaining};

mod sequential;
pub use sequential::{sequential, Sequential};

#[cfg(feature = "channel")]
pub mod channel;
