use async_channel::Receiver;
use tracing::{debug, warn};

use crate::pending::PendingResult;

/// Fans every source into one bounded channel with room for all of them.
///
/// Registers one callback per source; values arrive in the order the callbacks
/// run. The receiver closes once every source has delivered.
pub fn fan_in<I, P, T>(pending: I) -> Receiver<T>
where
    I: IntoIterator<Item = P>,
    P: PendingResult<T>,
    T: Send + 'static,
{
    let pending: Vec<P> = pending.into_iter().collect();
    // async-channel rejects a zero capacity
    let (sender, receiver) = async_channel::bounded(pending.len().max(1));
    debug!(len = pending.len(), "fanning sources into channel");

    for source in pending {
        let sender = sender.clone();
        source.when_ready(move |value| {
            if let Err(err) = sender.try_send(value) {
                warn!(closed = err.is_closed(), "dropping completed value");
            }
        });
    }
    receiver
}
