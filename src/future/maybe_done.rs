use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// A future that holds on to its output once it finishes.
///
/// Polling a `Done` or `Taken` value does nothing, so a finished source can sit
/// in a collection that is polled as a whole.
pub enum MaybeDone<F: Future> {
    Future(F),
    Done(F::Output),
    Taken,
}

impl<F: Future> MaybeDone<F> {
    pub fn from_future(future: F) -> Self {
        Self::Future(future)
    }

    /// Takes the output out of a `Done` value.
    pub fn take_output(self: Pin<&mut Self>) -> Option<F::Output> {
        // SAFETY: only the output is moved, the future itself is already gone
        let this = unsafe { self.get_unchecked_mut() };
        match *this {
            Self::Done(_) => match std::mem::replace(this, Self::Taken) {
                Self::Done(output) => Some(output),
                _ => unreachable!(),
            },
            _ => None,
        }
    }

    #[inline]
    pub fn is_future(&self) -> bool {
        matches!(*self, Self::Future(_))
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(*self, Self::Done(_))
    }

    #[inline]
    pub fn is_taken(&self) -> bool {
        matches!(*self, Self::Taken)
    }
}

impl<F: Future> Future for MaybeDone<F> {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        unsafe {
            match *self.as_mut().get_unchecked_mut() {
                Self::Future(ref mut future) => {
                    let output = ready!(Pin::new_unchecked(future).poll(cx));
                    self.set(Self::Done(output));
                }
                Self::Done(_) | Self::Taken => (),
            }
        }
        Poll::Ready(())
    }
}
