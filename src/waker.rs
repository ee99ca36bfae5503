mod atomic_waker;
pub use atomic_waker::AtomicWaker;

mod parker;
pub use parker::{parker_and_waker, Parker};
