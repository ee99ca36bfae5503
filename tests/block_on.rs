use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::thread;
use std::time::{Duration, Instant};

use easy_fanin::{block_on, block_on_timeout, promise};

/// Returns `Pending` `num` times, waking itself each time.
struct PendingN {
    cur: usize,
    num: usize,
}

impl Future for PendingN {
    type Output = usize;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.cur == self.num {
            Poll::Ready(self.cur)
        } else {
            if self.cur & 1 == 0 {
                cx.waker().clone().wake();
            } else {
                cx.waker().wake_by_ref();
            }
            self.cur += 1;
            Poll::Pending
        }
    }
}

#[test]
fn self_waking() {
    assert_eq!(block_on(PendingN { cur: 0, num: 100 }), 100);
}

async fn async_fib(n: usize) -> usize {
    if n < 2 {
        return 1;
    }

    Box::pin(async_fib(n - 1)).await + Box::pin(async_fib(n - 2)).await
}

fn fib(n: usize) -> usize {
    let (mut a, mut b) = (1, 0);
    for _ in 0..n {
        (a, b) = (a + b, a);
    }
    a
}

#[test]
fn block_on_fib() {
    assert_eq!(block_on(async_fib(20)), fib(20));
}

#[test]
fn woken_from_other_thread() {
    let dur = Duration::from_millis(100);
    let start = Instant::now();

    let (resolver, pending) = promise();
    let producer = thread::spawn(move || {
        thread::sleep(dur);
        resolver.resolve(());
    });

    block_on(pending);
    assert!(start.elapsed() >= dur);
    producer.join().unwrap();
}

#[test]
fn timeout_then_success() {
    let (resolver, mut pending) = promise::<i32>();

    assert_eq!(
        block_on_timeout(&mut pending, Duration::from_millis(20)),
        None
    );

    resolver.resolve(9);
    assert_eq!(
        block_on_timeout(&mut pending, Duration::from_millis(20)),
        Some(9)
    );
}
