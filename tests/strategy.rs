use std::sync::mpsc;
use std::thread;

use easy_parallel::Parallel;
use futures::{Stream, StreamExt};

use easy_fanin::strategy::{any_of_remaining, sequential};
use easy_fanin::{block_on, promise, Multiplexer, Promise, Resolver};

fn promises(n: usize) -> (Vec<Resolver<usize>>, Vec<Promise<usize>>) {
    (0..n).map(|_| promise()).unzip()
}

/// Resolves sources last-to-first, waiting for the consumer to take each value
/// before resolving the next one, so completion order is unambiguous.
fn drain_in_lockstep<S>(mut stream: S, resolvers: Vec<Resolver<usize>>) -> (S, Vec<usize>)
where
    S: Stream<Item = usize> + Unpin,
{
    let (ack_tx, ack_rx) = mpsc::channel::<()>();

    let (_, out) = Parallel::new()
        .add(move || {
            for (i, resolver) in resolvers.into_iter().enumerate().rev() {
                resolver.resolve(i);
                ack_rx.recv().unwrap();
            }
        })
        .finish(|| {
            let mut out = Vec::new();
            block_on(async {
                while let Some(value) = stream.next().await {
                    out.push(value);
                    ack_tx.send(()).unwrap();
                }
            });
            out
        });

    (stream, out)
}

#[test]
fn sequential_keeps_submission_order() {
    const N: usize = 32;

    let (resolvers, pending) = promises(N);
    let producer = thread::spawn(move || {
        for (i, resolver) in resolvers.into_iter().enumerate().rev() {
            resolver.resolve(i);
        }
    });

    let mut drain = sequential(pending);
    let out: Vec<usize> = block_on(drain.by_ref().collect());
    producer.join().unwrap();

    assert_eq!(out, (0..N).collect::<Vec<_>>());
    assert_eq!(drain.remaining(), 0);
}

#[test]
fn sequential_empty() {
    let mut drain = sequential(Vec::<Promise<usize>>::new());
    assert_eq!(block_on(drain.next()), None);
    assert_eq!(drain.registrations(), 0);
}

#[test]
fn any_of_follows_completion_order() {
    const N: usize = 32;

    let (resolvers, pending) = promises(N);
    let (drain, out) = drain_in_lockstep(any_of_remaining(pending), resolvers);

    assert_eq!(out, (0..N).rev().collect::<Vec<_>>());
    assert_eq!(drain.remaining(), 0);
}

#[test]
fn any_of_prefers_earlier_submission_among_finished() {
    let (resolvers, pending) = promises(3);
    for (i, resolver) in resolvers.into_iter().enumerate().rev() {
        resolver.resolve(i);
    }

    let out: Vec<usize> = block_on(any_of_remaining(pending).collect());
    assert_eq!(out, vec![0, 1, 2]);
}

#[test]
fn multiplexer_matches_any_of_with_far_fewer_registrations() {
    const N: usize = 1_000;

    let (resolvers, pending) = promises(N);
    let (mux, mux_out) = drain_in_lockstep(Multiplexer::from_pending(pending), resolvers);

    let (resolvers, pending) = promises(N);
    let (any_of, any_of_out) = drain_in_lockstep(any_of_remaining(pending), resolvers);

    assert_eq!(mux_out, (0..N).rev().collect::<Vec<_>>());
    assert_eq!(mux_out, any_of_out);

    assert_eq!(mux.registrations(), N);
    assert_eq!(mux.completions(), N);
    assert!(
        any_of.registrations() >= N * (N - 1) / 2,
        "expected quadratic registrations, got {}",
        any_of.registrations()
    );
}
