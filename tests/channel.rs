#![cfg(feature = "channel")]

use std::thread;

use futures::StreamExt;

use easy_fanin::strategy::channel::fan_in;
use easy_fanin::{block_on, promise, Multiplexer, Promise, Resolver};

fn promises(n: usize) -> (Vec<Resolver<usize>>, Vec<Promise<usize>>) {
    (0..n).map(|_| promise()).unzip()
}

fn resolve_in(order: &[usize], resolvers: Vec<Resolver<usize>>) -> thread::JoinHandle<()> {
    let order = order.to_vec();
    let mut resolvers: Vec<Option<Resolver<usize>>> = resolvers.into_iter().map(Some).collect();
    thread::spawn(move || {
        for i in order {
            if let Some(resolver) = resolvers[i].take() {
                resolver.resolve(i);
            }
        }
    })
}

#[test]
fn empty_closes_immediately() {
    let receiver = fan_in(Vec::<Promise<usize>>::new());
    assert_eq!(block_on(receiver.recv()).ok(), None);
}

#[test]
fn same_order_as_multiplexer() {
    const N: usize = 200;

    let mut order: Vec<usize> = (0..N).collect();
    fastrand::shuffle(&mut order);

    let (resolvers, pending) = promises(N);
    let receiver = fan_in(pending);
    let producer = resolve_in(&order, resolvers);
    let via_channel: Vec<usize> = block_on(receiver.collect());
    producer.join().unwrap();

    let (resolvers, pending) = promises(N);
    let mux = Multiplexer::from_pending(pending);
    let producer = resolve_in(&order, resolvers);
    let via_mux: Vec<usize> = mux.blocking().collect();
    producer.join().unwrap();

    assert_eq!(via_channel, order);
    assert_eq!(via_mux, order);
}
