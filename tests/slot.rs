use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use easy_parallel::Parallel;

use easy_fanin::{block_on, CompletionSlot};

#[test]
fn smoke() {
    let slot = CompletionSlot::new();
    assert!(!slot.is_filled());
    assert_eq!(slot.get(), None);

    slot.fulfil(7).unwrap();

    assert!(slot.is_filled());
    assert_eq!(slot.get(), Some(&7));
    assert_eq!(block_on(slot.read()), &7);
}

#[test]
fn read_is_idempotent() {
    let slot = CompletionSlot::new();
    slot.fulfil(String::from("value")).unwrap();

    let first = block_on(slot.read());
    let second = block_on(slot.read());
    assert_eq!(first, "value");
    assert!(std::ptr::eq(first, second));
}

#[test]
fn double_fulfil() {
    let slot = CompletionSlot::new();
    slot.fulfil(1).unwrap();

    let err = slot.fulfil(2).unwrap_err();
    assert_eq!(err.into_inner(), 2);
    assert_eq!(slot.get(), Some(&1));
}

#[test]
fn read_waits_for_writer() {
    let slot = CompletionSlot::new();

    let (_, read) = Parallel::new()
        .add(|| {
            thread::sleep(Duration::from_millis(50));
            slot.fulfil(42).unwrap();
        })
        .finish(|| *block_on(slot.read()));

    assert_eq!(read, 42);
}

#[test]
fn racing_writers() {
    const THREADS: usize = 8;
    const RUNS: usize = if cfg!(miri) { 10 } else { 500 };

    for _ in 0..RUNS {
        let slot = CompletionSlot::new();
        let wins = Parallel::new()
            .each(0..THREADS, |i| slot.fulfil(i).is_ok())
            .run();

        assert_eq!(wins.iter().filter(|won| **won).count(), 1);
        let winner = wins.iter().position(|won| *won).unwrap();
        assert_eq!(slot.get(), Some(&winner));
    }
}

#[test]
fn drops() {
    static DROPS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug)]
    struct DropCounter;

    impl Drop for DropCounter {
        fn drop(&mut self) {
            DROPS.fetch_add(1, Ordering::SeqCst);
        }
    }

    let empty = CompletionSlot::<DropCounter>::new();
    drop(empty);
    assert_eq!(DROPS.load(Ordering::SeqCst), 0);

    let slot = CompletionSlot::new();
    slot.fulfil(DropCounter).unwrap();
    assert_eq!(DROPS.load(Ordering::SeqCst), 0);

    // the rejected value goes back to the caller and is dropped there
    drop(slot.fulfil(DropCounter));
    assert_eq!(DROPS.load(Ordering::SeqCst), 1);

    drop(slot);
    assert_eq!(DROPS.load(Ordering::SeqCst), 2);
}
