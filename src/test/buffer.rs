use crate::sim::EventBuffer;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

#[test]
fn drain_returns_everything_and_empties_the_buffer() {
    let buf = EventBuffer::new();
    assert!(buf.is_empty());
    buf.insert(1u32);
    buf.insert_all([2, 3]);
    assert!(!buf.is_empty());

    let mut got = buf.drain();
    got.sort_unstable();
    assert_eq!(got, vec![1, 2, 3]);
    assert!(buf.is_empty());
    assert!(buf.drain().is_empty());
}

#[test]
fn concurrent_producers_lose_nothing() {
    const THREADS: u32 = 8;
    const PER_THREAD: u32 = 2_000;

    let buf = Arc::new(EventBuffer::new());
    let producers: Vec<_> = (0..THREADS)
        .map(|t| {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    buf.insert(t * PER_THREAD + i);
                }
            })
        })
        .collect();

    // 生产者运行期间同时取空
    let mut seen = HashSet::new();
    let mut draining = true;
    while draining {
        draining = producers.iter().any(|h| !h.is_finished());
        for v in buf.drain() {
            assert!(seen.insert(v), "value {v} drained twice");
        }
    }
    for h in producers {
        h.join().expect("producer thread");
    }
    for v in buf.drain() {
        assert!(seen.insert(v), "value {v} drained twice");
    }

    assert_eq!(seen.len(), (THREADS * PER_THREAD) as usize);
}

struct CountDrop(Arc<AtomicUsize>);

impl Drop for CountDrop {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn dropping_the_buffer_drops_pending_items() {
    let drops = Arc::new(AtomicUsize::new(0));
    {
        let buf = EventBuffer::new();
        for _ in 0..5 {
            buf.insert(CountDrop(Arc::clone(&drops)));
        }
    }
    assert_eq!(drops.load(Ordering::SeqCst), 5);
}
