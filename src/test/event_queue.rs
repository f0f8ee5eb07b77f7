use crate::sim::{Event, EventQueue, SimTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn noop(at: SimTime) -> Event {
    Event::once(at, |_| Vec::new())
}

fn drain_times(q: &mut EventQueue) -> Vec<SimTime> {
    let mut out = Vec::new();
    while !q.is_empty() {
        out.push(q.dequeue().time());
    }
    out
}

#[test]
fn dequeues_in_time_order() {
    let mut q = EventQueue::new(SimTime::from_millis(1), 128);
    for ms in [5, 1, 3, 2, 4] {
        q.enqueue(noop(SimTime::from_millis(ms)));
    }
    assert_eq!(q.len(), 5);
    assert_eq!(q.peek_time(), Some(SimTime::from_millis(1)));
    let got = drain_times(&mut q);
    let want: Vec<_> = (1..=5).map(SimTime::from_millis).collect();
    assert_eq!(got, want);
    assert_eq!(q.peek_time(), None);
}

#[test]
fn random_times_come_out_non_decreasing() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut q = EventQueue::new(SimTime::from_micros(100), 16);
    let mut want = Vec::new();
    for _ in 0..5_000 {
        let t = SimTime(rng.gen_range(0..50_000_000));
        want.push(t);
        q.enqueue(noop(t));
    }
    want.sort();
    assert_eq!(drain_times(&mut q), want);
}

#[test]
fn interleaved_enqueue_and_dequeue_stay_ordered() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut q = EventQueue::new(SimTime::from_micros(10), 8);
    let mut last = SimTime::ZERO;
    q.enqueue(noop(SimTime::ZERO));
    for _ in 0..2_000 {
        let ev = q.dequeue();
        assert!(ev.time() >= last, "{:?} came after {last:?}", ev.time());
        last = ev.time();
        // 新事件总是不早于当前时间，这与引擎中的用法一致
        for _ in 0..rng.gen_range(0..3) {
            q.enqueue(noop(last.saturating_add(SimTime(rng.gen_range(0..1_000_000)))));
        }
        if q.is_empty() {
            q.enqueue(noop(last));
        }
    }
}

#[test]
fn far_future_events_are_reachable_after_near_buckets_run_dry() {
    let mut q = EventQueue::new(SimTime::from_millis(1), 4);
    q.enqueue(noop(SimTime::ZERO));
    q.enqueue(noop(SimTime::from_secs(10)));
    q.enqueue(noop(SimTime::from_secs(20)));
    q.enqueue(noop(SimTime::from_secs(20)));

    assert_eq!(
        drain_times(&mut q),
        vec![
            SimTime::ZERO,
            SimTime::from_secs(10),
            SimTime::from_secs(20),
            SimTime::from_secs(20),
        ]
    );
}

#[test]
fn events_earlier_than_threshold_go_first() {
    let mut q = EventQueue::new(SimTime::from_millis(1), 4);
    q.enqueue(noop(SimTime::from_millis(50)));
    q.enqueue(noop(SimTime::from_millis(3)));
    q.enqueue(noop(SimTime::from_millis(60)));
    assert_eq!(q.peek().time(), SimTime::from_millis(3));
    assert_eq!(
        drain_times(&mut q),
        vec![
            SimTime::from_millis(3),
            SimTime::from_millis(50),
            SimTime::from_millis(60),
        ]
    );
}

#[test]
fn latest_time_scans_every_tier() {
    let mut q = EventQueue::new(SimTime::from_millis(1), 2);
    assert_eq!(q.latest_time(), None);
    q.enqueue(noop(SimTime::from_millis(1)));
    q.enqueue(noop(SimTime::from_secs(100)));
    q.enqueue(noop(SimTime::from_millis(2)));
    assert_eq!(q.latest_time(), Some(SimTime::from_secs(100)));
}

#[test]
#[should_panic(expected = "no more events")]
fn dequeue_on_empty_queue_panics() {
    let mut q = EventQueue::new(SimTime::from_millis(1), 4);
    let _ = q.dequeue();
}

#[test]
#[should_panic(expected = "no more events")]
fn peek_on_empty_queue_panics() {
    let q = EventQueue::new(SimTime::from_millis(1), 4);
    let _ = q.peek();
}
