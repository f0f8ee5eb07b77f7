use crate::net::Topology;
use crate::sim::{Engine, EngineConfig, Event, SimTime, StepClock};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

fn engine() -> Engine {
    Engine::new(Topology::new(), &EngineConfig::default())
}

fn recorder(log: &Arc<Mutex<Vec<(u32, SimTime)>>>, id: u32, at: SimTime) -> Event {
    let log = Arc::clone(log);
    Event::once(at, move |now| {
        log.lock().expect("log lock").push((id, now));
        Vec::new()
    })
}

fn ms(v: u64) -> SimTime {
    SimTime::from_millis(v)
}

#[test]
fn step_fires_only_due_events_in_time_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut e = engine();
    e.schedule(recorder(&log, 3, ms(30)));
    e.schedule(recorder(&log, 1, ms(10)));
    e.schedule(recorder(&log, 2, ms(20)));

    assert_eq!(e.step(ms(20)), 2);
    assert_eq!(*log.lock().expect("log lock"), vec![(1, ms(10)), (2, ms(20))]);
    assert_eq!(e.pending(), 1);

    assert_eq!(e.step(ms(29)), 0);
    assert_eq!(e.step(ms(30)), 1);
    assert_eq!(e.fired(), 3);
    assert_eq!(e.pending(), 0);
}

#[test]
fn derived_events_fire_in_the_same_step_when_due() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut e = engine();
    let inner = Arc::clone(&log);
    e.schedule(Event::once(ms(1), move |now| {
        inner.lock().expect("log lock").push((0, now));
        vec![
            recorder(&inner, 1, now.saturating_add(ms(1))),
            recorder(&inner, 2, now.saturating_add(ms(100))),
        ]
    }));

    assert_eq!(e.step(ms(5)), 2);
    assert_eq!(*log.lock().expect("log lock"), vec![(0, ms(1)), (1, ms(2))]);
    assert_eq!(e.pending(), 1);
}

#[test]
fn delayed_event_is_relative_to_now() {
    let ev = Event::delayed(|_| Vec::new(), ms(150), ms(1_000));
    assert_eq!(ev.time(), ms(1_150));
}

#[test]
fn producer_events_are_fetched_on_the_next_step() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut e = engine();
    let producer = e.producer();
    producer.insert(recorder(&log, 1, ms(1)));
    producer.insert_all([recorder(&log, 2, ms(2)), recorder(&log, 3, ms(50))]);

    assert_eq!(e.step(ms(10)), 2);
    assert_eq!(e.pending(), 1);
}

#[test]
fn repeating_event_reschedules_until_negative_delay() {
    let times = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&times);
    let mut e = engine();
    e.schedule(Event::repeating(ms(0), move |now| {
        let mut t = seen.lock().expect("times lock");
        t.push(now);
        let next = if t.len() < 3 { 5_000_000 } else { -1 };
        (Vec::new(), next)
    }));

    e.step(ms(1_000));
    assert_eq!(*times.lock().expect("times lock"), vec![ms(0), ms(5), ms(10)]);
    assert_eq!(e.pending(), 0);
}

#[test]
fn zero_delay_repeat_advances_by_one_nanosecond() {
    let times = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&times);
    let mut e = engine();
    e.schedule(Event::repeating(SimTime::ZERO, move |now| {
        seen.lock().expect("times lock").push(now);
        (Vec::new(), 0)
    }));

    assert_eq!(e.step(SimTime(5)), 6);
    assert_eq!(
        *times.lock().expect("times lock"),
        (0..=5).map(SimTime).collect::<Vec<_>>()
    );
    assert_eq!(e.pending(), 1);
}

#[test]
fn zero_delay_repeat_does_not_block_shutdown() {
    let mut e = engine();
    e.schedule(Event::repeating(SimTime::ZERO, |_| (Vec::new(), 0)));

    // 时钟不前进，只能靠停止请求退出
    let mut clock = StepClock::new(SimTime::ZERO, SimTime::ZERO);
    let running = AtomicBool::new(false);
    let report = e.run(&mut clock, None, &running);

    assert_eq!(report.fired, 1);
    assert_eq!(report.discarded, 1);
    assert_eq!(e.pending(), 0);
}

#[test]
#[should_panic(expected = "period must be positive")]
fn periodic_rejects_zero_period() {
    let _ = Event::periodic(ms(0), SimTime::ZERO, |_| Vec::new());
}

#[test]
fn cancelled_periodic_event_stops_after_next_firing() {
    let count = Arc::new(Mutex::new(0u32));
    let inner = Arc::clone(&count);
    let (ev, cancel) = Event::periodic(ms(0), ms(10), move |_| {
        *inner.lock().expect("count lock") += 1;
        Vec::new()
    });
    let mut e = engine();
    e.schedule(ev);

    e.step(ms(25));
    assert_eq!(*count.lock().expect("count lock"), 3);
    assert!(!cancel.is_cancelled());

    cancel.cancel();
    assert!(cancel.is_cancelled());
    // 已登记的下一次触发仍会出队，但不再执行动作
    assert_eq!(e.step(ms(1_000)), 1);
    assert_eq!(*count.lock().expect("count lock"), 3);
    assert_eq!(e.pending(), 0);
}

#[test]
fn bounded_run_exits_once_nothing_is_pending() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut e = engine();
    e.schedule(recorder(&log, 1, ms(5)));
    e.schedule(recorder(&log, 2, ms(10)));

    let mut clock = StepClock::new(SimTime::ZERO, ms(1));
    let running = AtomicBool::new(true);
    let report = e.run(&mut clock, Some(ms(1_000)), &running);

    assert_eq!(report.fired, 2);
    assert_eq!(report.discarded, 0);
    assert_eq!(report.started_at, SimTime::ZERO);
    assert_eq!(report.finished_at, ms(10));
    assert_eq!(*log.lock().expect("log lock"), vec![(1, ms(5)), (2, ms(10))]);
}

#[test]
fn events_beyond_the_deadline_still_fire_during_shutdown() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut e = engine();
    e.schedule(recorder(&log, 1, ms(5_000)));

    let mut clock = StepClock::new(SimTime::ZERO, ms(1));
    let running = AtomicBool::new(true);
    let report = e.run(&mut clock, Some(ms(100)), &running);

    assert_eq!(report.finished_at, ms(101));
    assert_eq!(report.fired, 1);
    assert_eq!(*log.lock().expect("log lock"), vec![(1, ms(5_000))]);
}

#[test]
fn shutdown_discards_periodic_descendants_past_the_horizon() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut e = engine();
    e.schedule(recorder(&log, 1, ms(1_000)));
    let (ev, _cancel) = Event::periodic(ms(0), ms(100), |_| Vec::new());
    e.schedule(ev);

    let mut clock = StepClock::new(SimTime::ZERO, ms(1));
    // 一进入循环就停止
    let running = AtomicBool::new(false);
    let report = e.run(&mut clock, None, &running);

    // 周期事件在 0, 100, ..., 1000ms 共触发 11 次，再加上 1000ms 的一次性事件
    assert_eq!(report.fired, 12);
    assert_eq!(report.discarded, 1);
    assert_eq!(report.finished_at, ms(1));
    assert_eq!(*log.lock().expect("log lock"), vec![(1, ms(1_000))]);
    assert_eq!(e.pending(), 0);
}

#[test]
fn run_report_serializes_to_json() {
    let mut e = engine();
    let mut clock = StepClock::new(SimTime::ZERO, ms(1));
    let running = AtomicBool::new(true);
    let report = e.run(&mut clock, Some(ms(10)), &running);
    let v: serde_json::Value = serde_json::to_value(report).expect("serialize report");
    assert_eq!(v["fired"], 0);
    assert_eq!(v["discarded"], 0);
    assert_eq!(v["started_at"], 0);
}
