//! 分桶事件队列
//!
//! 针对“绝大多数待处理事件都集中在当前时刻之后不远处”的负载：
//! 把近未来按固定宽度划分为若干个有序的桶，每个桶内部是一个小顶堆；
//! 落在最后一个桶之外的事件进入溢出集合，待时间推进后再迁回对应的桶。
//!
//! 不变量：
//! - `current` 中的事件时间都 `<= threshold`；
//! - `buckets[i]` 中的事件时间落在 `threshold + [i*w, (i+1)*w)`；
//! - `overflow` 中的事件时间 `>= threshold + max_buckets*w`；
//! - 队列非空时 `current` 一定非空。

use std::collections::{BinaryHeap, VecDeque};

use super::event::Event;
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use tracing::trace;

/// 按时间有序弹出的事件存储。
pub struct EventQueue {
    len: usize,
    width: u64,
    max_buckets: usize,
    threshold: SimTime,
    current: BinaryHeap<ScheduledEvent>,
    buckets: VecDeque<BinaryHeap<ScheduledEvent>>,
    overflow: BinaryHeap<ScheduledEvent>,
}

impl EventQueue {
    /// `bucket_width` 与 `max_buckets` 必须为正（由 `EngineConfig::validate` 保证）。
    pub fn new(bucket_width: SimTime, max_buckets: usize) -> Self {
        assert!(bucket_width.0 > 0, "bucket width must be positive");
        assert!(max_buckets > 0, "bucket count must be positive");
        Self {
            len: 0,
            width: bucket_width.0,
            max_buckets,
            threshold: SimTime::ZERO,
            current: BinaryHeap::new(),
            buckets: VecDeque::new(),
            overflow: BinaryHeap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 入队
    pub fn enqueue(&mut self, ev: Event) {
        if self.len == 0 {
            self.buckets.clear();
            self.threshold = ev.at.saturating_add(SimTime(self.width));
        }
        self.place(ScheduledEvent(ev));
        self.len += 1;
    }

    /// 弹出最早的事件。队列为空时 panic。
    pub fn dequeue(&mut self) -> Event {
        let item = self.current.pop().expect("no more events");
        self.len -= 1;
        self.settle();
        item.0
    }

    /// 查看最早的事件。队列为空时 panic。
    pub fn peek(&self) -> &Event {
        &self.current.peek().expect("no more events").0
    }

    pub fn peek_time(&self) -> Option<SimTime> {
        self.current.peek().map(ScheduledEvent::at)
    }

    /// 队列中最晚的事件时间（线性扫描，仅用于停机收尾）。
    pub fn latest_time(&self) -> Option<SimTime> {
        self.current
            .iter()
            .chain(self.buckets.iter().flatten())
            .chain(self.overflow.iter())
            .map(ScheduledEvent::at)
            .max()
    }

    fn place(&mut self, item: ScheduledEvent) {
        let t = item.at();
        if t <= self.threshold {
            self.current.push(item);
            return;
        }
        let index = usize::try_from((t.0 - self.threshold.0) / self.width).unwrap_or(usize::MAX);
        if index >= self.max_buckets {
            self.overflow.push(item);
            return;
        }
        while self.buckets.len() <= index {
            self.buckets.push_back(BinaryHeap::new());
        }
        self.buckets[index].push(item);
    }

    /// 当前桶取空后轮转到下一个桶，并把进入视野的溢出事件迁回。
    fn settle(&mut self) {
        while self.current.is_empty() {
            let Some(next) = self.buckets.pop_front() else {
                break;
            };
            self.current = next;
            self.threshold = self.threshold.saturating_add(SimTime(self.width));
        }

        if self.current.is_empty() {
            let Some(earliest) = self.overflow.peek().map(ScheduledEvent::at) else {
                return;
            };
            // 近端的桶全部空了：以最早的溢出事件为基准重新划分
            trace!(old = ?self.threshold, earliest = ?earliest, "rebase bucket threshold");
            self.threshold = earliest.saturating_add(SimTime(self.width));
        }

        let horizon = SimTime(
            self.threshold
                .0
                .saturating_add(self.width.saturating_mul(self.max_buckets as u64)),
        );
        while self.overflow.peek().is_some_and(|e| e.at() < horizon) {
            if let Some(item) = self.overflow.pop() {
                self.place(item);
            }
        }
    }
}
