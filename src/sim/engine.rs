//! 调度引擎
//!
//! 单一执行上下文独占事件存储与拓扑：每轮先把无锁缓冲区里的事件全部
//! 取出放入存储，再触发所有到期事件并把它们产生的新事件放回存储。
//! 节点的可变状态只在这里被访问，因此节点本身不需要任何同步。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::buffer::EventBuffer;
use super::clock::Clock;
use super::config::EngineConfig;
use super::event::Event;
use super::event_queue::EventQueue;
use super::time::SimTime;
use crate::net::Topology;

/// 外部线程向运行中的引擎投递事件的句柄。
#[derive(Clone)]
pub struct Producer {
    buffer: Arc<EventBuffer<Event>>,
}

impl Producer {
    pub(crate) fn new(buffer: Arc<EventBuffer<Event>>) -> Self {
        Self { buffer }
    }

    /// 投递事件；永不阻塞。
    pub fn insert(&self, ev: Event) {
        self.buffer.insert(ev);
    }

    pub fn insert_all(&self, events: impl IntoIterator<Item = Event>) {
        self.buffer.insert_all(events);
    }
}

/// 一次运行的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// 触发的事件总数
    pub fired: u64,
    /// 停机时丢弃的事件数（超出收尾视野，或停机后才投递）
    pub discarded: u64,
    pub started_at: SimTime,
    pub finished_at: SimTime,
}

/// 事件驱动引擎：持有拓扑、事件存储与投递缓冲区。
pub struct Engine {
    topology: Topology,
    queue: EventQueue,
    intake: Arc<EventBuffer<Event>>,
    fired: u64,
}

impl Engine {
    pub fn new(topology: Topology, config: &EngineConfig) -> Self {
        Self::with_intake(topology, config, Arc::new(EventBuffer::new()))
    }

    pub(crate) fn with_intake(
        topology: Topology,
        config: &EngineConfig,
        intake: Arc<EventBuffer<Event>>,
    ) -> Self {
        Self {
            topology,
            queue: EventQueue::new(config.bucket_width, config.max_buckets),
            intake,
            fired: 0,
        }
    }

    pub fn producer(&self) -> Producer {
        Producer::new(Arc::clone(&self.intake))
    }

    /// 直接把事件放入存储（仅限持有引擎的线程）。
    pub fn schedule(&mut self, ev: Event) {
        trace!(at = ?ev.at, kind = ev.label(), "调度事件");
        self.queue.enqueue(ev);
    }

    /// 存储中尚未触发的事件数（不含缓冲区）
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn topology_mut(&mut self) -> &mut Topology {
        &mut self.topology
    }

    pub fn into_topology(self) -> Topology {
        self.topology
    }

    /// 取空缓冲区并放入存储，返回取出的事件数。
    fn fetch(&mut self) -> usize {
        let events = self.intake.drain();
        let n = events.len();
        for ev in events {
            self.queue.enqueue(ev);
        }
        if n > 0 {
            trace!(fetched = n, queue_size = self.queue.len(), "取出缓冲区事件");
        }
        n
    }

    fn fire_next(&mut self) {
        let ev = self.queue.dequeue();
        self.fired += 1;
        debug!(
            event_num = self.fired,
            at = ?ev.at,
            kind = ev.label(),
            remaining_queue = self.queue.len(),
            "执行事件"
        );
        for next in ev.fire(&mut self.topology) {
            self.queue.enqueue(next);
        }
    }

    /// 取空缓冲区，然后触发所有时间 `<= now` 的事件，返回触发数量。
    pub fn step(&mut self, now: SimTime) -> usize {
        self.fetch();
        let mut n = 0;
        while self.queue.peek_time().is_some_and(|t| t <= now) {
            self.fire_next();
            n += 1;
        }
        n
    }

    /// 主循环。
    ///
    /// `lifetime` 为 `None` 时只在 `running` 被清除后退出；否则在存储与缓冲区
    /// 都为空、或时钟越过 `起始时间 + lifetime` 时退出。退出前总会执行收尾。
    /// 循环不会睡眠：它持续轮询时钟。
    #[tracing::instrument(skip(self, clock, running))]
    pub fn run(
        &mut self,
        clock: &mut dyn Clock,
        lifetime: Option<SimTime>,
        running: &AtomicBool,
    ) -> RunReport {
        let started_at = clock.now();
        let deadline = lifetime.map(|l| started_at.saturating_add(l));
        let fired_before = self.fired;
        info!(start = ?started_at, deadline = ?deadline, "▶️  引擎主循环开始");

        let mut now;
        loop {
            self.fetch();
            now = clock.now();
            while self.queue.peek_time().is_some_and(|t| t <= now) {
                self.fire_next();
            }

            if !running.load(Ordering::Acquire) {
                debug!(now = ?now, "收到停止请求");
                break;
            }
            if let Some(deadline) = deadline {
                if now > deadline {
                    debug!(now = ?now, deadline = ?deadline, "超出运行时限");
                    break;
                }
                if self.queue.is_empty() && self.intake.is_empty() {
                    debug!(now = ?now, "没有待处理事件");
                    break;
                }
            }
        }

        let discarded = self.clear(now);
        let report = RunReport {
            fired: self.fired - fired_before,
            discarded,
            started_at,
            finished_at: now,
        };
        info!(
            total_events = report.fired,
            discarded = report.discarded,
            final_time = ?now,
            "✅ 引擎主循环结束"
        );
        report
    }

    /// 停机收尾：不再参考时钟，按时间顺序触发存储中剩余的全部事件
    /// 以及它们派生出的事件，直到收尾视野为止。
    ///
    /// 视野取 `now` 与停机时存储中最晚事件时间的较大者；视野之外派生出的
    /// 事件（例如永不取消的周期事件）被丢弃并记录告警。
    fn clear(&mut self, now: SimTime) -> u64 {
        self.fetch();
        let horizon = self.queue.latest_time().map_or(now, |t| t.max(now));
        trace!(horizon = ?horizon, pending = self.queue.len(), "收尾");
        while self.queue.peek_time().is_some_and(|t| t <= horizon) {
            self.fire_next();
            self.fetch();
        }
        // 最后一次 fetch 之后投递的事件同样计入丢弃
        self.fetch();

        let discarded = self.queue.len() as u64;
        if discarded > 0 {
            warn!(discarded, horizon = ?horizon, "丢弃超出收尾视野的事件");
            while !self.queue.is_empty() {
                drop(self.queue.dequeue());
            }
        }
        discarded
    }
}
