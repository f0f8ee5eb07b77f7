//! 限速节点
//!
//! 模拟一条单服务台链路：同时受每秒包数（pps）与每秒字节数（bps）限制，
//! 并带有一个按字节数和/或包数设上限的等待队列。
//!
//! `busy_time` 是链路预计空闲下来的时刻。一个包到达时若链路忙，它就需要
//! 排队；排队会超出任一上限则直接丢弃。否则服务时间取
//! `max(1/pps, size/bps)`，链路从 `max(now, busy_time)` 开始服务，并在新的
//! `busy_time` 把包交给下一跳。排队计数只在包等待期间有效：转发事件触发
//! 时扣回。

use std::any::Any;

use super::error::TopologyError;
use super::id::NodeId;
use super::node::{BasicNode, Node};
use super::packet::Packet;
use crate::sim::{Event, SimTime};
use crate::trace::{TransferCallback, TransferOutcome};
use tracing::{debug, trace};

/// 限速参数。速率为 `f64::INFINITY`、队列上限为 `None` 表示不限制。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestrictLimits {
    pub pps: f64,
    pub bps: f64,
    pub queue_bytes: Option<u64>,
    pub queue_packets: Option<u64>,
}

impl Default for RestrictLimits {
    fn default() -> Self {
        Self {
            pps: f64::INFINITY,
            bps: f64::INFINITY,
            queue_bytes: None,
            queue_packets: None,
        }
    }
}

impl RestrictLimits {
    pub fn new(pps: f64, bps: f64, queue_bytes: Option<u64>, queue_packets: Option<u64>) -> Self {
        Self {
            pps,
            bps,
            queue_bytes,
            queue_packets,
        }
    }

    /// 只限制包速率，队列按包数设上限
    pub fn pps(limit: f64, queue_packets: u64) -> Self {
        Self {
            pps: limit,
            queue_packets: Some(queue_packets),
            ..Self::default()
        }
    }

    /// 只限制字节速率，队列按字节数设上限
    pub fn bps(limit: f64, queue_bytes: u64) -> Self {
        Self {
            bps: limit,
            queue_bytes: Some(queue_bytes),
            ..Self::default()
        }
    }

    fn validate(&self, node: &str) -> Result<(), TopologyError> {
        for (what, value) in [("pps", self.pps), ("bps", self.bps)] {
            // NaN 也会落入这里
            if !(value > 0.0) {
                return Err(TopologyError::InvalidLimit {
                    node: node.to_string(),
                    what,
                    value,
                });
            }
        }
        Ok(())
    }

    /// 服务一个 `size` 字节的包所需的最短时间
    fn service_time(&self, size: usize) -> SimTime {
        let step = (1.0 / self.pps).max(size as f64 / self.bps);
        SimTime::from_secs_f64(step)
    }
}

pub struct RestrictNode {
    basic: BasicNode,
    limits: RestrictLimits,
    busy_time: SimTime,
    queue_bytes: u64,
    queue_packets: u64,
}

impl RestrictNode {
    pub fn new(name: impl Into<String>, limits: RestrictLimits) -> Result<Self, TopologyError> {
        let basic = BasicNode::new(name);
        limits.validate(basic.name())?;
        Ok(Self {
            basic,
            limits,
            busy_time: SimTime::ZERO,
            queue_bytes: 0,
            queue_packets: 0,
        })
    }

    pub fn with_callback(mut self, callback: TransferCallback) -> Self {
        self.basic.set_callback(callback);
        self
    }

    pub fn limits(&self) -> &RestrictLimits {
        &self.limits
    }

    /// 链路预计空闲的时刻
    pub fn busy_time(&self) -> SimTime {
        self.busy_time
    }

    /// 正在排队的包数
    pub fn queue_packets(&self) -> u64 {
        self.queue_packets
    }

    /// 正在排队的字节数
    pub fn queue_bytes(&self) -> u64 {
        self.queue_bytes
    }

    fn queue_would_overflow(&self, size: u64) -> bool {
        let over_packets = self
            .limits
            .queue_packets
            .is_some_and(|cap| self.queue_packets.saturating_add(1) > cap);
        let over_bytes = self
            .limits
            .queue_bytes
            .is_some_and(|cap| self.queue_bytes.saturating_add(size) > cap);
        over_packets || over_bytes
    }
}

impl Node for RestrictNode {
    fn kind(&self) -> &'static str {
        "restrict"
    }

    fn basic(&self) -> &BasicNode {
        &self.basic
    }

    fn basic_mut(&mut self) -> &mut BasicNode {
        &mut self.basic
    }

    fn check(&self) -> Result<(), TopologyError> {
        self.limits.validate(self.basic.name())?;
        self.basic.require_edges(self.kind(), "exactly 1", 1, 1)
    }

    #[tracing::instrument(skip(self, pkt), fields(node_name = %self.basic.name(), pkt_id = pkt.id))]
    fn transfer(&mut self, me: NodeId, pkt: Packet, now: SimTime) -> Vec<Event> {
        let Some(to) = self.basic.single_next() else {
            debug!("限速节点没有出边，丢弃数据包");
            return Vec::new();
        };
        let size = pkt.size() as u64;
        let queued = self.busy_time > now;
        if queued && self.queue_would_overflow(size) {
            debug!(
                queue_packets = self.queue_packets,
                queue_bytes = self.queue_bytes,
                "队列已满，丢弃数据包"
            );
            self.basic.observe(now, &pkt, Some(to), TransferOutcome::Dropped);
            return Vec::new();
        }

        let start = now.max(self.busy_time);
        self.busy_time = start.saturating_add(self.limits.service_time(pkt.size()));
        if queued {
            self.queue_packets += 1;
            self.queue_bytes = self.queue_bytes.saturating_add(size);
        }
        trace!(
            busy_time = ?self.busy_time,
            queued,
            queue_packets = self.queue_packets,
            "调度转发"
        );
        vec![self.basic.forward(me, to, pkt, self.busy_time, queued)]
    }

    fn on_forward(&mut self, pkt: &Packet, to: NodeId, now: SimTime, queued: bool) {
        if queued {
            self.queue_packets = self.queue_packets.saturating_sub(1);
            self.queue_bytes = self.queue_bytes.saturating_sub(pkt.size() as u64);
        }
        self.basic
            .observe(now, pkt, Some(to), TransferOutcome::Forwarded);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
