//! 节点接口
//!
//! 所有节点都由拓扑数组持有，边以下标列表表示。节点不直接调用下一跳：
//! `transfer` 只返回事件，由引擎在对应时刻触发，从而让所有派生的副作用
//! 都回到全局时间顺序之下。

use std::any::Any;
use std::fmt;

use super::error::TopologyError;
use super::id::NodeId;
use super::packet::Packet;
use crate::sim::{Event, SimTime};
use crate::trace::{TransferCallback, TransferOutcome, TransferRecord};

/// 节点接口
pub trait Node: Any + Send {
    /// 节点类型名（用于日志与拓扑摘要）
    fn kind(&self) -> &'static str;

    fn basic(&self) -> &BasicNode;

    fn basic_mut(&mut self) -> &mut BasicNode;

    /// 处理到达的数据包，返回由此产生的未来事件
    fn transfer(&mut self, me: NodeId, pkt: Packet, now: SimTime) -> Vec<Event>;

    /// 启动前的连线检查
    fn check(&self) -> Result<(), TopologyError> {
        Ok(())
    }

    /// 本节点发出的转发事件触发时调用（在下一跳处理之前）
    fn on_forward(&mut self, pkt: &Packet, to: NodeId, now: SimTime, _queued: bool) {
        self.basic_mut()
            .observe(now, pkt, Some(to), TransferOutcome::Forwarded);
    }

    fn name(&self) -> &str {
        self.basic().name()
    }

    fn next(&self) -> &[NodeId] {
        self.basic().next()
    }

    fn set_next(&mut self, next: Vec<NodeId>) {
        self.basic_mut().set_next(next);
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// 节点的公共部分：名称、出边与观测回调。
pub struct BasicNode {
    name: String,
    next: Vec<NodeId>,
    callback: Option<TransferCallback>,
}

impl BasicNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next: Vec::new(),
            callback: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn next(&self) -> &[NodeId] {
        &self.next
    }

    pub fn set_next(&mut self, next: Vec<NodeId>) {
        self.next = next;
    }

    pub fn set_callback(&mut self, callback: TransferCallback) {
        self.callback = Some(callback);
    }

    /// 唯一的出边（多于一条时取第一条，由 `check` 保证只有一条）
    pub fn single_next(&self) -> Option<NodeId> {
        self.next.first().copied()
    }

    /// 生成一个在 `at` 时刻把数据包交给 `to` 的事件。
    pub fn forward(&self, me: NodeId, to: NodeId, pkt: Packet, at: SimTime, queued: bool) -> Event {
        Event::forward(me, to, pkt, at, queued)
    }

    /// 触发观测回调
    pub fn observe(
        &mut self,
        now: SimTime,
        pkt: &Packet,
        target: Option<NodeId>,
        outcome: TransferOutcome,
    ) {
        let Some(cb) = self.callback.as_mut() else {
            return;
        };
        cb(&TransferRecord {
            t_ns: now.0,
            node: self.name.clone(),
            target: target.map(|t| t.0),
            pkt_id: pkt.id,
            flow_id: pkt.flow_id,
            size_bytes: pkt.size(),
            outcome,
        });
    }

    /// 检查出边数量落在 `[min, max]` 区间内
    pub fn require_edges(
        &self,
        kind: &'static str,
        expected: &'static str,
        min: usize,
        max: usize,
    ) -> Result<(), TopologyError> {
        let actual = self.next.len();
        if actual < min || actual > max {
            return Err(TopologyError::EdgeCount {
                node: self.name.clone(),
                kind,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for BasicNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicNode")
            .field("name", &self.name)
            .field("next", &self.next)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
