//! 端点节点
//!
//! 既是数据包的源头（`Event::send`），也是终点：到达的数据包交给注册的
//! 反应器，反应器可以返回新的事件（例如回显），从而实现双工通信，
//! 而引擎本身不需要理解请求 / 响应语义。

use std::any::Any;

use super::error::TopologyError;
use super::id::NodeId;
use super::node::{BasicNode, Node};
use super::packet::Packet;
use crate::sim::{Event, SimTime};
use crate::trace::{TransferCallback, TransferOutcome};
use tracing::trace;

/// 端点反应器：`(自身 id, 数据包, 到达时间) -> 后续事件`
pub type Reactor = Box<dyn FnMut(NodeId, Packet, SimTime) -> Vec<Event> + Send>;

pub struct EndpointNode {
    basic: BasicNode,
    reactor: Option<Reactor>,
    received: u64,
}

impl EndpointNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            basic: BasicNode::new(name),
            reactor: None,
            received: 0,
        }
    }

    pub fn reacting<F>(mut self, reactor: F) -> Self
    where
        F: FnMut(NodeId, Packet, SimTime) -> Vec<Event> + Send + 'static,
    {
        self.reactor = Some(Box::new(reactor));
        self
    }

    pub fn with_callback(mut self, callback: TransferCallback) -> Self {
        self.basic.set_callback(callback);
        self
    }

    /// 替换反应器
    pub fn set_reactor(&mut self, reactor: Reactor) {
        self.reactor = Some(reactor);
    }

    /// 生成一个在 `at` 时刻从本端点发出 `pkt` 的事件
    pub fn send(me: NodeId, pkt: Packet, at: SimTime) -> Event {
        Event::send(me, pkt, at)
    }

    /// 累计收到的数据包数
    pub fn received(&self) -> u64 {
        self.received
    }
}

impl Node for EndpointNode {
    fn kind(&self) -> &'static str {
        "endpoint"
    }

    fn basic(&self) -> &BasicNode {
        &self.basic
    }

    fn basic_mut(&mut self) -> &mut BasicNode {
        &mut self.basic
    }

    /// 只收不发的端点可以没有出边
    fn check(&self) -> Result<(), TopologyError> {
        self.basic.require_edges(self.kind(), "at most 1", 0, 1)
    }

    fn transfer(&mut self, me: NodeId, pkt: Packet, now: SimTime) -> Vec<Event> {
        self.received += 1;
        self.basic.observe(now, &pkt, None, TransferOutcome::Received);
        match self.reactor.as_mut() {
            Some(react) => react(me, pkt, now),
            None => {
                trace!(node_name = %self.basic.name(), pkt_id = pkt.id, "端点没有反应器");
                Vec::new()
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
