//! 分发节点
//!
//! 按可插拔的路由规则把数据包交给某一个下一跳；规则没有选出节点时丢弃。

use std::any::Any;

use super::error::TopologyError;
use super::id::NodeId;
use super::node::{BasicNode, Node};
use super::packet::Packet;
use crate::sim::{Event, SimTime};
use crate::trace::{TransferCallback, TransferOutcome};
use tracing::debug;

/// 路由规则：从候选下一跳中选出一个，或者不选。选出非候选节点等同于不选。
pub type RouteSelector = Box<dyn FnMut(&Packet, &[NodeId]) -> Option<NodeId> + Send>;

pub struct ScatterNode {
    basic: BasicNode,
    selector: RouteSelector,
}

impl ScatterNode {
    pub fn new(name: impl Into<String>, selector: RouteSelector) -> Self {
        Self {
            basic: BasicNode::new(name),
            selector,
        }
    }

    /// 按 `Packet::dst` 精确匹配下一跳的规则
    pub fn by_destination(name: impl Into<String>) -> Self {
        Self::new(
            name,
            Box::new(|pkt: &Packet, cands: &[NodeId]| {
                pkt.dst.filter(|dst| cands.contains(dst))
            }),
        )
    }

    pub fn with_callback(mut self, callback: TransferCallback) -> Self {
        self.basic.set_callback(callback);
        self
    }

    /// 替换路由规则（例如在拓扑建好、节点 id 确定之后）
    pub fn set_selector(&mut self, selector: RouteSelector) {
        self.selector = selector;
    }
}

impl Node for ScatterNode {
    fn kind(&self) -> &'static str {
        "scatter"
    }

    fn basic(&self) -> &BasicNode {
        &self.basic
    }

    fn basic_mut(&mut self) -> &mut BasicNode {
        &mut self.basic
    }

    fn check(&self) -> Result<(), TopologyError> {
        self.basic
            .require_edges(self.kind(), "at least 1", 1, usize::MAX)
    }

    fn transfer(&mut self, me: NodeId, pkt: Packet, now: SimTime) -> Vec<Event> {
        let choice = (self.selector)(&pkt, self.basic.next());
        match choice.filter(|to| self.basic.next().contains(to)) {
            Some(to) => vec![self.basic.forward(me, to, pkt, now, false)],
            None => {
                debug!(
                    node_name = %self.basic.name(),
                    pkt_id = pkt.id,
                    "没有匹配的路由，丢弃数据包"
                );
                self.basic.observe(now, &pkt, None, TransferOutcome::Unrouted);
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
