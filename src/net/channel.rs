//! 信道节点
//!
//! 对经过的数据包施加组合后的延迟 / 丢包 / 乱序损伤。

use std::any::Any;

use super::error::TopologyError;
use super::handler::{PacketHandler, Verdict};
use super::id::NodeId;
use super::node::{BasicNode, Node};
use super::packet::Packet;
use crate::sim::{Event, SimTime};
use crate::trace::{TransferCallback, TransferOutcome};
use tracing::{debug, trace};

/// 信道：恰好一条出边
pub struct ChannelNode {
    basic: BasicNode,
    handler: Option<PacketHandler>,
}

impl ChannelNode {
    pub fn new(name: impl Into<String>, handler: PacketHandler) -> Self {
        Self {
            basic: BasicNode::new(name),
            handler: Some(handler),
        }
    }

    /// 不施加任何损伤的信道
    pub fn passthrough(name: impl Into<String>) -> Self {
        Self {
            basic: BasicNode::new(name),
            handler: None,
        }
    }

    pub fn with_callback(mut self, callback: TransferCallback) -> Self {
        self.basic.set_callback(callback);
        self
    }
}

impl Node for ChannelNode {
    fn kind(&self) -> &'static str {
        "channel"
    }

    fn basic(&self) -> &BasicNode {
        &self.basic
    }

    fn basic_mut(&mut self) -> &mut BasicNode {
        &mut self.basic
    }

    fn check(&self) -> Result<(), TopologyError> {
        self.basic.require_edges(self.kind(), "exactly 1", 1, 1)
    }

    #[tracing::instrument(skip(self, pkt), fields(node_name = %self.basic.name(), pkt_id = pkt.id))]
    fn transfer(&mut self, me: NodeId, pkt: Packet, now: SimTime) -> Vec<Event> {
        let verdict = match self.handler.as_mut() {
            Some(h) => h(&pkt),
            None => Verdict::default(),
        };
        let Some(to) = self.basic.single_next() else {
            debug!("信道没有出边，丢弃数据包");
            return Vec::new();
        };
        if verdict.lost {
            debug!("数据包丢失");
            self.basic.observe(now, &pkt, Some(to), TransferOutcome::Lost);
            return Vec::new();
        }
        let at = now.offset(verdict.delay_ns.max(0));
        trace!(delay_ns = verdict.delay_ns, at = ?at, "调度转发");
        vec![self.basic.forward(me, to, pkt, at, false)]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
