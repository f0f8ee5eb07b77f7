//! 广播节点：把数据包复制到每一条出边，同一时刻转发。

use std::any::Any;

use super::error::TopologyError;
use super::id::NodeId;
use super::node::{BasicNode, Node};
use super::packet::Packet;
use crate::sim::{Event, SimTime};
use crate::trace::TransferCallback;

pub struct BroadcastNode {
    basic: BasicNode,
}

impl BroadcastNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            basic: BasicNode::new(name),
        }
    }

    pub fn with_callback(mut self, callback: TransferCallback) -> Self {
        self.basic.set_callback(callback);
        self
    }
}

impl Node for BroadcastNode {
    fn kind(&self) -> &'static str {
        "broadcast"
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
        self.basic
            .next()
            .iter()
            .map(|&to| self.basic.forward(me, to, pkt.clone(), now, false))
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
