//! 汇聚节点：多入一出，原样转发。

use std::any::Any;

use super::error::TopologyError;
use super::id::NodeId;
use super::node::{BasicNode, Node};
use super::packet::Packet;
use crate::sim::{Event, SimTime};
use crate::trace::TransferCallback;

pub struct GatherNode {
    basic: BasicNode,
}

impl GatherNode {
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

impl Node for GatherNode {
    fn kind(&self) -> &'static str {
        "gather"
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

    fn transfer(&mut self, me: NodeId, pkt: Packet, now: SimTime) -> Vec<Event> {
        self.basic
            .single_next()
            .map(|to| self.basic.forward(me, to, pkt, now, false))
            .into_iter()
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
