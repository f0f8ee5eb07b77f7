//! 网络拓扑
//!
//! 节点存放在数组中，以下标为标识符；边是各节点里的下标列表。
//! 拓扑在引擎启动前构建一次，之后只由引擎线程访问。

use std::fmt::Write as _;

use super::error::TopologyError;
use super::id::NodeId;
use super::node::Node;
use super::packet::Packet;
use crate::sim::{Event, SimTime};
use tracing::{debug, trace, warn};

/// 网络拓扑
#[derive(Default)]
pub struct Topology {
    nodes: Vec<Box<dyn Node>>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加节点
    pub fn add(&mut self, node: impl Node) -> NodeId {
        self.add_boxed(Box::new(node))
    }

    pub fn add_boxed(&mut self, node: Box<dyn Node>) -> NodeId {
        let id = NodeId(self.nodes.len());
        trace!(id = %id, name = node.name(), kind = node.kind(), "添加节点");
        self.nodes.push(node);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 追加一条 `from -> to` 的有向边（重复的边只保留一条）
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), TopologyError> {
        self.ensure(to)?;
        let node = self.get_mut(from).ok_or(TopologyError::UnknownNode(from))?;
        if !node.next().contains(&to) {
            let mut next = node.next().to_vec();
            next.push(to);
            node.set_next(next);
        }
        Ok(())
    }

    /// 覆盖 `from` 的全部出边
    pub fn set_next(&mut self, from: NodeId, next: Vec<NodeId>) -> Result<(), TopologyError> {
        for &to in &next {
            self.ensure(to)?;
        }
        self.get_mut(from)
            .ok_or(TopologyError::UnknownNode(from))?
            .set_next(next);
        Ok(())
    }

    pub fn get(&self, id: NodeId) -> Option<&dyn Node> {
        self.nodes.get(id.0).map(|n| n.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut dyn Node> {
        match self.nodes.get_mut(id.0) {
            Some(n) => Some(n.as_mut()),
            None => None,
        }
    }

    /// 以具体类型访问节点
    pub fn node<T: Node>(&self, id: NodeId) -> Option<&T> {
        self.get(id)?.as_any().downcast_ref::<T>()
    }

    pub fn node_mut<T: Node>(&mut self, id: NodeId) -> Option<&mut T> {
        self.get_mut(id)?.as_any_mut().downcast_mut::<T>()
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name() == name).map(NodeId)
    }

    /// 启动前检查：每个节点的连线约束，以及所有边都指向存在的节点
    pub fn check(&self) -> Result<(), TopologyError> {
        for node in &self.nodes {
            node.check()?;
            for &to in node.next() {
                self.ensure(to)?;
            }
        }
        Ok(())
    }

    /// 每个节点一行的摘要
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let next: Vec<usize> = node.next().iter().map(|n| n.0).collect();
            let _ = writeln!(
                out,
                "node {i}: {{name: \"{}\", type: {}, next: {:?}}}",
                node.name(),
                node.kind(),
                next
            );
        }
        out
    }

    fn ensure(&self, id: NodeId) -> Result<(), TopologyError> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(TopologyError::UnknownNode(id))
        }
    }

    /// 把数据包交给节点处理
    pub(crate) fn transfer(&mut self, to: NodeId, pkt: Packet, now: SimTime) -> Vec<Event> {
        let Some(node) = self.get_mut(to) else {
            warn!(to = %to, pkt_id = pkt.id, "目标节点不存在，丢弃数据包");
            return Vec::new();
        };
        node.transfer(to, pkt, now)
    }

    /// `from` 把数据包交给 `to`：先通知 `from`（观测回调 / 队列记账），再由 `to` 处理
    pub(crate) fn forward(
        &mut self,
        from: NodeId,
        to: NodeId,
        pkt: Packet,
        now: SimTime,
        queued: bool,
    ) -> Vec<Event> {
        if let Some(node) = self.get_mut(from) {
            node.on_forward(&pkt, to, now, queued);
        }
        self.transfer(to, pkt, now)
    }

    /// 端点发出数据包：沿其唯一的出边转发
    pub(crate) fn send(&mut self, from: NodeId, pkt: Packet, now: SimTime) -> Vec<Event> {
        let Some(node) = self.get(from) else {
            warn!(from = %from, pkt_id = pkt.id, "源节点不存在，丢弃数据包");
            return Vec::new();
        };
        let Some(&to) = node.next().first() else {
            warn!(node_name = node.name(), pkt_id = pkt.id, "端点没有出边，丢弃数据包");
            return Vec::new();
        };
        debug!(from = %from, to = %to, pkt_id = pkt.id, "📤 端点发出数据包");
        self.forward(from, to, pkt, now, false)
    }
}
