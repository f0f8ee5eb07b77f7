//! 拓扑构建器
//!
//! 以“链”的方式描述网络：每条链依次连接若干节点，链之间可以通过名字
//! 引用已经加入的节点。构建过程中遇到的第一个错误会被记住，由 `build`
//! 返回，因此链式调用中不需要逐个处理错误。
//!
//! ```text
//! builder.chain().node(a).node(b).node_with_name("c", c);
//! builder.chain().node(d).node_by_name("c");   // d -> c
//! builder.chain().node(e).group_with_name("path", vec![f, g]);
//! builder.chain().node(h).group_by_name("path"); // h -> f -> g
//! ```

use std::collections::HashMap;

use super::error::TopologyError;
use super::id::NodeId;
use super::node::Node;
use super::topology::Topology;
use tracing::info;

#[derive(Default)]
pub struct Builder {
    topo: Topology,
    names: HashMap<String, NodeId>,
    /// 具名分组：组名 -> 组内节点（按链的顺序）
    groups: HashMap<String, Vec<NodeId>>,
    /// from -> 出边（按首次出现顺序，去重）
    connections: Vec<(NodeId, Vec<NodeId>)>,
    current: Option<NodeId>,
    error: Option<TopologyError>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 结束当前链，开始描述一条新链
    pub fn chain(&mut self) -> &mut Self {
        self.current = None;
        self
    }

    /// 加入节点并接到当前链尾；节点名非空时以节点名登记
    pub fn node(&mut self, node: impl Node) -> &mut Self {
        let name = node.name().to_string();
        self.node_with_name(&name, node)
    }

    /// 同 `node`，但以给定名字登记
    pub fn node_with_name(&mut self, name: &str, node: impl Node) -> &mut Self {
        self.insert(name, Box::new(node))
    }

    /// 依次加入若干新节点
    pub fn group(&mut self, nodes: impl IntoIterator<Item = Box<dyn Node>>) -> &mut Self {
        for node in nodes {
            let name = node.name().to_string();
            self.insert(&name, node);
        }
        self
    }

    /// 依次加入若干新节点，并把它们登记为名为 `name` 的分组
    pub fn group_with_name(
        &mut self,
        name: &str,
        nodes: impl IntoIterator<Item = Box<dyn Node>>,
    ) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        if self.groups.contains_key(name) {
            self.fail(TopologyError::DuplicateName(name.to_string()));
            return self;
        }
        let mut members = Vec::new();
        for node in nodes {
            let node_name = node.name().to_string();
            self.insert(&node_name, node);
            if self.error.is_some() {
                return self;
            }
            members.extend(self.current);
        }
        self.groups.insert(name.to_string(), members);
        self
    }

    /// 把已登记的分组按原顺序接到当前链尾
    pub fn group_by_name(&mut self, name: &str) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        match self.groups.get(name).cloned() {
            Some(members) => {
                for id in members {
                    self.append(id);
                }
                self
            }
            None => {
                self.fail(TopologyError::UnknownName(name.to_string()));
                self
            }
        }
    }

    /// 把已登记的节点接到当前链尾
    pub fn node_by_name(&mut self, name: &str) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        match self.names.get(name).copied() {
            Some(id) => self.append(id),
            None => {
                self.fail(TopologyError::UnknownName(name.to_string()));
                self
            }
        }
    }

    /// 依次把若干已登记的节点接到当前链尾
    pub fn nodes_by_name(&mut self, names: &[&str]) -> &mut Self {
        for name in names {
            self.node_by_name(name);
        }
        self
    }

    /// 已登记节点的 id
    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// 设置连线、检查所有节点，返回拓扑与名字表
    pub fn build(self) -> Result<(Topology, HashMap<String, NodeId>), TopologyError> {
        let Builder {
            mut topo,
            names,
            connections,
            error,
            ..
        } = self;
        if let Some(e) = error {
            return Err(e);
        }
        for (from, next) in connections {
            topo.set_next(from, next)?;
        }
        topo.check()?;
        info!(nodes = topo.len(), "network summary:\n{}", topo.summary());
        Ok((topo, names))
    }

    fn insert(&mut self, name: &str, node: Box<dyn Node>) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        if !name.is_empty() && self.names.contains_key(name) {
            self.fail(TopologyError::DuplicateName(name.to_string()));
            return self;
        }
        let id = self.topo.add_boxed(node);
        if !name.is_empty() {
            self.names.insert(name.to_string(), id);
        }
        self.append(id)
    }

    fn append(&mut self, id: NodeId) -> &mut Self {
        if let Some(from) = self.current {
            match self.connections.iter_mut().find(|(f, _)| *f == from) {
                Some((_, next)) => {
                    if !next.contains(&id) {
                        next.push(id);
                    }
                }
                None => self.connections.push((from, vec![id])),
            }
        }
        self.current = Some(id);
        self
    }

    fn fail(&mut self, e: TopologyError) {
        if self.error.is_none() {
            self.error = Some(e);
        }
    }
}
