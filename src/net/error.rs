//! 拓扑构建错误
//!
//! 都是启动前的配置错误：应当在仿真开始前终止程序，而不是被捕获重试。

use thiserror::Error;

use super::id::NodeId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    #[error("node `{node}` ({kind}) requires {expected} outgoing edge(s), found {actual}")]
    EdgeCount {
        node: String,
        kind: &'static str,
        expected: &'static str,
        actual: usize,
    },
    #[error("invalid limit for node `{node}`: {what} = {value}")]
    InvalidLimit {
        node: String,
        what: &'static str,
        value: f64,
    },
    #[error("invalid parameter `{what}`: {reason}")]
    InvalidParameter { what: &'static str, reason: String },
    #[error("no node named `{0}`")]
    UnknownName(String),
    #[error("node name `{0}` is already taken")]
    DuplicateName(String),
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
}
