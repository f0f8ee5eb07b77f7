//! 网络节点模块
//!
//! 此模块包含拓扑中的数据包、节点接口、各类节点（信道、限速、分发、
//! 汇聚、广播、端点）、损伤处理器组合、拓扑数组与构建器。

// 子模块声明
mod broadcast;
mod builder;
mod channel;
mod endpoint;
mod error;
mod gather;
mod handler;
mod id;
mod node;
mod packet;
mod restrict;
mod scatter;
mod topology;

// 重新导出公共接口
pub use broadcast::BroadcastNode;
pub use builder::Builder;
pub use channel::ChannelNode;
pub use endpoint::{EndpointNode, Reactor};
pub use error::TopologyError;
pub use gather::GatherNode;
pub use handler::{PacketHandler, Verdict, combine, delay_handler, loss_handler};
pub use id::NodeId;
pub use node::{BasicNode, Node};
pub use packet::Packet;
pub use restrict::{RestrictLimits, RestrictNode};
pub use scatter::{RouteSelector, ScatterNode};
pub use topology::Topology;
