//! 数据包类型
//!
//! 仿真只关心数据包的字节数；载荷不会被解析，也不会真正发送到网卡。

use bytes::Bytes;

use super::id::NodeId;

/// 网络数据包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: u64,
    pub flow_id: u64,
    /// 可选的目的节点，供自定义路由规则使用
    pub dst: Option<NodeId>,
    pub payload: Bytes,
}

impl Packet {
    /// 创建携带给定载荷的数据包
    pub fn new(id: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            id,
            flow_id: 0,
            dst: None,
            payload: payload.into(),
        }
    }

    /// 创建指定字节数、载荷全零的数据包
    pub fn sized(id: u64, size_bytes: usize) -> Self {
        Self::new(id, vec![0u8; size_bytes])
    }

    pub fn with_flow(mut self, flow_id: u64) -> Self {
        self.flow_id = flow_id;
        self
    }

    pub fn with_dst(mut self, dst: NodeId) -> Self {
        self.dst = Some(dst);
        self
    }

    /// 字节数
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}
