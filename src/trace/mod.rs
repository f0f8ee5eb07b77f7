//! 转发观测记录
//!
//! 节点的观测回调对每一个数据包的去向都会触发一次（包括被丢弃的），
//! 记录可以收集到内存里，仿真结束后写成 JSON。

mod types;

pub use types::{TransferCallback, TransferLog, TransferOutcome, TransferRecord};
