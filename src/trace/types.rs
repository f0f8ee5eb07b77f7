use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

/// 数据包在某个节点上的结局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferOutcome {
    /// 交给了下一跳
    Forwarded,
    /// 被信道的丢包模型丢弃
    Lost,
    /// 限速节点排队已满，被丢弃
    Dropped,
    /// 路由规则没有选出下一跳
    Unrouted,
    /// 到达端点
    Received,
}

/// 一条观测记录（JSON）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// 仿真时间（纳秒，和 `SimTime.0` 同口径）
    pub t_ns: u64,
    pub node: String,
    /// 下一跳（若有）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<usize>,
    pub pkt_id: u64,
    pub flow_id: u64,
    pub size_bytes: usize,
    pub outcome: TransferOutcome,
}

/// 观测回调
pub type TransferCallback = Box<dyn FnMut(&TransferRecord) + Send>;

/// 一个简单的记录收集器（存内存，可被多个节点的回调共享）
#[derive(Debug, Clone, Default)]
pub struct TransferLog {
    records: Arc<Mutex<Vec<TransferRecord>>>,
}

impl TransferLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 生成一个把记录追加到本收集器的回调
    pub fn callback(&self) -> TransferCallback {
        let log = self.clone();
        Box::new(move |rec: &TransferRecord| log.lock().push(rec.clone()))
    }

    pub fn records(&self) -> Vec<TransferRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&*self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TransferRecord>> {
        // 回调 panic 不影响已写入的记录
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}
