//! 堆元素
//!
//! 按触发时间比较的事件包装，供事件存储中的二叉堆使用。

use super::event::Event;
use super::time::SimTime;
use std::cmp::Ordering;

/// 堆中的事件。只比较时间：同一时刻的事件之间没有定义的先后顺序。
pub(crate) struct ScheduledEvent(pub(crate) Event);

impl ScheduledEvent {
    pub(crate) fn at(&self) -> SimTime {
        self.0.at
    }
}

// BinaryHeap 是 max-heap；我们需要最小时间优先，因此反向比较。
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at().cmp(&other.at()).reverse()
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.at() == other.at()
    }
}

impl Eq for ScheduledEvent {}
