//! 仿真时间类型
//!
//! 定义仿真时间及其单位转换。

use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// 仿真时间（纳秒）。既表示时间点，也用于表示非负时长。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);
    pub const MAX: SimTime = SimTime(u64::MAX);

    pub fn from_nanos(ns: u64) -> SimTime {
        SimTime(ns)
    }
    pub fn from_micros(us: u64) -> SimTime {
        SimTime(us.saturating_mul(1_000))
    }
    pub fn from_millis(ms: u64) -> SimTime {
        SimTime(ms.saturating_mul(1_000_000))
    }
    pub fn from_secs(s: u64) -> SimTime {
        SimTime(s.saturating_mul(1_000_000_000))
    }

    /// 由浮点秒数构造，四舍五入到纳秒；负数与 NaN 视为 0。
    pub fn from_secs_f64(secs: f64) -> SimTime {
        if !(secs > 0.0) {
            return SimTime::ZERO;
        }
        let ns = (secs * NANOS_PER_SEC).round();
        if ns >= u64::MAX as f64 {
            SimTime::MAX
        } else {
            SimTime(ns as u64)
        }
    }

    pub fn as_nanos(self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC
    }

    pub fn saturating_add(self, d: SimTime) -> SimTime {
        SimTime(self.0.saturating_add(d.0))
    }

    pub fn saturating_sub(self, d: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(d.0))
    }

    /// 加上一个有符号的纳秒偏移，结果钳制在 `[0, u64::MAX]`。
    pub fn offset(self, delta_ns: i64) -> SimTime {
        if delta_ns >= 0 {
            SimTime(self.0.saturating_add(delta_ns as u64))
        } else {
            SimTime(self.0.saturating_sub(delta_ns.unsigned_abs()))
        }
    }
}
