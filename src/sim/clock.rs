//! 时钟
//!
//! 引擎每轮循环向时钟询问一次“现在”。真实时钟跟随墙上时间；
//! 步进时钟每被调用一次就前进固定步长，与墙上时间完全解耦。

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use super::time::SimTime;

/// 时钟接口
pub trait Clock: Send {
    fn now(&mut self) -> SimTime;
}

/// 跟随墙上时间的时钟。
#[derive(Debug, Clone)]
pub struct RealClock {
    origin: SimTime,
    started: Instant,
}

impl RealClock {
    /// 以当前 UNIX 时间（纳秒）为起点。
    pub fn new() -> Self {
        let origin = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| SimTime(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)))
            .unwrap_or(SimTime::ZERO);
        Self::starting_at(origin)
    }

    /// 以给定时间为起点，之后按真实流逝的时间前进。
    pub fn starting_at(origin: SimTime) -> Self {
        Self {
            origin,
            started: Instant::now(),
        }
    }
}

impl Default for RealClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for RealClock {
    fn now(&mut self) -> SimTime {
        let elapsed = u64::try_from(self.started.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.origin.saturating_add(SimTime(elapsed))
    }
}

/// 步进时钟：依次返回 `start`, `start + step`, `start + 2*step`, ...
#[derive(Debug, Clone)]
pub struct StepClock {
    next: SimTime,
    step: SimTime,
}

impl StepClock {
    pub fn new(start: SimTime, step: SimTime) -> Self {
        Self { next: start, step }
    }
}

impl Clock for StepClock {
    fn now(&mut self) -> SimTime {
        let t = self.next;
        self.next = self.next.saturating_add(self.step);
        t
    }
}
