//! 乱序模型
//!
//! 乱序通过负延迟实现：被选中的包比正常情况提前 `delay` 出发，
//! 从而越过之前的包。

use rand::Rng;
use rand::rngs::StdRng;

use super::{as_delay_ns, check_probability};
use crate::net::{PacketHandler, TopologyError, delay_handler};
use crate::sim::SimTime;

/// 不乱序
pub fn no_reorder() -> PacketHandler {
    delay_handler(|_| 0)
}

/// 概率乱序：以 `correlation` 的概率沿用上一个包的结果，否则以
/// `possibility` 的概率乱序
pub fn normal_reorder(
    delay: SimTime,
    possibility: f64,
    correlation: f64,
    mut rng: StdRng,
) -> Result<PacketHandler, TopologyError> {
    check_probability("possibility", possibility)?;
    check_probability("correlation", correlation)?;
    let advance = -as_delay_ns(delay);
    let mut last = false;
    Ok(delay_handler(move |_| {
        if !rng.gen_bool(correlation) {
            last = rng.gen_bool(possibility);
        }
        if last { advance } else { 0 }
    }))
}

/// 间隔乱序（参照 tc-netem 的 reorder gap）：每 `gap` 个包中最多一个被
/// 提前，其余按顺序发送
pub fn gap_reorder(
    delay: SimTime,
    possibility: f64,
    correlation: f64,
    gap: u32,
    mut rng: StdRng,
) -> Result<PacketHandler, TopologyError> {
    check_probability("possibility", possibility)?;
    check_probability("correlation", correlation)?;
    let advance = -as_delay_ns(delay);
    let mut last = false;
    let mut count = 0u32;
    Ok(delay_handler(move |_| {
        if rng.gen_bool(correlation) {
            return if last { advance } else { 0 };
        }
        count = count.saturating_add(1);
        if count < gap {
            last = false;
            return 0;
        }
        last = rng.gen_bool(possibility);
        if last {
            count = 0;
            advance
        } else {
            0
        }
    }))
}
