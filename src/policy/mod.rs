//! 常用损伤模型
//!
//! 延迟、丢包与乱序模型，均以 `PacketHandler` 的形式提供，可以用
//! `net::combine` 组合后装到信道节点上。随机模型使用调用方提供的
//! `StdRng`，同一个种子得到同样的序列。

mod delay;
mod loss;
mod reorder;

pub use delay::{fixed_delay, normal_delay, pareto_delay, uniform_delay};
pub use loss::{gilbert_loss, no_loss, random_loss};
pub use reorder::{gap_reorder, no_reorder, normal_reorder};

use crate::net::TopologyError;

fn check_probability(what: &'static str, p: f64) -> Result<(), TopologyError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(TopologyError::InvalidParameter {
            what,
            reason: format!("probability must be within [0, 1], got {p}"),
        })
    }
}

fn as_delay_ns(t: crate::sim::SimTime) -> i64 {
    i64::try_from(t.0).unwrap_or(i64::MAX)
}
