//! 延迟模型

use rand::Rng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, Pareto};

use super::as_delay_ns;
use crate::net::{PacketHandler, TopologyError, delay_handler};
use crate::sim::SimTime;

/// 固定延迟
pub fn fixed_delay(delay: SimTime) -> PacketHandler {
    let ns = as_delay_ns(delay);
    delay_handler(move |_| ns)
}

/// 正态分布延迟；结果可能为负，由信道钳制到 0
pub fn normal_delay(
    average: SimTime,
    sigma: SimTime,
    mut rng: StdRng,
) -> Result<PacketHandler, TopologyError> {
    let dist = Normal::new(average.0 as f64, sigma.0 as f64).map_err(|e| {
        TopologyError::InvalidParameter {
            what: "sigma",
            reason: e.to_string(),
        }
    })?;
    Ok(delay_handler(move |_| dist.sample(&mut rng).round() as i64))
}

/// `[0, 2*average)` 上的均匀分布延迟
pub fn uniform_delay(average: SimTime, mut rng: StdRng) -> Result<PacketHandler, TopologyError> {
    if average == SimTime::ZERO {
        return Err(TopologyError::InvalidParameter {
            what: "average",
            reason: "must be positive".to_string(),
        });
    }
    let upper = as_delay_ns(average).saturating_mul(2);
    Ok(delay_handler(move |_| rng.gen_range(0..upper)))
}

/// 帕累托分布延迟：`min_delay * U^(-1/alpha)`
pub fn pareto_delay(
    min_delay: SimTime,
    alpha: f64,
    mut rng: StdRng,
) -> Result<PacketHandler, TopologyError> {
    if min_delay == SimTime::ZERO {
        return Err(TopologyError::InvalidParameter {
            what: "min_delay",
            reason: "must be positive".to_string(),
        });
    }
    let dist = Pareto::new(min_delay.0 as f64, alpha).map_err(|e| {
        TopologyError::InvalidParameter {
            what: "alpha",
            reason: e.to_string(),
        }
    })?;
    Ok(delay_handler(move |_| {
        let ns = dist.sample(&mut rng);
        if ns >= i64::MAX as f64 {
            i64::MAX
        } else {
            ns.round() as i64
        }
    }))
}
