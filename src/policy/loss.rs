//! 丢包模型

use rand::Rng;
use rand::rngs::StdRng;

use super::check_probability;
use crate::net::{PacketHandler, TopologyError, loss_handler};

/// 不丢包
pub fn no_loss() -> PacketHandler {
    loss_handler(|_| false)
}

/// 以固定概率独立丢包
pub fn random_loss(possibility: f64, mut rng: StdRng) -> Result<PacketHandler, TopologyError> {
    check_probability("possibility", possibility)?;
    Ok(loss_handler(move |_| rng.gen_bool(possibility)))
}

/// Gilbert 两状态丢包模型
#[derive(Debug)]
struct Gilbert {
    s1_loss: f64,
    s1_transit: f64,
    s2_loss: f64,
    s2_transit: f64,
    /// false: 状态 1（好）；true: 状态 2（坏）
    bad: bool,
    rng: StdRng,
}

impl Gilbert {
    fn lost(&mut self) -> bool {
        if !self.bad {
            if self.rng.gen_bool(self.s1_transit) {
                self.bad = true;
            }
            return self.rng.gen_bool(self.s1_loss);
        }
        if self.rng.gen_bool(self.s2_transit) {
            self.bad = false;
        }
        self.rng.gen_bool(self.s2_loss)
    }
}

/// Gilbert 模型：每个状态有各自的丢包概率与转移概率
pub fn gilbert_loss(
    s1_loss: f64,
    s1_transit: f64,
    s2_loss: f64,
    s2_transit: f64,
    rng: StdRng,
) -> Result<PacketHandler, TopologyError> {
    check_probability("s1_loss", s1_loss)?;
    check_probability("s1_transit", s1_transit)?;
    check_probability("s2_loss", s2_loss)?;
    check_probability("s2_transit", s2_transit)?;
    let mut model = Gilbert {
        s1_loss,
        s1_transit,
        s2_loss,
        s2_transit,
        bad: false,
        rng,
    };
    Ok(loss_handler(move |_| model.lost()))
}
