//! 损伤处理器
//!
//! 处理器把一个数据包映射为（额外延迟，是否丢失）。延迟是有符号纳秒：
//! 乱序模型通过负延迟让数据包“提前”出发。

use super::packet::Packet;

/// 单个处理器对一个数据包的判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Verdict {
    pub delay_ns: i64,
    pub lost: bool,
}

impl Verdict {
    pub fn delay(delay_ns: i64) -> Self {
        Self {
            delay_ns,
            lost: false,
        }
    }

    pub fn lost() -> Self {
        Self {
            delay_ns: 0,
            lost: true,
        }
    }
}

/// 损伤处理器
pub type PacketHandler = Box<dyn FnMut(&Packet) -> Verdict + Send>;

/// 组合多个处理器：延迟求和，丢失取或。
///
/// 每个处理器都会被调用（有状态的模型需要看到每一个包），因此组合结果
/// 与处理器的顺序无关。
pub fn combine(handlers: impl IntoIterator<Item = PacketHandler>) -> PacketHandler {
    let mut handlers: Vec<PacketHandler> = handlers.into_iter().collect();
    Box::new(move |pkt: &Packet| {
        handlers.iter_mut().fold(Verdict::default(), |acc, h| {
            let v = h(pkt);
            Verdict {
                delay_ns: acc.delay_ns.saturating_add(v.delay_ns),
                lost: acc.lost || v.lost,
            }
        })
    })
}

/// 只产生延迟的处理器
pub fn delay_handler<F>(mut f: F) -> PacketHandler
where
    F: FnMut(&Packet) -> i64 + Send + 'static,
{
    Box::new(move |pkt: &Packet| Verdict::delay(f(pkt)))
}

/// 只决定丢失的处理器
pub fn loss_handler<F>(mut f: F) -> PacketHandler
where
    F: FnMut(&Packet) -> bool + Send + 'static,
{
    Box::new(move |pkt: &Packet| Verdict {
        delay_ns: 0,
        lost: f(pkt),
    })
}
