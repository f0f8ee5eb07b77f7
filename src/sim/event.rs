//! 仿真事件
//!
//! 事件 = 触发时间 + 动作。节点之间传递数据包的事件是纯数据
//! （目标节点、数据包），只有用户提供的动作才是闭包。

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::time::SimTime;
use crate::net::{NodeId, Packet, Topology};
use tracing::warn;

/// 一次性动作：以事件的到期时间调用，返回后续事件。
pub type Action = Box<dyn FnOnce(SimTime) -> Vec<Event> + Send>;

/// 可重复动作：额外返回下一次触发的延迟（纳秒），负数表示不再重复。
pub type RepeatingAction = Box<dyn FnMut(SimTime) -> (Vec<Event>, i64) + Send>;

pub(crate) enum Kind {
    /// 直接交给节点处理
    Transfer { to: NodeId, pkt: Packet },
    /// 端点发出数据包：触发时沿端点唯一的出边转发
    Send { from: NodeId, pkt: Packet },
    /// 节点把数据包交给下一跳；`queued` 表示该包曾在限速队列中等待
    Forward {
        from: NodeId,
        to: NodeId,
        pkt: Packet,
        queued: bool,
    },
    Once(Action),
    Repeating(RepeatingAction),
}

/// 调度事件：在 `at` 时刻执行一次。
pub struct Event {
    pub(crate) at: SimTime,
    pub(crate) kind: Kind,
}

impl Event {
    /// 在 `at` 时刻执行 `action`。
    pub fn once<F>(at: SimTime, action: F) -> Event
    where
        F: FnOnce(SimTime) -> Vec<Event> + Send + 'static,
    {
        Event {
            at,
            kind: Kind::Once(Box::new(action)),
        }
    }

    /// 在 `now + delay` 时刻执行 `action`。
    pub fn delayed<F>(action: F, delay: SimTime, now: SimTime) -> Event
    where
        F: FnOnce(SimTime) -> Vec<Event> + Send + 'static,
    {
        Event::once(now.saturating_add(delay), action)
    }

    /// 可重复事件：每次触发后按返回的延迟重新登记，延迟为负时停止。
    ///
    /// 延迟为 0 时按 1ns 处理，下一次触发总是严格晚于本次。
    pub fn repeating<F>(at: SimTime, action: F) -> Event
    where
        F: FnMut(SimTime) -> (Vec<Event>, i64) + Send + 'static,
    {
        Event {
            at,
            kind: Kind::Repeating(Box::new(action)),
        }
    }

    /// 周期事件，附带一个取消句柄。
    ///
    /// 取消标志只在下一次触发时检查：取消之后最多还会有一次已登记的触发，
    /// 但它不再执行 `action`，也不再重新登记。
    ///
    /// `period` 必须为正，否则 panic。
    pub fn periodic<F>(at: SimTime, period: SimTime, mut action: F) -> (Event, Cancel)
    where
        F: FnMut(SimTime) -> Vec<Event> + Send + 'static,
    {
        assert!(period > SimTime::ZERO, "period must be positive");
        let cancel = Cancel::default();
        let flag = cancel.clone();
        let period_ns = i64::try_from(period.0).unwrap_or(i64::MAX);
        let ev = Event::repeating(at, move |now| {
            if flag.is_cancelled() {
                return (Vec::new(), -1);
            }
            (action(now), period_ns)
        });
        (ev, cancel)
    }

    /// 在 `at` 时刻把 `pkt` 直接交给节点 `to`。
    pub fn transfer(to: NodeId, pkt: Packet, at: SimTime) -> Event {
        Event {
            at,
            kind: Kind::Transfer { to, pkt },
        }
    }

    /// 在 `at` 时刻从端点 `from` 发出 `pkt`。
    pub fn send(from: NodeId, pkt: Packet, at: SimTime) -> Event {
        Event {
            at,
            kind: Kind::Send { from, pkt },
        }
    }

    pub(crate) fn forward(
        from: NodeId,
        to: NodeId,
        pkt: Packet,
        at: SimTime,
        queued: bool,
    ) -> Event {
        Event {
            at,
            kind: Kind::Forward {
                from,
                to,
                pkt,
                queued,
            },
        }
    }

    /// 触发时间
    pub fn time(&self) -> SimTime {
        self.at
    }

    pub(crate) fn label(&self) -> &'static str {
        match self.kind {
            Kind::Transfer { .. } => "transfer",
            Kind::Send { .. } => "send",
            Kind::Forward { .. } => "forward",
            Kind::Once(_) => "once",
            Kind::Repeating(_) => "repeating",
        }
    }

    /// 执行事件，返回由此产生的后续事件。
    pub(crate) fn fire(self, topo: &mut Topology) -> Vec<Event> {
        let Event { at, kind } = self;
        match kind {
            Kind::Transfer { to, pkt } => topo.transfer(to, pkt, at),
            Kind::Send { from, pkt } => topo.send(from, pkt, at),
            Kind::Forward {
                from,
                to,
                pkt,
                queued,
            } => topo.forward(from, to, pkt, at, queued),
            Kind::Once(action) => action(at),
            Kind::Repeating(mut action) => {
                let (mut events, delay) = action(at);
                if delay < 0 {
                    return events;
                }
                let next = at.offset(delay.max(1));
                if next > at {
                    events.push(Event {
                        at: next,
                        kind: Kind::Repeating(action),
                    });
                } else {
                    warn!(at = ?at, "重复事件已到达时间上限，不再登记");
                }
                events
            }
        }
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("at", &self.at)
            .field("kind", &self.label())
            .finish()
    }
}

/// 周期事件的取消句柄，可跨线程克隆。
#[derive(Debug, Clone, Default)]
pub struct Cancel(Arc<AtomicBool>);

impl Cancel {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

