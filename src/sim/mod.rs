//! 仿真核心模块
//!
//! 此模块包含事件驱动仿真的核心组件：仿真时间、事件、无锁投递缓冲区、
//! 分桶事件队列、时钟、引擎主循环与后台运行的网络。

// 子模块声明
mod buffer;
mod clock;
mod config;
mod engine;
mod error;
mod event;
mod event_queue;
mod network;
mod scheduled_event;
mod time;

// 重新导出公共接口
pub use buffer::EventBuffer;
pub use clock::{Clock, RealClock, StepClock};
pub use config::EngineConfig;
pub use engine::{Engine, Producer, RunReport};
pub use error::{ConfigError, EngineError};
pub use event::{Action, Cancel, Event, RepeatingAction};
pub use event_queue::EventQueue;
pub use network::Network;
pub use time::SimTime;
