//! 后台运行的网络
//!
//! 把引擎放到独立线程上运行：`run` 为有限时长运行，`start` 一直运行到
//! `stop`。`stop`/`wait` 阻塞到主循环完成收尾，并把拓扑交还给调用方。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use super::buffer::EventBuffer;
use super::clock::Clock;
use super::config::EngineConfig;
use super::engine::{Engine, Producer, RunReport};
use super::error::EngineError;
use super::event::Event;
use super::time::SimTime;
use crate::net::{Topology, TopologyError};

/// 一个已经连好线、通过检查的网络。
pub struct Network {
    topology: Option<Topology>,
    intake: Arc<EventBuffer<Event>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<(Engine, RunReport)>>,
}

impl Network {
    /// 对所有节点执行 `check` 后创建网络。
    pub fn new(topology: Topology) -> Result<Self, TopologyError> {
        topology.check()?;
        Ok(Self {
            topology: Some(topology),
            intake: Arc::new(EventBuffer::new()),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        })
    }

    /// 启动前后都可以获取；投递的事件会在下一轮循环被取走。
    pub fn producer(&self) -> Producer {
        Producer::new(Arc::clone(&self.intake))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// 有限时长运行：存储与缓冲区都为空，或时钟越过 `lifetime` 后结束。
    pub fn run(
        &mut self,
        events: Vec<Event>,
        clock: impl Clock + 'static,
        lifetime: SimTime,
        config: EngineConfig,
    ) -> Result<(), EngineError> {
        self.launch(events, Box::new(clock), Some(lifetime), config)
    }

    /// 持续运行直到 `stop`。
    pub fn start(
        &mut self,
        events: Vec<Event>,
        clock: impl Clock + 'static,
        config: EngineConfig,
    ) -> Result<(), EngineError> {
        self.launch(events, Box::new(clock), None, config)
    }

    fn launch(
        &mut self,
        events: Vec<Event>,
        mut clock: Box<dyn Clock>,
        lifetime: Option<SimTime>,
        config: EngineConfig,
    ) -> Result<(), EngineError> {
        config.validate()?;
        let topology = self.topology.take().ok_or(EngineError::AlreadyStarted)?;

        let mut engine = Engine::with_intake(topology, &config, Arc::clone(&self.intake));
        for ev in events {
            engine.schedule(ev);
        }

        self.running.store(true, Ordering::Release);
        let running = Arc::clone(&self.running);
        let handle = thread::Builder::new()
            .name("nsx-engine".into())
            .spawn(move || {
                let report = engine.run(clock.as_mut(), lifetime, &running);
                running.store(false, Ordering::Release);
                (engine, report)
            })
            .map_err(EngineError::Spawn)?;
        self.handle = Some(handle);
        debug!(bounded = lifetime.is_some(), "引擎线程已启动");
        Ok(())
    }

    /// 请求停止，并阻塞到收尾完成。
    pub fn stop(&mut self) -> Result<(Topology, RunReport), EngineError> {
        self.running.store(false, Ordering::Release);
        self.wait()
    }

    /// 阻塞到主循环自行结束（仅对有限时长运行有意义）。
    pub fn wait(&mut self) -> Result<(Topology, RunReport), EngineError> {
        let handle = self.handle.take().ok_or(EngineError::NotStarted)?;
        let (engine, mut report) = handle.join().map_err(|_| EngineError::Panicked)?;
        // 收尾结束后才投递的事件不会再被执行
        let late = self.intake.drain().len() as u64;
        if late > 0 {
            warn!(late, "丢弃引擎停止后投递的事件");
            report.discarded += late;
        }
        Ok((engine.into_topology(), report))
    }
}

impl Drop for Network {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(e) = self.stop() {
                warn!(error = %e, "停止引擎失败");
            }
        }
        let late = self.intake.drain().len();
        if late > 0 {
            warn!(late, "网络已停止，丢弃未执行的投递事件");
        }
    }
}
