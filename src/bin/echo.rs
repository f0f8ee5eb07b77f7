//! 双工回显仿真
//!
//! endpoint 1 -> restrict 1 -> channel 1 -> endpoint 2
//! endpoint 2 -> restrict 2 -> channel 2 -> endpoint 1
//!
//! 两个端点收到数据包后原样发回，直到达到回显次数上限。

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use nsx_rs::net::{
    Builder, ChannelNode, EndpointNode, Node, NodeId, Packet, RestrictLimits, RestrictNode,
};
use nsx_rs::policy::fixed_delay;
use nsx_rs::sim::{EngineConfig, Event, Network, RealClock, SimTime, StepClock};
use nsx_rs::trace::TransferLog;

#[derive(Debug, Parser)]
#[command(name = "echo", about = "双工回显仿真：两个端点经由限速节点和信道互相回显")]
struct Args {
    /// 发送的消息
    #[arg(long, default_value = "hello world")]
    message: String,
    /// 正向信道延迟（毫秒）
    #[arg(long, default_value_t = 150)]
    delay_ms: u64,
    /// 反向信道延迟（毫秒）
    #[arg(long, default_value_t = 200)]
    back_delay_ms: u64,
    /// 正向限速（bytes/s）
    #[arg(long, default_value_t = 1024.0 * 1024.0)]
    bps: f64,
    /// 正向队列上限（bytes）
    #[arg(long, default_value_t = 4 * 1024 * 1024)]
    queue_bytes: u64,
    /// 反向限速（packets/s）
    #[arg(long, default_value_t = 10.0)]
    pps: f64,
    /// 反向队列上限（packets）
    #[arg(long, default_value_t = 50)]
    queue_packets: u64,
    /// 每个端点最多回显多少次
    #[arg(long, default_value_t = 5)]
    max_echoes: u64,
    /// 步进时钟每次前进多少毫秒
    #[arg(long, default_value_t = 1)]
    step_ms: u64,
    /// 使用真实时钟而不是步进时钟
    #[arg(long)]
    real_time: bool,
    /// 运行时限（毫秒）
    #[arg(long, default_value_t = 30_000)]
    lifetime_ms: u64,
    /// 引擎配置（JSON）
    #[arg(long)]
    config: Option<PathBuf>,
    /// 输出转发记录 JSON
    #[arg(long)]
    trace_json: Option<PathBuf>,
}

fn boxed(node: impl Node) -> Box<dyn Node> {
    Box::new(node)
}

fn echo_reactor(
    label: &'static str,
    max_echoes: u64,
) -> impl FnMut(NodeId, Packet, SimTime) -> Vec<Event> + Send + 'static {
    let mut echoes = 0;
    move |me, pkt, now| {
        println!(
            "{label} receive: {} at {:.3}ms",
            String::from_utf8_lossy(&pkt.payload),
            now.0 as f64 / 1e6
        );
        if echoes >= max_echoes {
            return Vec::new();
        }
        echoes += 1;
        vec![Event::send(me, pkt, now)]
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path).expect("read engine config");
            EngineConfig::from_json(&raw).expect("parse engine config")
        }
        None => EngineConfig::default(),
    };

    let log = TransferLog::new();
    let forward_limits = RestrictLimits::bps(args.bps, args.queue_bytes);
    let restrict1 = RestrictNode::new("restrict 1", forward_limits)
        .expect("restrict 1 limits")
        .with_callback(log.callback());
    let channel1 = ChannelNode::new("channel 1", fixed_delay(SimTime::from_millis(args.delay_ms)))
        .with_callback(log.callback());
    let backward_limits = RestrictLimits::pps(args.pps, args.queue_packets);
    let restrict2 = RestrictNode::new("restrict 2", backward_limits)
        .expect("restrict 2 limits")
        .with_callback(log.callback());
    let channel2 =
        ChannelNode::new("channel 2", fixed_delay(SimTime::from_millis(args.back_delay_ms)))
            .with_callback(log.callback());

    let mut builder = Builder::new();
    builder
        .chain()
        .node(
            EndpointNode::new("endpoint 1")
                .reacting(echo_reactor("endpoint 1", args.max_echoes))
                .with_callback(log.callback()),
        )
        .group_with_name("forward", [boxed(restrict1), boxed(channel1)])
        .node(
            EndpointNode::new("endpoint 2")
                .reacting(echo_reactor("endpoint 2", args.max_echoes))
                .with_callback(log.callback()),
        );
    builder
        .chain()
        .node_by_name("endpoint 2")
        .group_with_name("backward", [boxed(restrict2), boxed(channel2)])
        .node_by_name("endpoint 1");

    let (topo, names) = builder.build().expect("build topology");
    let endpoint1 = names["endpoint 1"];
    let mut network = Network::new(topo).expect("check topology");

    let payload = args.message.clone().into_bytes();
    let first = Event::send(endpoint1, Packet::new(0, payload), SimTime::ZERO);
    let lifetime = SimTime::from_millis(args.lifetime_ms);
    if args.real_time {
        network
            .run(vec![first], RealClock::starting_at(SimTime::ZERO), lifetime, config)
            .expect("start network");
    } else {
        let clock = StepClock::new(SimTime::ZERO, SimTime::from_millis(args.step_ms));
        network
            .run(vec![first], clock, lifetime, config)
            .expect("start network");
    }
    let (_topo, report) = network.wait().expect("wait network");

    if let Some(path) = &args.trace_json {
        let json = log.to_json_pretty().expect("serialize transfer log");
        fs::write(path, json).expect("write trace json");
    }

    println!(
        "done @ {:?}, fired={}, discarded={}, records={}",
        report.finished_at,
        report.fired,
        report.discarded,
        log.len()
    );
}
