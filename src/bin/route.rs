//! 按目的地分发的路由仿真
//!
//! ```text
//!                  +-> route 1 (200ms) -> server 1
//! client -> scatter
//!                  +-> route 2 (300ms) -> server 2
//! ```
//!
//! 客户端先后向两台服务器各发送一个数据包，分发节点按目的地查表选路。

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use nsx_rs::net::{Builder, ChannelNode, EndpointNode, NodeId, Packet, ScatterNode};
use nsx_rs::policy::fixed_delay;
use nsx_rs::sim::{EngineConfig, Event, Network, SimTime, StepClock};
use nsx_rs::trace::TransferLog;

#[derive(Debug, Parser)]
#[command(name = "route", about = "按目的地分发的路由仿真")]
struct Args {
    /// route 1 的延迟（毫秒）
    #[arg(long, default_value_t = 200)]
    route1_ms: u64,
    /// route 2 的延迟（毫秒）
    #[arg(long, default_value_t = 300)]
    route2_ms: u64,
    /// 步进时钟每次前进多少毫秒
    #[arg(long, default_value_t = 1)]
    step_ms: u64,
    /// 运行时限（毫秒）
    #[arg(long, default_value_t = 10_000)]
    lifetime_ms: u64,
    /// 引擎配置（JSON）
    #[arg(long)]
    config: Option<PathBuf>,
    /// 输出转发记录 JSON
    #[arg(long)]
    trace_json: Option<PathBuf>,
}

fn printer(
    label: &'static str,
) -> impl FnMut(NodeId, Packet, SimTime) -> Vec<Event> + Send + 'static {
    move |_me, pkt, now| {
        println!(
            "{label} receive: {} at {:.3}ms",
            String::from_utf8_lossy(&pkt.payload),
            now.0 as f64 / 1e6
        );
        Vec::new()
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

    let mut builder = Builder::new();
    builder
        .chain()
        .node(EndpointNode::new("client").with_callback(log.callback()))
        .node(ScatterNode::by_destination("scatter").with_callback(log.callback()))
        .node(
            ChannelNode::new("route 1", fixed_delay(SimTime::from_millis(args.route1_ms)))
                .with_callback(log.callback()),
        )
        .node(
            EndpointNode::new("server 1")
                .reacting(printer("server 1"))
                .with_callback(log.callback()),
        );
    builder
        .chain()
        .node_by_name("scatter")
        .node(
            ChannelNode::new("route 2", fixed_delay(SimTime::from_millis(args.route2_ms)))
                .with_callback(log.callback()),
        )
        .node(
            EndpointNode::new("server 2")
                .reacting(printer("server 2"))
                .with_callback(log.callback()),
        );

    let (mut topo, names) = builder.build().expect("build topology");
    let client = names["client"];
    let server1 = names["server 1"];
    let server2 = names["server 2"];

    // 目的服务器 -> 通往它的信道
    let table: HashMap<NodeId, NodeId> =
        HashMap::from([(server1, names["route 1"]), (server2, names["route 2"])]);
    topo.node_mut::<ScatterNode>(names["scatter"])
        .expect("scatter node")
        .set_selector(Box::new(move |pkt: &Packet, _cands: &[NodeId]| {
            pkt.dst.and_then(|dst| table.get(&dst).copied())
        }));

    let events = vec![
        Event::send(
            client,
            Packet::new(1, &b"to server 1"[..]).with_dst(server1),
            SimTime::from_secs(1),
        ),
        Event::send(
            client,
            Packet::new(2, &b"to server 2"[..]).with_dst(server2),
            SimTime::from_secs(2),
        ),
    ];

    let mut network = Network::new(topo).expect("check topology");
    let clock = StepClock::new(SimTime::ZERO, SimTime::from_millis(args.step_ms));
    let lifetime = SimTime::from_millis(args.lifetime_ms);
    network
        .run(events, clock, lifetime, config)
        .expect("start network");
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
