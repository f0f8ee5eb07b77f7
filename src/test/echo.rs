use crate::net::{Builder, ChannelNode, EndpointNode, Packet, RestrictLimits, RestrictNode};
use crate::policy::fixed_delay;
use crate::sim::{EngineConfig, Event, Network, SimTime, StepClock};
use crate::trace::{TransferLog, TransferOutcome};
use std::sync::{Arc, Mutex};

type Seen = Arc<Mutex<Vec<(&'static str, SimTime)>>>;

fn echoing(name: &'static str, seen: &Seen, echoes: usize) -> EndpointNode {
    let seen = Arc::clone(seen);
    let mut left = echoes;
    EndpointNode::new(name).reacting(move |me, pkt, now| {
        seen.lock().expect("seen lock").push((name, now));
        if left == 0 {
            return Vec::new();
        }
        left -= 1;
        vec![Event::send(me, pkt, now)]
    })
}

#[test]
fn duplex_echo_through_two_channels() {
    let seen = Seen::default();
    let t0 = SimTime::from_secs(1);

    let mut b = Builder::new();
    b.chain()
        .node(echoing("a", &seen, 0))
        .node(ChannelNode::new("there", fixed_delay(SimTime::from_millis(150))))
        .node(echoing("b", &seen, 1));
    b.chain()
        .node_by_name("b")
        .node(ChannelNode::new("back", fixed_delay(SimTime::from_millis(150))))
        .node_by_name("a");
    let (topo, names) = b.build().expect("build");

    let mut net = Network::new(topo).expect("network");
    net.run(
        vec![Event::send(names["a"], Packet::new(0, &b"hello world"[..]), t0)],
        StepClock::new(SimTime::ZERO, SimTime::from_millis(1)),
        SimTime::from_secs(30),
        EngineConfig::default(),
    )
    .expect("run");
    let (_topo, report) = net.wait().expect("wait");

    assert_eq!(
        *seen.lock().expect("seen lock"),
        vec![
            ("b", t0.saturating_add(SimTime::from_millis(150))),
            ("a", t0.saturating_add(SimTime::from_millis(300))),
        ]
    );
    assert_eq!(report.discarded, 0);
    assert!(report.finished_at < SimTime::from_secs(2));
}

#[test]
fn echo_through_rate_limited_links_records_every_hop() {
    let seen = Seen::default();
    let log = TransferLog::new();

    let mut b = Builder::new();
    b.chain()
        .node(
            RestrictNode::new("r1", RestrictLimits::pps(10.0, 50))
                .expect("limits")
                .with_callback(log.callback()),
        )
        .node(
            ChannelNode::new("c1", fixed_delay(SimTime::from_millis(150)))
                .with_callback(log.callback()),
        );
    b.chain()
        .node(
            RestrictNode::new("r2", RestrictLimits::bps(1_000.0, 4_000))
                .expect("limits")
                .with_callback(log.callback()),
        )
        .node(
            ChannelNode::new("c2", fixed_delay(SimTime::from_millis(200)))
                .with_callback(log.callback()),
        );
    b.chain()
        .node(echoing("e1", &seen, 0))
        .nodes_by_name(&["r1", "c1"])
        .node(echoing("e2", &seen, 1))
        .nodes_by_name(&["r2", "c2"])
        .node_by_name("e1");
    let (topo, names) = b.build().expect("build");

    let mut net = Network::new(topo).expect("network");
    // 100 字节：r1 服务 100ms，r2 服务 100ms
    net.run(
        vec![Event::send(names["e1"], Packet::sized(1, 100), SimTime::ZERO)],
        StepClock::new(SimTime::ZERO, SimTime::from_millis(1)),
        SimTime::from_secs(30),
        EngineConfig::default(),
    )
    .expect("run");
    net.wait().expect("wait");

    assert_eq!(
        *seen.lock().expect("seen lock"),
        vec![
            ("e2", SimTime::from_millis(250)),
            ("e1", SimTime::from_millis(550)),
        ]
    );
    let hops: Vec<(String, TransferOutcome)> = log
        .records()
        .into_iter()
        .map(|r| (r.node, r.outcome))
        .collect();
    assert_eq!(
        hops,
        vec![
            ("r1".to_string(), TransferOutcome::Forwarded),
            ("c1".to_string(), TransferOutcome::Forwarded),
            ("r2".to_string(), TransferOutcome::Forwarded),
            ("c2".to_string(), TransferOutcome::Forwarded),
        ]
    );
}
