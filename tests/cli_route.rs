use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "nsx-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn arrival(arr: &[Value], node: &str) -> Option<u64> {
    arr.iter()
        .find(|r| {
            r.get("node").and_then(|n| n.as_str()) == Some(node)
                && r.get("outcome").and_then(|o| o.as_str()) == Some("received")
        })
        .and_then(|r| r["t_ns"].as_u64())
}

#[test]
fn route_delivers_each_packet_over_its_own_path() {
    let dir = unique_temp_dir("route");
    let out_json = dir.join("trace.json");

    let output = Command::new(env!("CARGO_BIN_EXE_route"))
        .args(["--trace-json", out_json.to_str().unwrap()])
        .output()
        .expect("run route");
    assert!(
        output.status.success(),
        "route failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("server 1 receive: to server 1 at 1200.000ms"));
    assert!(stdout.contains("server 2 receive: to server 2 at 2300.000ms"));

    let raw = fs::read_to_string(&out_json).expect("read trace.json");
    let v: Value = serde_json::from_str(&raw).expect("parse trace.json");
    let arr = v.as_array().expect("trace.json must be a JSON array");

    assert_eq!(arrival(arr, "server 1"), Some(1_200_000_000));
    assert_eq!(arrival(arr, "server 2"), Some(2_300_000_000));

    let via_route2: Vec<u64> = arr
        .iter()
        .filter(|r| r.get("node").and_then(|n| n.as_str()) == Some("route 2"))
        .filter_map(|r| r["pkt_id"].as_u64())
        .collect();
    assert_eq!(via_route2, vec![2]);
    assert!(
        arr.iter()
            .all(|r| r.get("outcome").and_then(|o| o.as_str()) != Some("unrouted"))
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn route_honours_custom_path_delays() {
    let dir = unique_temp_dir("route-delays");
    let out_json = dir.join("trace.json");

    let output = Command::new(env!("CARGO_BIN_EXE_route"))
        .args([
            "--route1-ms",
            "50",
            "--route2-ms",
            "10",
            "--trace-json",
            out_json.to_str().unwrap(),
        ])
        .output()
        .expect("run route");
    assert!(output.status.success());

    let raw = fs::read_to_string(&out_json).expect("read trace.json");
    let v: Value = serde_json::from_str(&raw).expect("parse trace.json");
    let arr = v.as_array().expect("trace.json must be a JSON array");
    assert_eq!(arrival(arr, "server 1"), Some(1_050_000_000));
    assert_eq!(arrival(arr, "server 2"), Some(2_010_000_000));

    let _ = fs::remove_dir_all(&dir);
}
