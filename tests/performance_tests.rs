use assert_cmd::cargo_bin;
use std::process::Command;

mod common;

const ORDERS: usize = 200_000;
const MERCHANTS: usize = 50;

#[test]
fn test_large_batch() {
    let dir = tempfile::tempdir().unwrap();
    let orders = dir.path().join("orders.csv");
    let merchants = dir.path().join("merchants.csv");
    common::generate_orders(&orders, ORDERS, MERCHANTS).expect("Failed to generate orders");
    common::generate_merchants(&merchants, MERCHANTS).expect("Failed to generate merchants");

    let output = Command::new(cargo_bin!("disburser"))
        .arg(&orders)
        .arg(&merchants)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "Binary failed to process large batch");

    // Header plus one row per order.
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), ORDERS + 1);
}

#[test]
fn test_large_batch_parallel() {
    let dir = tempfile::tempdir().unwrap();
    let orders = dir.path().join("orders.csv");
    let merchants = dir.path().join("merchants.csv");
    common::generate_orders(&orders, ORDERS, MERCHANTS).expect("Failed to generate orders");
    common::generate_merchants(&merchants, MERCHANTS).expect("Failed to generate merchants");

    let summary = |parallel: bool| {
        let mut cmd = Command::new(cargo_bin!("disburser"));
        cmd.arg(&orders).arg(&merchants).arg("--summary");
        if parallel {
            cmd.arg("--parallel");
        }
        let output = cmd.output().expect("Failed to execute command");
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    };

    assert_eq!(summary(false), summary(true));
}
