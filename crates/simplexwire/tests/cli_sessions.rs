#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::Duration;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/sxwcli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn simplexwire() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_simplexwire"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn spawn_producer(sock: &Path, extra: &[&str]) -> Child {
    simplexwire()
        .arg("--format")
        .arg("json")
        .arg("produce")
        .arg(sock)
        .args(["--timeout", "10s"])
        .args(extra)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("produce should start")
}

fn run_consumer(sock: &Path, extra: &[&str]) -> Output {
    simplexwire()
        .arg("--format")
        .arg("json")
        .arg("consume")
        .arg(sock)
        .args(["--timeout", "10s", "--connect-timeout", "10s"])
        .args(extra)
        .output()
        .expect("consume should run")
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line should be JSON"))
        .collect()
}

#[test]
fn seeded_session_verifies_every_frame() {
    let dir = unique_temp_dir("seeded");
    let sock = dir.join("seeded.sock");

    let producer = spawn_producer(&sock, &["--seeded", "25", "--max-len", "4096"]);
    let consumer = run_consumer(
        &sock,
        &["--verify-seed", "413", "--max-len", "4096", "--count", "25"],
    );
    let producer = producer.wait_with_output().expect("producer should exit");

    assert!(
        consumer.status.success(),
        "consumer failed: {}",
        String::from_utf8_lossy(&consumer.stderr)
    );
    assert!(producer.status.success());

    let lines = json_lines(&consumer);
    assert_eq!(lines.len(), 26);
    assert_eq!(lines[0]["index"], 0);
    assert_eq!(lines[24]["index"], 24);
    assert_eq!(lines[25]["role"], "consume");
    assert_eq!(lines[25]["frames"], 25);

    let produced = json_lines(&producer);
    assert_eq!(produced.len(), 1);
    assert_eq!(produced[0]["role"], "produce");
    assert_eq!(produced[0]["frames"], 25);
    assert_eq!(produced[0]["bytes"], lines[25]["bytes"]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn consumer_started_first_retries_until_producer_binds() {
    let dir = unique_temp_dir("early");
    let sock = dir.join("late.sock");

    let consumer = {
        let sock = sock.clone();
        thread::spawn(move || run_consumer(&sock, &[]))
    };

    thread::sleep(Duration::from_millis(300));
    let producer = spawn_producer(&sock, &["--data", "first", "--data", "second"]);

    let consumer = consumer.join().expect("consumer thread");
    let producer = producer.wait_with_output().expect("producer should exit");
    assert!(producer.status.success());
    assert!(consumer.status.success());

    let lines = json_lines(&consumer);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["payload"], "first");
    assert_eq!(lines[1]["payload"], "second");
    assert_eq!(lines[2]["frames"], 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn wrong_seed_exits_data_invalid() {
    let dir = unique_temp_dir("mismatch");
    let sock = dir.join("mismatch.sock");

    let mut producer = spawn_producer(&sock, &["--seeded", "3", "--seed", "1", "--max-len", "64"]);
    let consumer = run_consumer(&sock, &["--verify-seed", "2", "--max-len", "64"]);

    assert_eq!(consumer.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&consumer.stderr);
    assert!(stderr.contains("does not match seeded payload"), "stderr: {stderr}");

    let _ = producer.wait();
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_address_exits_usage() {
    let output = simplexwire()
        .arg("produce")
        .arg("no-port-or-path")
        .arg("--data")
        .arg("x")
        .output()
        .expect("produce should run");

    assert_eq!(output.status.code(), Some(64));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid address"), "stderr: {stderr}");
}

#[test]
fn connect_deadline_exits_timeout() {
    let dir = unique_temp_dir("missing");
    let sock = dir.join("nobody-home.sock");

    let output = simplexwire()
        .arg("consume")
        .arg(&sock)
        .args(["--connect-timeout", "300ms"])
        .output()
        .expect("consume should run");

    assert_eq!(output.status.code(), Some(124));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_package_version() {
    let output = simplexwire()
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("simplexwire {}", env!("CARGO_PKG_VERSION"))
    );
}
