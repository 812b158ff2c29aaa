use std::io::{IsTerminal, Write};
use std::time::Duration;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    index: u64,
    endpoint: &'a str,
    payload_size: usize,
    payload: String,
}

pub fn print_frame(index: u64, endpoint: &str, payload: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                index,
                endpoint,
                payload_size: payload.len(),
                payload: payload_preview(payload),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "SIZE", "ENDPOINT", "PAYLOAD"])
                .add_row(vec![
                    index.to_string(),
                    payload.len().to_string(),
                    endpoint.to_string(),
                    payload_preview(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "frame={} size={} endpoint={} payload={}",
                index,
                payload.len(),
                endpoint,
                payload_preview(payload)
            );
        }
        OutputFormat::Raw => print_raw(payload),
    }
}

/// Totals for one session, printed when `produce` or `consume` finishes.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub role: &'static str,
    pub endpoint: String,
    pub frames: u64,
    pub bytes: u64,
    pub elapsed_ms: u64,
    pub mib_per_sec: f64,
}

impl Summary {
    pub fn new(
        role: &'static str,
        endpoint: String,
        frames: u64,
        bytes: u64,
        elapsed: Duration,
    ) -> Self {
        Self {
            role,
            endpoint,
            frames,
            bytes,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            mib_per_sec: throughput_mib(bytes, elapsed),
        }
    }
}

pub fn print_summary(summary: &Summary, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(summary).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ROLE", "ENDPOINT", "FRAMES", "BYTES", "ELAPSED", "MiB/s"])
                .add_row(vec![
                    summary.role.to_string(),
                    summary.endpoint.clone(),
                    summary.frames.to_string(),
                    summary.bytes.to_string(),
                    format!("{}ms", summary.elapsed_ms),
                    format!("{:.2}", summary.mib_per_sec),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} {}: {} frames, {} bytes in {}ms ({:.2} MiB/s)",
                summary.role,
                summary.endpoint,
                summary.frames,
                summary.bytes,
                summary.elapsed_ms,
                summary.mib_per_sec
            );
        }
        // Raw stdout carries payload bytes only.
        OutputFormat::Raw => {}
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn throughput_mib(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    bytes as f64 / (1024.0 * 1024.0) / secs
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throughput_handles_zero_elapsed() {
        assert_eq!(throughput_mib(1024, Duration::ZERO), 0.0);
        let rate = throughput_mib(2 * 1024 * 1024, Duration::from_secs(2));
        assert!((rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_serializes_as_flat_json() {
        let summary = Summary::new(
            "consume",
            "unix:/tmp/x.sock".to_string(),
            3,
            262_645,
            Duration::from_millis(10),
        );
        let value = serde_json::to_value(&summary).expect("summary should serialize");
        assert_eq!(value["role"], "consume");
        assert_eq!(value["frames"], 3);
        assert_eq!(value["bytes"], 262_645);
        assert_eq!(value["elapsed_ms"], 10);
    }

    #[test]
    fn preview_marks_binary_payloads() {
        assert_eq!(payload_preview(b"hello"), "hello");
        assert_eq!(payload_preview(&[0xff, 0xfe]), "<binary 2 bytes>");
    }
}
