use std::fs;
use std::time::Instant;

use simplexwire_peer::Producer;
use tracing::info;

use crate::cmd::{parse_endpoint, ProduceArgs};
use crate::exit::{io_error, peer_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_summary, OutputFormat, Summary};
use crate::payload::SeededPayloads;

pub fn run(args: ProduceArgs, format: OutputFormat) -> CliResult<i32> {
    let payloads = resolve_payloads(&args)?;
    let endpoint = parse_endpoint(&args.address)?;

    let listener = Producer::listen(&endpoint, args.timing.peer_config())
        .map_err(|err| peer_error("bind failed", err))?;
    let bound = listener.local_endpoint().to_string();
    info!(endpoint = %bound, "waiting for consumer");

    let mut producer = listener
        .accept()
        .map_err(|err| peer_error("accept failed", err))?;

    let started = Instant::now();
    for payload in payloads {
        producer
            .send(&payload)
            .map_err(|err| peer_error("send failed", err))?;
    }
    producer.close();
    let elapsed = started.elapsed();

    let summary = Summary::new(
        "produce",
        bound,
        producer.frames_sent(),
        producer.bytes_sent(),
        elapsed,
    );
    info!(
        frames = summary.frames,
        bytes = summary.bytes,
        mib_per_sec = summary.mib_per_sec,
        "producer finished"
    );
    print_summary(&summary, format);

    Ok(SUCCESS)
}

fn resolve_payloads(args: &ProduceArgs) -> CliResult<Box<dyn Iterator<Item = Vec<u8>>>> {
    if let Some(count) = args.seeded {
        if args.max_len == 0 {
            return Err(CliError::new(USAGE, "--max-len must be at least 1"));
        }
        if args.max_len > args.timing.max_frame_size {
            return Err(CliError::new(
                USAGE,
                format!(
                    "--max-len {} exceeds --max-frame-size {}",
                    args.max_len, args.timing.max_frame_size
                ),
            ));
        }
        return Ok(Box::new(
            SeededPayloads::new(args.seed, args.max_len).take(count),
        ));
    }

    let mut payloads: Vec<Vec<u8>> = args.data.iter().map(|d| d.as_bytes().to_vec()).collect();
    for path in &args.file {
        let contents = fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        payloads.push(contents);
    }

    if payloads.is_empty() {
        return Err(CliError::new(
            USAGE,
            "nothing to send: pass --data, --file or --seeded",
        ));
    }
    Ok(Box::new(payloads.into_iter()))
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cmd::Command;

    #[derive(Parser)]
    struct Harness {
        #[command(subcommand)]
        command: Command,
    }

    fn produce_args(argv: &[&str]) -> ProduceArgs {
        let mut full = vec!["harness", "produce"];
        full.extend_from_slice(argv);
        match Harness::try_parse_from(full).expect("args should parse").command {
            Command::Produce(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn literal_payloads_keep_order() {
        let args = produce_args(&["/tmp/x.sock", "--data", "a", "--data", "bb"]);
        let payloads: Vec<_> = resolve_payloads(&args).unwrap().collect();
        assert_eq!(payloads, vec![b"a".to_vec(), b"bb".to_vec()]);
    }

    #[test]
    fn seeded_payloads_are_counted() {
        let args = produce_args(&["/tmp/x.sock", "--seeded", "7", "--max-len", "32"]);
        assert_eq!(resolve_payloads(&args).unwrap().count(), 7);
    }

    #[test]
    fn empty_payload_set_is_usage_error() {
        let args = produce_args(&["/tmp/x.sock"]);
        let err = resolve_payloads(&args).err().expect("should fail");
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn seeded_max_len_must_fit_frame_limit() {
        let args = produce_args(&[
            "/tmp/x.sock",
            "--seeded",
            "1",
            "--max-len",
            "2048",
            "--max-frame-size",
            "1024",
        ]);
        let err = resolve_payloads(&args).err().expect("should fail");
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn missing_file_is_reported() {
        let args = produce_args(&["/tmp/x.sock", "--file", "/nonexistent/sxw-payload.bin"]);
        assert!(resolve_payloads(&args).is_err());
    }
}
