use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use simplexwire_peer::Consumer;
use tracing::{info, warn};

use crate::cmd::{parse_endpoint, ConsumeArgs};
use crate::exit::{peer_error, CliError, CliResult, DATA_INVALID, FAILURE, INTERNAL, SUCCESS};
use crate::output::{print_frame, print_summary, OutputFormat, Summary};
use crate::payload::SeededPayloads;

pub fn run(args: ConsumeArgs, format: OutputFormat) -> CliResult<i32> {
    let endpoint = parse_endpoint(&args.address)?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut consumer = Consumer::connect(&endpoint, args.timing.peer_config())
        .map_err(|err| peer_error("connect failed", err))?;
    let shown = endpoint.to_string();

    let mut expected = args
        .verify_seed
        .map(|seed| SeededPayloads::new(seed, args.max_len));
    let mut buf = Vec::new();
    let started = Instant::now();

    while running.load(Ordering::SeqCst) {
        if args.count.is_some_and(|count| consumer.frames_received() >= count) {
            break;
        }

        match consumer.recv_into(&mut buf) {
            Ok(()) => {}
            Err(err) if err.is_end_of_stream() => {
                if let Some(count) = args.count {
                    return Err(CliError::new(
                        FAILURE,
                        format!(
                            "producer closed after {} of {count} frames",
                            consumer.frames_received()
                        ),
                    ));
                }
                break;
            }
            Err(err) => return Err(peer_error("receive failed", err)),
        }

        let index = consumer.frames_received() - 1;
        if let Some(generator) = expected.as_mut() {
            verify(index, generator, &buf)?;
        }
        print_frame(index, &shown, &buf, format);
    }

    if !running.load(Ordering::SeqCst) {
        warn!("interrupted");
    }

    let summary = Summary::new(
        "consume",
        shown,
        consumer.frames_received(),
        consumer.bytes_received(),
        started.elapsed(),
    );
    info!(
        frames = summary.frames,
        bytes = summary.bytes,
        attempts = consumer.attempts(),
        mib_per_sec = summary.mib_per_sec,
        "consumer finished"
    );
    consumer.close();
    print_summary(&summary, format);

    Ok(SUCCESS)
}

fn verify(index: u64, generator: &mut SeededPayloads, got: &[u8]) -> CliResult<()> {
    let Some(want) = generator.next() else {
        return Err(CliError::new(INTERNAL, "payload generator exhausted"));
    };
    if want.as_slice() != got {
        return Err(CliError::new(
            DATA_INVALID,
            format!(
                "frame {index} does not match seeded payload (expected {} bytes, got {})",
                want.len(),
                got.len()
            ),
        ));
    }
    Ok(())
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
