use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use simplexwire_frame::DEFAULT_MAX_FRAME_SIZE;
use simplexwire_peer::{Endpoint, PeerConfig};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;
use crate::payload::DEFAULT_MAX_LEN;

pub mod consume;
pub mod produce;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bind, accept one consumer and send frames to it.
    Produce(ProduceArgs),
    /// Connect to a producer and print the frames it sends.
    Consume(ConsumeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Produce(args) => produce::run(args, format),
        Command::Consume(args) => consume::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Timing and size limits shared by `produce` and `consume`.
#[derive(Args, Debug)]
pub struct TimingArgs {
    /// Per-operation timeout (e.g. 5s, 500ms). 0 waits forever.
    #[arg(long, env = "SIMPLEXWIRE_TIMEOUT", default_value = "60s", value_parser = parse_duration)]
    pub timeout: Duration,
    /// Overall time the consumer keeps retrying its connect. 0 retries forever.
    #[arg(
        long,
        env = "SIMPLEXWIRE_CONNECT_TIMEOUT",
        default_value = "60s",
        value_parser = parse_duration
    )]
    pub connect_timeout: Duration,
    /// Largest payload accepted or sent, in bytes.
    #[arg(long, env = "SIMPLEXWIRE_MAX_FRAME_SIZE", default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: usize,
}

impl TimingArgs {
    pub fn peer_config(&self) -> PeerConfig {
        PeerConfig::default()
            .with_timeout(self.timeout)
            .with_connect_timeout(self.connect_timeout)
            .with_max_frame_size(self.max_frame_size)
    }
}

#[derive(Args, Debug)]
pub struct ProduceArgs {
    /// Address to bind (tcp://host:port, host:port, unix:/path or a socket path).
    pub address: String,
    /// Literal payload; repeat to send several frames.
    #[arg(long, conflicts_with = "seeded")]
    pub data: Vec<String>,
    /// Send the contents of a file as one frame; repeatable.
    #[arg(long, conflicts_with = "seeded")]
    pub file: Vec<PathBuf>,
    /// Send COUNT pseudo-random payloads.
    #[arg(long, value_name = "COUNT")]
    pub seeded: Option<usize>,
    /// Seed for --seeded payloads.
    #[arg(long, default_value_t = 413, requires = "seeded")]
    pub seed: u64,
    /// Largest --seeded payload length in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_LEN, requires = "seeded")]
    pub max_len: usize,
    #[command(flatten)]
    pub timing: TimingArgs,
}

#[derive(Args, Debug)]
pub struct ConsumeArgs {
    /// Address to connect to.
    pub address: String,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<u64>,
    /// Check every payload against the --seeded stream produced with SEED.
    #[arg(long, value_name = "SEED")]
    pub verify_seed: Option<u64>,
    /// Largest payload length used by the producer's --seeded stream.
    #[arg(long, default_value_t = DEFAULT_MAX_LEN, requires = "verify_seed")]
    pub max_len: usize,
    #[command(flatten)]
    pub timing: TimingArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_endpoint(address: &str) -> CliResult<Endpoint> {
    address
        .parse()
        .map_err(|err| CliError::new(USAGE, format!("invalid address: {err}")))
}

/// Accepts `500ms`, `5s` or bare seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration value: {input}"))?;

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}
