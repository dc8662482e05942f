use apicheck::http::DEFAULT_MAX_RESPONSE_SIZE;
use apicheck::scenario::{self, Config};
use clap::Parser;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Scripted functional check of a session-authenticated messaging API:
/// login, list, post, re-list, and unauthorized-access checks. Exits 0 only
/// when every step passes.
#[derive(Parser, Debug)]
#[clap(version)]
struct Args {
    /// Server hostname
    host: String,

    /// Server port
    port: u16,

    /// Username to log in as
    username: String,

    /// Message to post; multiple words are joined with single spaces
    #[clap(required = true, num_args = 1.., value_name = "MESSAGE")]
    message: Vec<String>,

    /// Cap on the response accumulation buffer, in bytes
    #[clap(long, default_value_t = DEFAULT_MAX_RESPONSE_SIZE)]
    max_response_size: usize,

    /// Per-operation deadline in seconds; 0 waits forever
    #[clap(long, default_value_t = 10)]
    timeout: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config {
        host: args.host,
        port: args.port,
        username: args.username,
        message: args.message.join(" "),
        max_response_size: args.max_response_size,
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
    };

    match scenario::run(&config) {
        Ok(()) => info!("all checks passed"),
        Err(failure) => {
            error!("{failure}");
            std::process::exit(failure.exit_code());
        }
    }
}
