use std::io;

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `-v`.
///
/// Logs go to stderr so console output on stdout stays clean.
pub fn init_logging(verbose: u8, json: bool) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);

    let result = if json || json_from_env() {
        builder.json().try_init()
    } else {
        builder.with_ansi(atty::is(atty::Stream::Stderr)).try_init()
    };

    if let Err(e) = result {
        eprintln!("logging already initialized: {e}");
    }
}

fn json_from_env() -> bool {
    std::env::var("EDE_LOG_JSON").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}
