//! Log setup for the command-line tool.
//!
//! Logs go to stderr so that JSON and CUE output on stdout stays clean.
//! `RUST_LOG` overrides the level chosen here.

use tracing_subscriber::EnvFilter;

pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "tracklist=debug,info"
    } else {
        "info"
    }
}

/// Install the global subscriber.  Calling it twice is harmless.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}
