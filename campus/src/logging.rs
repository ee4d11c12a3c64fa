//! Tracing setup.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "campus=info";

/// Install the global subscriber. Output goes to stderr so command output
/// on stdout stays clean. `verbose` raises the default level to debug;
/// `RUST_LOG` wins over both.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose { "campus=debug" } else { DEFAULT_FILTER };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
