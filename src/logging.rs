//! Tracing setup for binaries and tests that embed the engine.

use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_FILTER: &str = "info,failer_engine=debug";

/// Initialize logging to stderr, honoring `RUST_LOG` when set.
/// Safe to call more than once; later calls are ignored.
pub fn init_logging_stderr() {
    init_logging(DEFAULT_FILTER);
}

pub fn init_logging(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

/// Keep scheme and host only so session ids and paths stay out of logs.
pub(crate) fn redact_url_for_log(value: &str) -> String {
    match Url::parse(value) {
        Ok(uri) => {
            let scheme = uri.scheme();
            let authority = uri.host_str().unwrap_or("unknown-host");
            format!("{scheme}://{authority}/...")
        }
        Err(_) => "[invalid-url]".to_string(),
    }
}
