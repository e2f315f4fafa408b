//! Logging setup for the moodchat binary
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and either
//! a human-readable or a JSON formatter. Logs go to stderr so they never
//! interleave with a reply being printed on stdout.
//!
//! `RUST_LOG` wins over the `--verbose` flag when set.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for the given verbosity.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "moodchat=debug"
    } else {
        "moodchat=info"
    }
}

/// Initialize the global subscriber.
///
/// # Errors
///
/// Returns an error if the default directive does not parse or a global
/// subscriber was already installed.
pub fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        let layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr);
        registry.with(layer).try_init()?;
    } else {
        let layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr);
        registry.with(layer).try_init()?;
    }

    Ok(())
}
