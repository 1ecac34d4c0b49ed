//! Logging setup (spec §7 ambient logging convention): one `tracing-subscriber` `fmt` layer
//! with an `EnvFilter`, writing to stderr so stdout stays free for query output (§6).

use tracing_subscriber::EnvFilter;

/// `-v`/`--quiet` CLI verbosity, before `RUST_LOG` is allowed to override it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose(u8),
}

impl Verbosity {
    fn default_filter(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "info",
            Verbosity::Verbose(1) => "debug",
            Verbosity::Verbose(_) => "trace",
        }
    }
}

/// Install the global subscriber. `RUST_LOG`, when set, takes precedence over `verbosity`,
/// matching the `-v`/`--quiet` vs. environment precedence this ecosystem's server binaries
/// use elsewhere.
pub fn init(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
