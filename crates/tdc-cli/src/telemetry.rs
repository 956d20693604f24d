//! Log subscriber setup.
//!
//! Filtering follows `RUST_LOG` (default `warn`). `TDC_LOG_FORMAT=json`
//! switches to JSON events on stderr, with one event per closed span;
//! anything else gives the plain formatter, also on stderr so stdout stays
//! reserved for reports.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var("TDC_LOG_FORMAT").is_ok_and(|v| v == "json");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
