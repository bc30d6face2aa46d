//! Tracing subscriber setup for host applications.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "lab_east_core=info";

/// Install a formatting subscriber with the given `EnvFilter` directives.
///
/// An unparsable filter falls back to `lab_east_core=info`. Returns `false`
/// if a global subscriber was already installed.
#[uniffi::export]
pub fn init_logging(filter: String) -> bool {
    let filter = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
