//! Tracing subscriber setup.

use crate::error::{BookgraphError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Build the filter used by [`init_logging`].
///
/// `RUST_LOG` wins when set; otherwise bookgraph crates log at `level` and
/// everything else at `warn`.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "bookgraph_core={level},bookgraph_storage={level},warn"
        ))
    })
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .map_err(|e| BookgraphError::internal(format!("Failed to install subscriber: {}", e)))
}

/// Install a JSON-formatting subscriber, for log shipping.
pub fn init_json_logging(level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .map_err(|e| BookgraphError::internal(format!("Failed to install subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let _ = init_logging("debug");
        assert!(init_logging("debug").is_err());
    }
}
