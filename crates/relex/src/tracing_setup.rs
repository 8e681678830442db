//! Subscriber setup for the binary.

use std::sync::Once;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_tree::HierarchicalLayer;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "RELEX_LOG";

static TRACING_INIT: Once = Once::new();

/// Install a hierarchical stderr subscriber when `RELEX_LOG` is set.
///
/// Without the variable nothing is installed and tracing stays disabled.
/// Only the first call has any effect.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = match EnvFilter::try_from_env(LOG_ENV) {
            Ok(filter) => filter,
            Err(error) => {
                if std::env::var_os(LOG_ENV).is_some() {
                    eprintln!("warning: ignoring invalid {LOG_ENV}: {error}");
                }
                return;
            }
        };
        let layer = HierarchicalLayer::new(2)
            .with_targets(true)
            .with_bracketed_fields(true)
            .with_writer(std::io::stderr);
        tracing_subscriber::registry()
            .with(filter)
            .with(layer)
            .init();
    });
}
