//! Log output for the CLI and the watcher.
//!
//! Everything goes to stderr so command output on stdout stays parseable
//! (`tagmire list --json | jq`). Lines carry a wall-clock time, the level,
//! and the emitting module:
//!
//! ```text
//! 14:02:11.384  INFO tagmire::watcher::annotation_watcher: [watcher] modified: src/lib.rs (1 reanchored, 0 not found)
//! ```
//!
//! Levels come from the `[logging]` table of `.tagmire/settings.toml`.
//! Module keys may be written without the crate prefix:
//!
//! ```toml
//! [logging]
//! default = "warn"
//!
//! [logging.modules]
//! tracking = "debug"   # every reanchor candidate and its score
//! notify = "info"      # other crates keep their own name
//! ```
//!
//! A set `RUST_LOG` replaces the table entirely, e.g.
//! `RUST_LOG=tagmire::watcher=trace tagmire watch`.

use std::sync::Once;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// `HH:MM:SS.mmm` in local time.
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = match std::env::var("RUST_LOG") {
            Ok(_) => EnvFilter::from_default_env(),
            Err(_) => EnvFilter::new(filter_directives(config)),
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(CompactTime)
            .with_target(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(layer).init();
    });
}

/// `EnvFilter` directives for the configured levels, default first.
fn filter_directives(config: &LoggingConfig) -> String {
    let mut directives = vec![config.default.clone()];
    directives.extend(
        config
            .modules
            .iter()
            .map(|(module, level)| format!("{}={level}", qualify_target(module))),
    );
    directives.join(",")
}

/// Bare module names like `watcher` refer to this crate's modules.
fn qualify_target(module: &str) -> String {
    let krate = env!("CARGO_CRATE_NAME");
    if module == krate || module.contains("::") || !is_own_module(module) {
        module.to_string()
    } else {
        format!("{krate}::{module}")
    }
}

fn is_own_module(module: &str) -> bool {
    matches!(
        module,
        "cli" | "config" | "document" | "logging" | "notifications" | "storage" | "tracking"
            | "types" | "utils" | "watcher"
    )
}

/// Info-level line tagged with the component that produced it.
///
/// ```ignore
/// log_event!("watcher", "store reloaded", "{}", path.display());
/// ```
#[macro_export]
macro_rules! log_event {
    ($component:expr, $what:expr) => {
        tracing::info!("[{}] {}", $component, $what)
    };
    ($component:expr, $what:expr, $($detail:tt)+) => {
        tracing::info!("[{}] {}: {}", $component, $what, format!($($detail)+))
    };
}

/// Same as [`log_event!`] at debug level.
#[macro_export]
macro_rules! debug_event {
    ($component:expr, $what:expr) => {
        tracing::debug!("[{}] {}", $component, $what)
    };
    ($component:expr, $what:expr, $($detail:tt)+) => {
        tracing::debug!("[{}] {}: {}", $component, $what, format!($($detail)+))
    };
}
