//! fnmeta command-line driver
//!
//! The binary in `main.rs` parses arguments and dispatches to `commands`. Everything it needs
//! lives in this library so the handlers can be exercised from tests.

pub mod commands;
pub mod common;
pub mod errors;

pub use common::GlobalOpts;
pub use fnmeta_config as config_manager;
pub use fnmeta_logger as logger;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the tracing subscriber for library-level events
///
/// `RUST_LOG` wins over the verbosity flags. Safe to call more than once; later calls are
/// ignored.
pub fn init_tracing(opts: &GlobalOpts) {
    let level = logger::verbosity_to_filter();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "fnmeta={0},fnmeta_bindings={0},fnmeta_manifest={0}",
            level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    let result = if opts.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if let Err(e) = result {
        logger::debug(&format!("Tracing already initialized: {}", e));
    }
}
