//! Tracing setup for the server binary.
//!
//!   RUST_LOG=mb_core=debug msgboard    # Fine-grained log control
//!   MSGBOARD__LOG__FORMAT=json         # One JSON object per event

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::settings::{LogFormat, LogSettings};

/// Installs the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init(settings: &LogSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match settings.format {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Pretty => builder.compact().try_init(),
    }
    .map_err(|err| anyhow!(err))
}
