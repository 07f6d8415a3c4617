use tracing_subscriber::EnvFilter;

use crate::error::{Result, ToolError};

const DEFAULT_LOG_FILTER: &str = "export_docs=info";
const VERBOSE_LOG_FILTER: &str = "export_docs=debug";

/// Installs the stderr subscriber. `RUST_LOG` takes precedence over the
/// default filter.
pub fn init(verbose: bool) -> Result<()> {
    let default = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| ToolError::Logging(err.to_string()))
}
