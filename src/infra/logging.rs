//! Tracing subscriber setup.

use crate::infra::config::Environment;
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber. `RUST_LOG` wins when set; otherwise
/// development logs every executed statement (debug) and other environments
/// stay at info. Calling it twice is harmless.
pub fn init(environment: Environment) {
    let default_directive = match environment {
        Environment::Development => "phone_catalog=debug,api_server=debug,info",
        Environment::Production | Environment::Test => "info",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
