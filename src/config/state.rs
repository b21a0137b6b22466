// Application state module
// Holds configuration and the shared provider client handle

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use super::types::Config;
use crate::provider::TextGenerator;

/// Application state
///
/// Built once at startup and shared read-only across all in-flight
/// requests. The provider client is an explicit dependency so handlers
/// never reach for ambient singletons.
pub struct AppState {
    pub config: Config,
    pub generator: Arc<dyn TextGenerator>,

    // Cached config value for fast access without locks
    pub cached_access_log: AtomicBool,
}

impl AppState {
    /// Create `AppState` from loaded config and a provider client
    pub fn new(config: Config, generator: Arc<dyn TextGenerator>) -> Self {
        let cached_access_log = AtomicBool::new(config.logging.access_log);
        Self {
            config,
            generator,
            cached_access_log,
        }
    }
}
