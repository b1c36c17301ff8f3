// Application state module
// Everything a request handler needs, built once at startup

use super::types::Config;
use crate::target::ServeTarget;

/// Application state shared by all connections
///
/// Read-only after startup, so it is handed out as `Arc<AppState>` without locks.
pub struct AppState {
    pub config: Config,
    pub target: ServeTarget,
}

impl AppState {
    pub const fn new(config: Config, target: ServeTarget) -> Self {
        Self { config, target }
    }

    /// Default config serving `path`, isolated from the process environment
    #[cfg(test)]
    pub fn for_tests(path: &std::path::Path) -> Self {
        let config = Config::build(&super::Overrides::default(), None, Some(config::Map::new()))
            .expect("default config");
        let target = ServeTarget::resolve(path).expect("test target has an extension");
        Self::new(config, target)
    }
}
