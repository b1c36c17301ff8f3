// Configuration module entry point
// Layers defaults, an optional config file, environment variables and CLI flags

mod state;
mod types;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub use state::AppState;
pub use types::{Config, LoggingConfig};

/// Base name of the config file discovered in the home directory
pub const CONFIG_FILE_NAME: &str = ".mockone";

/// Prefix for environment overrides, e.g. `MOCKONE_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "MOCKONE";

/// Extensions probed when looking for `~/.mockone.<ext>`
const CONFIG_EXTENSIONS: &[&str] = &["toml", "json", "yaml", "yml", "ini", "ron", "json5"];

/// Values taken from the command line; they win over every other source
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Result of loading: the effective config and the file it was read from
#[derive(Debug)]
pub struct Loaded {
    pub config: Config,
    pub config_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the process environment and the user's home directory
    pub fn load(overrides: &Overrides) -> Result<Loaded, config::ConfigError> {
        let config_file = match &overrides.config_file {
            Some(path) => Some(path.clone()),
            None => home_dir().and_then(|home| discover_config_file(&home)),
        };
        let config = Self::build(overrides, config_file.as_deref(), None)?;
        Ok(Loaded {
            config,
            config_file,
        })
    }

    /// Build configuration from explicit sources
    ///
    /// `env` replaces the process environment when given.
    pub fn build(
        overrides: &Overrides,
        config_file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8091)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("logging.dump_requests", true)?
            .set_default("logging.max_dump_body", 65_536)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("http.server_name", "mockone")?;

        if let Some(path) = config_file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .set_override_option("server.host", overrides.host.clone())?
            .set_override_option("server.port", overrides.port.map(i64::from))?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

/// Find `.mockone.<ext>` in `dir`, probing the supported formats in order
pub fn discover_config_file(dir: &Path) -> Option<PathBuf> {
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{CONFIG_FILE_NAME}.{ext}")))
        .find(|path| path.is_file())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}
