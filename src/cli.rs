use clap::Parser;
use std::path::PathBuf;

use crate::config::Overrides;

/// Mockone creates a single endpoint http server which serves a variety of
/// files and types.
///
/// Settings come from built-in defaults, then ~/.mockone.{toml,json,yaml,...}
/// (or --config), then MOCKONE_<SECTION>__<KEY> environment variables, then
/// the flags below.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "mockone",
    author,
    version,
    about = "Single endpoint server for multiple file and response types"
)]
pub struct Args {
    /// File returned on every GET /
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Port to serve application on [default: 8091]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind [default: 0.0.0.0]
    #[arg(long)]
    pub host: Option<String>,

    /// Config file to use instead of ~/.mockone.*
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            config_file: self.config.clone(),
            host: self.host.clone(),
            port: self.port,
        }
    }
}
