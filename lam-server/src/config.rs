use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Runtime settings; every flag can also come from the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "lam-server", version)]
#[command(about = "REST API for the LAM clear-run leaderboard")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Interface to bind
    #[arg(long, env = "LAM_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Leaderboard JSON document
    #[arg(long, env = "LAM_DB_PATH", default_value = "database/rankings.json")]
    pub db_path: PathBuf,

    /// Serve the front-end from this directory as well
    #[arg(long, env = "LAM_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// # Errors
    ///
    /// Returns an error if `host` and `port` do not form a socket address.
    pub fn address(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}
