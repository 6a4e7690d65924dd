use std::path::PathBuf;

use crate::error::Result;
pub use clap::Parser;

#[derive(Debug, Clone, clap::Parser)]
#[command(version, about = "Movie catalog server")]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 3000,
        env = "CINELOG_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "CINELOG_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        long,
        env = "CINELOG_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/cinelog.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "CINELOG_DATA_DIR",
        help = "Data directory (database), default is system default like ~/.local/share/cinelog",
        default_value_t = default_data_dir()
    )]
    data_dir: String,

    #[arg(long, env = "CINELOG_CORS", help = "Enable permissive CORS")]
    pub cors: bool,
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("cinelog"))
        .unwrap_or_else(|| PathBuf::from("cinelog"))
        .to_string_lossy()
        .to_string()
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/cinelog.db", self.data_dir))
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.listen_address, self.port)
    }
}
