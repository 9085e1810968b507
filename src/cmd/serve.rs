//! HTTP service commands — `blogsmith serve` and `blogsmith init-db`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use blogsmith::config::AppConfig;
use blogsmith::server::db::BlogDb;
use blogsmith::server::server::{ServerConfig, start_server};

pub async fn cmd_serve(port: u16, db_path: Option<PathBuf>, dev: bool) -> Result<()> {
    let mut config = AppConfig::from_env().context("Failed to load configuration")?;
    if let Some(path) = db_path {
        config.database_path = path;
    }

    start_server(config, ServerConfig { port, dev_mode: dev }).await
}

/// Create the database and run migrations, then exit.
pub fn cmd_init_db(db_path: Option<PathBuf>) -> Result<()> {
    let path = db_path.unwrap_or_else(|| PathBuf::from(".blogsmith/blogsmith.db"));
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    BlogDb::new(&path).context("Failed to initialize database")?;
    println!("Database initialized at {}", path.display());
    Ok(())
}
