use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::{self, AppConfig, StorageBackend};
use crate::database::{DatabaseManager, MemoryStore, PgStore, Store};
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "recipe-api")]
#[command(about = "Recipe API - per-user tags, ingredients and recipes")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "YAML config file; environment variables still override it")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Port to bind (overrides config)")]
        port: Option<u16>,

        #[arg(long, help = "Use the in-memory store instead of Postgres")]
        memory: bool,
    },

    #[command(about = "Create the Postgres schema if it does not exist")]
    Migrate,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match cli.config {
        Some(ref path) => AppConfig::from_file(path)?,
        None => config::config().clone(),
    };

    match cli.command {
        Commands::Serve { port, memory } => serve(config, port, memory).await,
        Commands::Migrate => migrate(config).await,
    }
}

async fn serve(mut config: AppConfig, port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    if memory {
        config.database.backend = StorageBackend::Memory;
    }
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set in {:?} mode", config.environment);
    }

    let store: Arc<dyn Store> = match config.database.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database).await?;
            DatabaseManager::migrate(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
    };

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting Recipe API in {:?} mode", config.environment);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Recipe API listening on http://{}", bind_addr);

    let app = crate::app(AppState::new(store, config));
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn migrate(config: AppConfig) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::migrate(&pool).await?;
    tracing::info!("Schema is up to date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_flags() {
        let cli = Cli::parse_from(["recipe-api", "serve", "--port", "8080", "--memory"]);
        match cli.command {
            Commands::Serve { port, memory } => {
                assert_eq!(port, Some(8080));
                assert!(memory);
            }
            Commands::Migrate => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_global_config() {
        let cli = Cli::parse_from(["recipe-api", "migrate", "--config", "app.yaml"]);
        assert!(matches!(cli.command, Commands::Migrate));
        assert_eq!(cli.config, Some(PathBuf::from("app.yaml")));
    }
}
