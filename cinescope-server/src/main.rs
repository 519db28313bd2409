//! # Cinescope Server
//!
//! REST API for browsing movies and TV shows backed by TMDB.
//!
//! - **Filtered listings**: popular, top rated, upcoming and on-the-air
//!   listings with genre and year filters TMDB cannot apply natively
//! - **Search**: movie and TV search with an optional genre filter
//! - **Details**: movie and show details cached for 24 hours in PostgreSQL
//!   (or in memory when no database is configured)

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use chrono::Utc;
use cinescope_core::{
    CatalogService, TmdbApiProvider,
    storage::{
        DetailCacheRepository, InMemoryDetailCacheRepository,
        PostgresDetailCacheRepository,
    },
};
use cinescope_server::{
    AppState, create_app,
    infra::{
        cache_sweeper::spawn_cache_sweeper,
        config::{Config, ConfigLoad, ConfigLoader, loader::ConfigLoaderOptions},
    },
};
use clap::{Args as ClapArgs, Parser, Subcommand};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "cinescope-server")]
#[command(about = "Movie and TV browsing API with filtered listings and cached details")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Database utilities
    #[command(subcommand)]
    Db(DbCommand),
    /// Detail cache maintenance
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Subcommand, Debug)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// Delete cached details last refreshed before the given age
    Purge {
        /// Age threshold, e.g. `30d` or `12h`
        #[arg(long, value_parser = humantime::parse_duration)]
        older_than: Duration,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(command) = cli.command {
        match command {
            Command::Db(DbCommand::Migrate) => {
                run_db_migrate(&cli.serve).await?;
                return Ok(());
            }
            Command::Cache(CacheCommand::Purge { older_than }) => {
                run_cache_purge(&cli.serve, older_than).await?;
                return Ok(());
            }
        }
    }

    run_server(cli.serve).await
}

async fn run_db_migrate(args: &ServeArgs) -> anyhow::Result<()> {
    let config = load_runtime_config(args)?;
    let Some(url) = config.database.url.as_deref() else {
        anyhow::bail!("DATABASE_URL must be set to run migrations");
    };

    connect_database(url, config.database.max_connections).await?;
    info!("Database migrations applied successfully");
    Ok(())
}

async fn run_cache_purge(args: &ServeArgs, older_than: Duration) -> anyhow::Result<()> {
    let config = load_runtime_config(args)?;
    let repository = build_repository(&config).await?;
    if repository.backend() == "memory" {
        warn!("no DATABASE_URL configured; the in-memory cache is empty on startup");
    }

    let cutoff = Utc::now()
        - chrono::Duration::from_std(older_than).context("purge age is out of range")?;
    let removed = repository
        .purge_stale(cutoff)
        .await
        .context("failed to purge detail cache")?;
    info!(removed, cutoff = %cutoff, "detail cache purged");
    Ok(())
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let config = Arc::new(load_runtime_config(&args)?);

    let tmdb = Arc::new(
        TmdbApiProvider::new(config.tmdb.settings())
            .context("failed to build TMDB client")?,
    );
    let repository = build_repository(&config).await?;
    info!(backend = repository.backend(), "detail cache ready");

    let catalog = Arc::new(CatalogService::new(tmdb.clone(), tmdb, repository));

    if let Some(retention) = config.cache.retention {
        spawn_cache_sweeper(
            Arc::clone(&catalog),
            retention,
            config.cache.sweep_interval,
        );
    }

    let state = AppState::new(catalog, Arc::clone(&config));
    let router = create_app(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Starting Cinescope API on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let ConfigLoad {
        mut config,
        warnings,
    } = ConfigLoader::with_options(ConfigLoaderOptions {
        config_path: args.config.clone(),
        env_file: None,
    })
    .load()
    .context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        config.server.host = host;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "configuration file loaded");
    }

    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => {
                warn!(message = %warning.message, "configuration warning")
            }
        }
    }

    Ok(config)
}

async fn build_repository(config: &Config) -> anyhow::Result<Arc<dyn DetailCacheRepository>> {
    match config.database.url.as_deref() {
        Some(url) => {
            let pool = connect_database(url, config.database.max_connections).await?;
            Ok(Arc::new(PostgresDetailCacheRepository::new(pool)))
        }
        None => Ok(Arc::new(InMemoryDetailCacheRepository::new())),
    }
}

async fn connect_database(url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await
        .context("failed to connect to PostgreSQL")?;

    cinescope_core::MIGRATOR
        .run(&pool)
        .await
        .context("database migration failed")?;

    Ok(pool)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
