use anyhow::{Context, Result};
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};
use std::time::Duration;
use tracing::info;

use crate::config::myconfig::{env_flag, env_or, env_required};

pub type ConnectionPool = Pool<Postgres>;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub db_max_conn: u32,
    pub db_min_conn: u32,
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn init() -> Result<Self> {
        let database_url = env_required("DATABASE_URL")?;
        let db_max_conn: u32 = env_or("DB_MAX_CONNECTION", 5)?;
        let db_min_conn: u32 = env_or("DB_MIN_CONNECTION", 1)?;
        let run_migrations = env_flag("RUN_MIGRATIONS")?;

        if db_min_conn > db_max_conn {
            anyhow::bail!(
                "DB_MIN_CONNECTION ({db_min_conn}) must not exceed DB_MAX_CONNECTION ({db_max_conn})"
            );
        }

        Ok(Self {
            database_url,
            db_max_conn,
            db_min_conn,
            run_migrations,
        })
    }
}

pub struct ConnectionManager;

impl ConnectionManager {
    pub async fn new_pool(config: &DatabaseConfig) -> Result<ConnectionPool> {
        let pool = PgPoolOptions::new()
            .min_connections(config.db_min_conn)
            .max_connections(config.db_max_conn)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.database_url)
            .await
            .context("Failed to create database connection pool")?;

        info!(
            "🗄️ Database pool ready (min: {}, max: {})",
            config.db_min_conn, config.db_max_conn
        );

        Ok(pool)
    }
}

pub async fn run_migrations(pool: &ConnectionPool) -> Result<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations")?;

    info!("✅ Database migrations applied");
    Ok(())
}
