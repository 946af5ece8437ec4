use crate::config::Config;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// Opens the connection pool described by `config`.
    pub async fn connect(config: &Config) -> Result<Self, sqlx::Error> {
        let database_url = config
            .database_url
            .as_deref()
            .ok_or_else(|| sqlx::Error::Configuration("DATABASE_URL must be set".into()))?;
        Self::connect_url(database_url, config.max_connections).await
    }

    pub async fn connect_url(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!(
            "{:<12} --> Connection pool opened (max {} connections)",
            "Database", max_connections
        );
        Ok(Self { pool })
    }

    /// Creates the schema if it doesn't exist yet. Existing rows are kept.
    pub async fn initialize_database(&self) -> Result<(), sqlx::Error> {
        let create_schema_sql = include_str!("../sql/01-create-schema.sql");
        self.execute_multi_query(create_schema_sql).await
    }

    async fn execute_multi_query(&self, sql: &str) -> Result<(), sqlx::Error> {
        for query in sql.split(';') {
            let query = query.trim();
            if !query.is_empty() {
                sqlx::query(query).execute(&self.pool).await?;
            }
        }
        Ok(())
    }

    /// Waits for checked-out connections to return, then closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("{:<12} --> Connection pool closed", "Database");
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
