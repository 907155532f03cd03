pub mod dto;
pub mod error;
pub mod models;
pub mod repository;
pub mod store;
pub mod token;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use store::{CompetitionStore, MemoryStore};

/// Handle to the PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> error::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
