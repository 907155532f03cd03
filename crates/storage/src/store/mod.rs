//! Storage seam used by the web layer.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::Database;
use crate::dto::competition::CompetitionQuery;
use crate::error::Result;
use crate::models::{CompetitionListing, NewCompetition, User};
use crate::repository::{competition::CompetitionRepository, user::UserRepository};

/// Everything the service needs from persistence.
///
/// Implementations must be thread-safe (Send + Sync) so one handle can be
/// shared by all request handlers.
#[async_trait]
pub trait CompetitionStore: Send + Sync + 'static {
    /// Rows for a paged descriptor, newest first.
    async fn fetch_competitions(&self, query: &CompetitionQuery) -> Result<Vec<CompetitionListing>>;

    /// Number of rows matching the descriptor's predicates. Any window on the
    /// descriptor is ignored.
    async fn count_competitions(&self, query: &CompetitionQuery) -> Result<i64>;

    /// Returns `StorageError::NotFound` when no competition has this ID.
    async fn find_competition(&self, id: i64) -> Result<CompetitionListing>;

    /// Persists a new competition and returns its ID.
    async fn insert_competition(&self, competition: &NewCompetition) -> Result<i64>;

    /// `None` when no user owns the key.
    async fn find_user_by_key(&self, user_key: &str) -> Result<Option<User>>;
}

#[async_trait]
impl CompetitionStore for Database {
    async fn fetch_competitions(&self, query: &CompetitionQuery) -> Result<Vec<CompetitionListing>> {
        CompetitionRepository::new(self.pool()).list(query).await
    }

    async fn count_competitions(&self, query: &CompetitionQuery) -> Result<i64> {
        CompetitionRepository::new(self.pool()).count(query).await
    }

    async fn find_competition(&self, id: i64) -> Result<CompetitionListing> {
        CompetitionRepository::new(self.pool()).find_by_id(id).await
    }

    async fn insert_competition(&self, competition: &NewCompetition) -> Result<i64> {
        CompetitionRepository::new(self.pool())
            .create(competition)
            .await
    }

    async fn find_user_by_key(&self, user_key: &str) -> Result<Option<User>> {
        UserRepository::new(self.pool())
            .find_by_user_key(user_key)
            .await
    }
}
