//! In-memory store for tests and local development.
//!
//! Evaluates the same predicate set as the SQL renderer, including the
//! inner joins on owner and main category and the left join on sub category.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::instrument;

use super::CompetitionStore;
use crate::dto::competition::{CompetitionQuery, Projection};
use crate::error::{Result, StorageError};
use crate::models::{
    Competition, CompetitionListing, MainCategory, NewCompetition, SubCategory, User,
};

#[derive(Debug)]
pub struct MemoryStore {
    competitions: DashMap<i64, Competition>,
    users: DashMap<i64, User>,
    main_categories: DashMap<i32, MainCategory>,
    sub_categories: DashMap<i32, SubCategory>,
    next_id: AtomicI64,
    unavailable: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            competitions: DashMap::new(),
            users: DashMap::new(),
            main_categories: DashMap::new(),
            sub_categories: DashMap::new(),
            next_id: AtomicI64::new(1),
            unavailable: AtomicBool::new(false),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn add_main_category(&self, category: MainCategory) {
        self.main_categories.insert(category.id, category);
    }

    pub fn add_sub_category(&self, category: SubCategory) {
        self.sub_categories.insert(category.id, category);
    }

    /// Makes every subsequent call fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Raw stored record, bypassing the joins.
    pub fn get(&self, id: i64) -> Option<Competition> {
        self.competitions.get(&id).map(|entry| entry.value().clone())
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn join(&self, competition: &Competition) -> Option<CompetitionListing> {
        let author = self.users.get(&competition.user_id)?.username.clone();
        let main_category = self
            .main_categories
            .get(&competition.main_category_id)?
            .name
            .clone();
        let sub_category = competition
            .sub_category_id
            .and_then(|id| self.sub_categories.get(&id))
            .map(|category| category.name.clone());

        Some(CompetitionListing {
            competition: competition.clone(),
            author,
            main_category,
            sub_category,
        })
    }

    /// Every joined row matching the predicates, newest first.
    fn matching(&self, query: &CompetitionQuery) -> Vec<CompetitionListing> {
        let mut rows: Vec<CompetitionListing> = self
            .competitions
            .iter()
            .filter_map(|entry| self.join(entry.value()))
            .filter(|listing| query.matches(listing))
            .collect();

        rows.sort_by(|a, b| b.competition.id.cmp(&a.competition.id));
        rows
    }
}

#[async_trait]
impl CompetitionStore for MemoryStore {
    #[instrument(skip(self))]
    async fn fetch_competitions(&self, query: &CompetitionQuery) -> Result<Vec<CompetitionListing>> {
        self.check_available()?;

        let rows = self.matching(query);
        let rows = match query.projection {
            Projection::Page(window) => rows
                .into_iter()
                .skip(usize::try_from(window.offset()).unwrap_or(usize::MAX))
                .take(usize::try_from(window.limit()).unwrap_or(usize::MAX))
                .collect(),
            Projection::Count => rows,
        };

        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn count_competitions(&self, query: &CompetitionQuery) -> Result<i64> {
        self.check_available()?;

        Ok(self.matching(query).len() as i64)
    }

    async fn find_competition(&self, id: i64) -> Result<CompetitionListing> {
        self.check_available()?;

        self.competitions
            .get(&id)
            .and_then(|entry| self.join(entry.value()))
            .ok_or(StorageError::NotFound)
    }

    #[instrument(skip(self, competition), fields(title = %competition.title))]
    async fn insert_competition(&self, competition: &NewCompetition) -> Result<i64> {
        self.check_available()?;

        if !self.users.contains_key(&competition.user_id) {
            return Err(StorageError::InvalidRecord(format!(
                "unknown user {}",
                competition.user_id
            )));
        }
        if !self
            .main_categories
            .contains_key(&competition.main_category_id)
        {
            return Err(StorageError::InvalidRecord(format!(
                "unknown main category {}",
                competition.main_category_id
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.competitions
            .insert(id, competition.clone().into_competition(id));

        Ok(id)
    }

    async fn find_user_by_key(&self, user_key: &str) -> Result<Option<User>> {
        self.check_available()?;

        Ok(self
            .users
            .iter()
            .find(|entry| entry.user_key == user_key)
            .map(|entry| entry.value().clone()))
    }
}
