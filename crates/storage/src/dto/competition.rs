use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::common::{PageWindow, parse_positive};
use crate::error::StorageError;
use crate::models::{CompetitionListing, flag};
use crate::token;

pub const DEFAULT_STATUS: &str = "posted";

/// Raw listing query parameters, exactly as they arrive on the query string.
///
/// Every field is kept as text so that malformed numbers never reject the
/// request; [`CompetitionFilter::normalize`] decides what each value means.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCompetitionsParams {
    /// Lifecycle status, defaults to `posted`
    pub status: Option<String>,
    /// `0` or `1`
    pub is_draft: Option<String>,
    /// `0` or `1`
    pub is_guaranted: Option<String>,
    /// `0` or `1`
    pub is_mediapartner: Option<String>,
    /// `0` or `1`
    pub is_manage: Option<String>,
    /// Owner username
    pub username: Option<String>,
    /// Matched against title and description
    pub keyword: Option<String>,
    pub tag: Option<String>,
    pub id_main_category: Option<String>,
    pub main_category: Option<String>,
    pub id_sub_category: Option<String>,
    pub sub_category: Option<String>,
    /// Defaults to 1
    pub page: Option<String>,
    /// Defaults to 9
    pub limit: Option<String>,
}

/// Normalized listing intent. Every constraint is optional except `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionFilter {
    pub status: String,
    pub is_draft: Option<bool>,
    pub is_guaranteed: Option<bool>,
    pub is_media_partner: Option<bool>,
    pub is_managed: Option<bool>,
    pub owner_username: Option<String>,
    pub keyword: Option<String>,
    pub tag: Option<String>,
    pub main_category_id: Option<i32>,
    pub main_category_name: Option<String>,
    pub sub_category_id: Option<i32>,
    pub sub_category_name: Option<String>,
    pub window: PageWindow,
}

impl Default for CompetitionFilter {
    fn default() -> Self {
        Self::normalize(&ListCompetitionsParams::default())
    }
}

/// A single condition of the predicate set. Conditions are combined with AND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Status(String),
    Draft(bool),
    Guaranteed(bool),
    MediaPartner(bool),
    Managed(bool),
    OwnerUsername(String),
    Keyword(String),
    Tag(String),
    MainCategoryId(i32),
    MainCategoryName(String),
    SubCategoryId(i32),
    SubCategoryName(String),
}

impl Predicate {
    /// Evaluates the condition against an already-loaded listing.
    pub fn matches(&self, listing: &CompetitionListing) -> bool {
        let c = &listing.competition;
        match self {
            Self::Status(status) => c.status == *status,
            Self::Draft(value) => c.is_draft == *value,
            Self::Guaranteed(value) => c.is_guaranteed == *value,
            Self::MediaPartner(value) => c.is_media_partner == *value,
            Self::Managed(value) => c.is_managed == *value,
            Self::OwnerUsername(username) => listing.author == *username,
            Self::Keyword(keyword) => {
                contains_ignore_case(&c.title, keyword) || contains_ignore_case(&c.sort, keyword)
            }
            Self::Tag(tag) => contains_ignore_case(&c.tags, tag),
            Self::MainCategoryId(id) => c.main_category_id == *id,
            Self::MainCategoryName(name) => listing.main_category == *name,
            Self::SubCategoryId(id) => c.sub_category_id == Some(*id),
            Self::SubCategoryName(name) => listing.sub_category.as_deref() == Some(name.as_str()),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// What a storage query returns for a predicate set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// One window of rows, newest first
    Page(PageWindow),
    /// Number of rows matching the predicates
    Count,
}

/// Storage-layer query descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionQuery {
    pub predicates: Vec<Predicate>,
    pub projection: Projection,
}

impl CompetitionQuery {
    pub fn matches(&self, listing: &CompetitionListing) -> bool {
        self.predicates.iter().all(|p| p.matches(listing))
    }
}

fn non_empty(raw: Option<&String>) -> Option<String> {
    raw.map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl CompetitionFilter {
    /// Single normalization pass over the raw parameters. Never fails:
    /// malformed values degrade to their default or drop their predicate.
    pub fn normalize(params: &ListCompetitionsParams) -> Self {
        Self {
            status: non_empty(params.status.as_ref()).unwrap_or_else(|| DEFAULT_STATUS.into()),
            is_draft: flag::parse_query(params.is_draft.as_deref()),
            is_guaranteed: flag::parse_query(params.is_guaranted.as_deref()),
            is_media_partner: flag::parse_query(params.is_mediapartner.as_deref()),
            is_managed: flag::parse_query(params.is_manage.as_deref()),
            owner_username: non_empty(params.username.as_ref()),
            keyword: non_empty(params.keyword.as_ref()),
            tag: non_empty(params.tag.as_ref()),
            main_category_id: parse_positive(params.id_main_category.as_deref()),
            main_category_name: non_empty(params.main_category.as_ref()),
            sub_category_id: parse_positive(params.id_sub_category.as_deref()),
            sub_category_name: non_empty(params.sub_category.as_ref()),
            window: PageWindow::from_query(params.page.as_deref(), params.limit.as_deref()),
        }
    }

    /// The predicate set, in a stable order. Absent constraints contribute
    /// nothing.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = vec![Predicate::Status(self.status.clone())];

        predicates.extend(self.is_draft.map(Predicate::Draft));
        predicates.extend(self.is_guaranteed.map(Predicate::Guaranteed));
        predicates.extend(self.is_media_partner.map(Predicate::MediaPartner));
        predicates.extend(self.is_managed.map(Predicate::Managed));
        predicates.extend(self.owner_username.clone().map(Predicate::OwnerUsername));
        predicates.extend(self.keyword.clone().map(Predicate::Keyword));
        predicates.extend(self.tag.clone().map(Predicate::Tag));
        predicates.extend(self.main_category_id.map(Predicate::MainCategoryId));
        predicates.extend(self.main_category_name.clone().map(Predicate::MainCategoryName));
        predicates.extend(self.sub_category_id.map(Predicate::SubCategoryId));
        predicates.extend(self.sub_category_name.clone().map(Predicate::SubCategoryName));

        predicates
    }

    pub fn fetch_query(&self) -> CompetitionQuery {
        CompetitionQuery {
            predicates: self.predicates(),
            projection: Projection::Page(self.window),
        }
    }

    pub fn count_query(&self) -> CompetitionQuery {
        CompetitionQuery {
            predicates: self.predicates(),
            projection: Projection::Count,
        }
    }
}

impl From<&ListCompetitionsParams> for CompetitionFilter {
    fn from(params: &ListCompetitionsParams) -> Self {
        Self::normalize(params)
    }
}

/// Request payload for creating a new competition
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCompetitionRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Title must be between 1 and 255 characters"
    ))]
    pub title: String,

    #[validate(length(max = 500))]
    #[serde(default)]
    pub description: String,

    #[validate(length(min = 1, max = 255))]
    pub organizer: String,

    pub deadline_date: NaiveDate,

    /// Defaults to the deadline when omitted
    pub announcement_date: Option<NaiveDate>,

    #[validate(range(min = 1))]
    pub main_cat: i32,

    #[validate(range(min = 1))]
    pub sub_cat: Option<i32>,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub prize_total: Decimal,

    #[serde(default)]
    pub prize_description: String,

    #[serde(default)]
    pub contacts: String,

    #[serde(default)]
    pub is_guaranteed: bool,

    #[serde(default)]
    pub is_mediapartner: bool,

    #[serde(default)]
    pub draft: bool,

    #[validate(url)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_link: Option<String>,

    #[validate(url)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register_link: Option<String>,

    #[serde(default)]
    pub announcements: String,

    #[serde(default)]
    pub tags: String,

    #[validate(length(min = 1, max = 32))]
    #[serde(default = "default_create_status")]
    pub status: String,

    /// Poster image as a data URI or a bare base64 string
    #[validate(length(min = 1))]
    pub poster: String,
}

fn default_create_status() -> String {
    DEFAULT_STATUS.to_string()
}

/// Outward projection of a competition. `id` is always the opaque token.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CompetitionSummary {
    pub id: String,
    pub title: String,
    pub sort: String,
    pub organizer: String,
    pub deadline_at: NaiveDate,
    pub announcement_at: NaiveDate,
    pub author: String,
    pub main_category: CategoryRef,
    pub sub_category: Option<CategoryRef>,
    pub prize_total: Decimal,
    pub prize_description: String,
    pub is_guaranteed: bool,
    pub is_media_partner: bool,
    pub is_managed: bool,
    pub is_draft: bool,
    pub tags: Vec<String>,
    pub status: String,
    #[schema(value_type = Object)]
    pub poster: Option<serde_json::Value>,
    pub views: i32,
    #[serde(with = "crate::models::timestamp")]
    #[schema(value_type = String, example = "2024-03-07 09:05:02")]
    pub created_at: chrono::NaiveDateTime,
    #[serde(with = "crate::models::timestamp")]
    #[schema(value_type = String, example = "2024-03-07 09:05:02")]
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryRef {
    pub id: i32,
    pub name: String,
}

impl TryFrom<CompetitionListing> for CompetitionSummary {
    type Error = StorageError;

    fn try_from(listing: CompetitionListing) -> Result<Self, Self::Error> {
        let c = listing.competition;
        let id = token::record_token(c.id)
            .map_err(|e| StorageError::InvalidRecord(format!("competition {}: {}", c.id, e)))?;
        let sub_category = match (c.sub_category_id, listing.sub_category) {
            (Some(id), Some(name)) => Some(CategoryRef { id, name }),
            _ => None,
        };
        let tags = c
            .tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            id,
            title: c.title,
            sort: c.sort,
            organizer: c.organizer,
            deadline_at: c.deadline_at,
            announcement_at: c.announcement_at,
            author: listing.author,
            main_category: CategoryRef {
                id: c.main_category_id,
                name: listing.main_category,
            },
            sub_category,
            prize_total: c.prize_total,
            prize_description: c.prize_description,
            is_guaranteed: c.is_guaranteed,
            is_media_partner: c.is_media_partner,
            is_managed: c.is_managed,
            is_draft: c.is_draft,
            tags,
            status: c.status,
            poster: c.poster,
            views: c.views,
            created_at: c.created_at,
            updated_at: c.updated_at,
        })
    }
}

/// Listing payload: one page plus the total for the whole filtered set
#[derive(Debug, Serialize, ToSchema)]
pub struct CompetitionPage {
    pub competitions: Vec<CompetitionSummary>,
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedCompetition {
    pub id: String,
}
