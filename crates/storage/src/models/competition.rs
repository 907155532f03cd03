use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A persisted competition record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Competition {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    /// Short description shown on listing cards
    pub sort: String,
    pub organizer: String,
    pub deadline_at: NaiveDate,
    pub announcement_at: NaiveDate,
    pub main_category_id: i32,
    pub sub_category_id: Option<i32>,
    pub content: String,
    pub prize_total: Decimal,
    pub prize_description: String,
    pub contact: String,
    pub is_guaranteed: bool,
    pub is_media_partner: bool,
    pub is_managed: bool,
    pub is_draft: bool,
    pub source_link: String,
    pub register_link: String,
    pub announcements: String,
    pub tags: String,
    pub status: String,
    /// Upload-service result for the poster image
    #[schema(value_type = Object)]
    pub poster: Option<serde_json::Value>,
    pub views: i32,
    #[serde(with = "super::timestamp")]
    #[schema(value_type = String, example = "2024-03-07 09:05:02")]
    pub created_at: NaiveDateTime,
    #[serde(with = "super::timestamp")]
    #[schema(value_type = String, example = "2024-03-07 09:05:02")]
    pub updated_at: NaiveDateTime,
}

/// A competition that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewCompetition {
    pub user_id: i64,
    pub title: String,
    pub sort: String,
    pub organizer: String,
    pub deadline_at: NaiveDate,
    pub announcement_at: NaiveDate,
    pub main_category_id: i32,
    pub sub_category_id: Option<i32>,
    pub content: String,
    pub prize_total: Decimal,
    pub prize_description: String,
    pub contact: String,
    pub is_guaranteed: bool,
    pub is_media_partner: bool,
    pub is_managed: bool,
    pub is_draft: bool,
    pub source_link: String,
    pub register_link: String,
    pub announcements: String,
    pub tags: String,
    pub status: String,
    pub poster: Option<serde_json::Value>,
    pub views: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewCompetition {
    pub fn into_competition(self, id: i64) -> Competition {
        Competition {
            id,
            user_id: self.user_id,
            title: self.title,
            sort: self.sort,
            organizer: self.organizer,
            deadline_at: self.deadline_at,
            announcement_at: self.announcement_at,
            main_category_id: self.main_category_id,
            sub_category_id: self.sub_category_id,
            content: self.content,
            prize_total: self.prize_total,
            prize_description: self.prize_description,
            contact: self.contact,
            is_guaranteed: self.is_guaranteed,
            is_media_partner: self.is_media_partner,
            is_managed: self.is_managed,
            is_draft: self.is_draft,
            source_link: self.source_link,
            register_link: self.register_link,
            announcements: self.announcements,
            tags: self.tags,
            status: self.status,
            poster: self.poster,
            views: self.views,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A competition joined with its owner and category names
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitionListing {
    pub competition: Competition,
    pub author: String,
    pub main_category: String,
    pub sub_category: Option<String>,
}
