use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::dto::common::PageWindow;
use crate::dto::competition::{CompetitionQuery, Predicate, Projection};
use crate::error::{Result, StorageError};
use crate::models::{CompetitionListing, NewCompetition, flag};

const LISTING_COLUMNS: &str = r#"
    SELECT c.id, c.user_id, c.title, c.sort, c.organizer, c.deadline_at, c.announcement_at,
           c.main_category_id, c.sub_category_id, c.content, c.prize_total, c.prize_description,
           c.contact, c.is_guaranted, c.is_mediapartner, c.is_manage, c.draft,
           c.source_link, c.register_link, c.announcements, c.tags, c.status,
           c.poster_cloudinary, c.views, c.created_at, c.updated_at,
           u.username AS author, mc.name AS main_category, sc.name AS sub_category
"#;

const COUNT_COLUMNS: &str = "SELECT COUNT(*)";

const FROM_JOINED: &str = r#"
    FROM competitions c
    INNER JOIN users u ON u.id = c.user_id
    INNER JOIN main_categories mc ON mc.id = c.main_category_id
    LEFT JOIN sub_categories sc ON sc.id = c.sub_category_id
    WHERE 1=1
"#;

/// Row shape as stored: flags are `"0"`/`"1"` text and the poster is JSON text.
#[derive(FromRow)]
struct CompetitionRow {
    id: i64,
    user_id: i64,
    title: String,
    sort: String,
    organizer: String,
    deadline_at: NaiveDate,
    announcement_at: NaiveDate,
    main_category_id: i32,
    sub_category_id: Option<i32>,
    content: String,
    prize_total: Decimal,
    prize_description: String,
    contact: String,
    is_guaranted: String,
    is_mediapartner: String,
    is_manage: String,
    draft: String,
    source_link: String,
    register_link: String,
    announcements: String,
    tags: String,
    status: String,
    poster_cloudinary: Option<String>,
    views: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    author: String,
    main_category: String,
    sub_category: Option<String>,
}

impl TryFrom<CompetitionRow> for CompetitionListing {
    type Error = StorageError;

    fn try_from(row: CompetitionRow) -> Result<Self> {
        let poster = row
            .poster_cloudinary
            .as_deref()
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| serde_json::from_str(raw).ok());

        Ok(Self {
            competition: crate::models::Competition {
                id: row.id,
                user_id: row.user_id,
                title: row.title,
                sort: row.sort,
                organizer: row.organizer,
                deadline_at: row.deadline_at,
                announcement_at: row.announcement_at,
                main_category_id: row.main_category_id,
                sub_category_id: row.sub_category_id,
                content: row.content,
                prize_total: row.prize_total,
                prize_description: row.prize_description,
                contact: row.contact,
                is_guaranteed: flag::decode("is_guaranted", &row.is_guaranted)?,
                is_media_partner: flag::decode("is_mediapartner", &row.is_mediapartner)?,
                is_managed: flag::decode("is_manage", &row.is_manage)?,
                is_draft: flag::decode("draft", &row.draft)?,
                source_link: row.source_link,
                register_link: row.register_link,
                announcements: row.announcements,
                tags: row.tags,
                status: row.status,
                poster,
                views: row.views,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            author: row.author,
            main_category: row.main_category,
            sub_category: row.sub_category,
        })
    }
}

/// Escapes LIKE metacharacters and wraps the needle for substring matching.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn push_predicate(query: &mut QueryBuilder<'static, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Status(status) => {
            query.push(" AND c.status = ");
            query.push_bind(status.clone());
        }
        Predicate::Draft(value) => {
            query.push(" AND c.draft = ");
            query.push_bind(flag::encode(*value));
        }
        Predicate::Guaranteed(value) => {
            query.push(" AND c.is_guaranted = ");
            query.push_bind(flag::encode(*value));
        }
        Predicate::MediaPartner(value) => {
            query.push(" AND c.is_mediapartner = ");
            query.push_bind(flag::encode(*value));
        }
        Predicate::Managed(value) => {
            query.push(" AND c.is_manage = ");
            query.push_bind(flag::encode(*value));
        }
        Predicate::OwnerUsername(username) => {
            query.push(" AND u.username = ");
            query.push_bind(username.clone());
        }
        Predicate::Keyword(keyword) => {
            let pattern = like_pattern(keyword);
            query.push(" AND (c.title ILIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR c.sort ILIKE ");
            query.push_bind(pattern);
            query.push(")");
        }
        Predicate::Tag(tag) => {
            query.push(" AND c.tags ILIKE ");
            query.push_bind(like_pattern(tag));
        }
        Predicate::MainCategoryId(id) => {
            query.push(" AND c.main_category_id = ");
            query.push_bind(*id);
        }
        Predicate::MainCategoryName(name) => {
            query.push(" AND mc.name = ");
            query.push_bind(name.clone());
        }
        Predicate::SubCategoryId(id) => {
            query.push(" AND c.sub_category_id = ");
            query.push_bind(*id);
        }
        Predicate::SubCategoryName(name) => {
            query.push(" AND sc.name = ");
            query.push_bind(name.clone());
        }
    }
}

fn render(
    columns: &str,
    predicates: &[Predicate],
    window: Option<PageWindow>,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(columns);
    query.push(FROM_JOINED);

    for predicate in predicates {
        push_predicate(&mut query, predicate);
    }

    if let Some(window) = window {
        query.push(" ORDER BY c.id DESC LIMIT ");
        query.push_bind(window.sql_limit());
        query.push(" OFFSET ");
        query.push_bind(window.sql_offset());
    }

    query
}

/// Renders a query descriptor to SQL. Fetch and count share the FROM clause
/// and the predicate rendering; only the projection differs.
pub fn build_query(descriptor: &CompetitionQuery) -> QueryBuilder<'static, Postgres> {
    match descriptor.projection {
        Projection::Page(window) => render(LISTING_COLUMNS, &descriptor.predicates, Some(window)),
        Projection::Count => render(COUNT_COLUMNS, &descriptor.predicates, None),
    }
}

/// Repository for competition database operations
pub struct CompetitionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CompetitionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the competitions matching the descriptor's predicates. A count
    /// descriptor fetches the whole filtered set.
    pub async fn list(&self, descriptor: &CompetitionQuery) -> Result<Vec<CompetitionListing>> {
        let window = match descriptor.projection {
            Projection::Page(window) => Some(window),
            Projection::Count => None,
        };
        let mut query = render(LISTING_COLUMNS, &descriptor.predicates, window);
        let rows: Vec<CompetitionRow> = query
            .build_query_as()
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(CompetitionListing::try_from).collect()
    }

    /// Count every competition matching the descriptor's predicates
    pub async fn count(&self, descriptor: &CompetitionQuery) -> Result<i64> {
        let mut query = render(COUNT_COLUMNS, &descriptor.predicates, None);
        let total = query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        Ok(total)
    }

    /// Get a competition with its joined names by ID
    pub async fn find_by_id(&self, id: i64) -> Result<CompetitionListing> {
        let mut query = QueryBuilder::<Postgres>::new(LISTING_COLUMNS);
        query.push(FROM_JOINED);
        query.push(" AND c.id = ");
        query.push_bind(id);

        let row: CompetitionRow = query
            .build_query_as()
            .fetch_optional(self.pool)
            .await?
            .ok_or(StorageError::NotFound)?;

        CompetitionListing::try_from(row)
    }

    /// Insert a new competition and return its ID
    pub async fn create(&self, new: &NewCompetition) -> Result<i64> {
        let poster = new.poster.as_ref().map(|p| p.to_string());

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO competitions (
                user_id, title, sort, organizer, deadline_at, announcement_at,
                main_category_id, sub_category_id, content, prize_total, prize_description,
                contact, is_guaranted, is_mediapartner, is_manage, draft,
                source_link, register_link, announcements, tags, status,
                poster, poster_cloudinary, views, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, '', $22, $23, $24, $25)
            RETURNING id
            "#,
        )
        .bind(new.user_id)
        .bind(&new.title)
        .bind(&new.sort)
        .bind(&new.organizer)
        .bind(new.deadline_at)
        .bind(new.announcement_at)
        .bind(new.main_category_id)
        .bind(new.sub_category_id)
        .bind(&new.content)
        .bind(new.prize_total)
        .bind(&new.prize_description)
        .bind(&new.contact)
        .bind(flag::encode(new.is_guaranteed))
        .bind(flag::encode(new.is_media_partner))
        .bind(flag::encode(new.is_managed))
        .bind(flag::encode(new.is_draft))
        .bind(&new.source_link)
        .bind(&new.register_link)
        .bind(&new.announcements)
        .bind(&new.tags)
        .bind(&new.status)
        .bind(poster)
        .bind(new.views)
        .bind(new.created_at)
        .bind(new.updated_at)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }
}
