use chrono::{Datelike, Local, NaiveDateTime};
use storage::{
    CompetitionStore,
    dto::competition::{CompetitionFilter, CompetitionSummary, CreateCompetitionRequest},
    error::StorageError,
    models::{NewCompetition, User, timestamp},
    token,
};

use crate::deadline::Deadline;
use crate::error::WebError;
use crate::media::{MediaUploader, PosterPayload, UploadError};

/// Fetch one page of competitions plus the total for the whole filtered set.
/// Both queries run concurrently under the request deadline.
#[tracing::instrument(skip(store, deadline), fields(status = %filter.status))]
pub async fn list_competitions(
    store: &dyn CompetitionStore,
    filter: &CompetitionFilter,
    deadline: &Deadline,
) -> Result<(Vec<CompetitionSummary>, i64), WebError> {
    let fetch = filter.fetch_query();
    let count = filter.count_query();

    let (rows, total) = tokio::try_join!(
        deadline.run("fetch_competitions", store.fetch_competitions(&fetch)),
        deadline.run("count_competitions", store.count_competitions(&count)),
    )
    .inspect_err(|e| {
        tracing::error!(
            operation = "list_competitions",
            predicates = ?fetch.predicates,
            page = filter.window.page,
            limit = filter.window.limit,
            error = %e,
            "Listing failed"
        );
    })?;

    let competitions = rows
        .into_iter()
        .map(CompetitionSummary::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((competitions, total))
}

/// Resolve a token and fetch the competition it points at
pub async fn get_competition(
    store: &dyn CompetitionStore,
    id_token: &str,
    deadline: &Deadline,
) -> Result<CompetitionSummary, WebError> {
    let id = token::deobfuscate(id_token)
        .ok()
        .and_then(|id| i64::try_from(id).ok())
        .ok_or(WebError::NotFound)?;

    let listing = deadline
        .run("find_competition", store.find_competition(id))
        .await?;

    Ok(CompetitionSummary::try_from(listing)?)
}

/// Upload folder for a user's posters in a given year
pub fn upload_folder(media_root: &str, username: &str, year: i32) -> String {
    format!("{}/{}/{}", media_root.trim_end_matches('/'), username, year)
}

/// Builds the record to persist. `now` stamps both timestamps.
pub fn draft_competition(
    owner: &User,
    req: CreateCompetitionRequest,
    poster: serde_json::Value,
    now: NaiveDateTime,
) -> NewCompetition {
    let now = timestamp::truncate_to_seconds(now);

    NewCompetition {
        user_id: owner.id,
        title: req.title,
        sort: req.description,
        organizer: req.organizer,
        deadline_at: req.deadline_date,
        announcement_at: req.announcement_date.unwrap_or(req.deadline_date),
        main_category_id: req.main_cat,
        sub_category_id: req.sub_cat,
        content: req.content,
        prize_total: req.prize_total,
        prize_description: req.prize_description,
        contact: req.contacts,
        is_guaranteed: req.is_guaranteed,
        is_media_partner: req.is_mediapartner,
        is_managed: false,
        is_draft: req.draft,
        source_link: req.source_link.unwrap_or_default(),
        register_link: req.register_link.unwrap_or_default(),
        announcements: req.announcements,
        tags: req.tags,
        status: req.status,
        poster: Some(poster),
        views: 1,
        created_at: now,
        updated_at: now,
    }
}

/// Upload the poster, then persist the competition. Returns the new token.
#[tracing::instrument(skip_all, fields(user_id = owner.id, title = %req.title))]
pub async fn create_competition(
    store: &dyn CompetitionStore,
    uploader: &dyn MediaUploader,
    media_root: &str,
    owner: &User,
    req: CreateCompetitionRequest,
    deadline: &Deadline,
) -> Result<String, WebError> {
    let poster = PosterPayload::resolve(&req.poster)?;

    let now = Local::now().naive_local();
    let folder = upload_folder(media_root, &owner.username, now.year());

    let uploaded = deadline
        .run("upload_poster", uploader.upload(&folder, &poster))
        .await
        .inspect_err(|e| {
            tracing::error!(operation = "upload_poster", folder = %folder, error = %e, "Upload failed");
        })?;

    let poster = serde_json::to_value(&uploaded).map_err(UploadError::from)?;

    let new_competition = draft_competition(owner, req, poster, now);

    let id = deadline
        .run("insert_competition", store.insert_competition(&new_competition))
        .await
        .inspect_err(|e| {
            tracing::error!(
                operation = "insert_competition",
                user_id = owner.id,
                main_category_id = new_competition.main_category_id,
                remaining_ms = deadline.remaining().as_millis() as u64,
                error = %e,
                "Insert failed"
            );
        })?;

    tracing::info!(id, "Competition created");

    token::record_token(id).map_err(|e| {
        StorageError::InvalidRecord(format!("inserted competition {}: {}", id, e)).into()
    })
}
