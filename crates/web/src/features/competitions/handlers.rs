use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::{
        common::Envelope,
        competition::{
            CompetitionFilter, CompetitionPage, CompetitionSummary, CreateCompetitionRequest,
            CreatedCompetition, ListCompetitionsParams,
        },
    },
    models::User,
};
use validator::Validate;

use crate::deadline::Deadline;
use crate::error::{WebError, WebResult};
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/competitions",
    params(ListCompetitionsParams),
    responses(
        (status = 200, description = "One page of competitions and the total matching count. The envelope status is 204 when the page is empty", body = Envelope<CompetitionPage>),
        (status = 500, description = "Storage failure"),
        (status = 504, description = "Deadline exceeded")
    ),
    tag = "competitions"
)]
pub async fn list_competitions(
    State(state): State<AppState>,
    Query(params): Query<ListCompetitionsParams>,
) -> WebResult<Response> {
    let filter = CompetitionFilter::normalize(&params);
    let deadline = state.deadline();

    let (competitions, total) =
        services::list_competitions(state.store.as_ref(), &filter, &deadline).await?;

    let (status, message) = if competitions.is_empty() {
        (StatusCode::NO_CONTENT, "No competitions found")
    } else {
        (StatusCode::OK, "Success")
    };

    let body = Envelope::new(
        status.as_u16(),
        message,
        Some(CompetitionPage {
            competitions,
            total,
        }),
    );

    Ok(Json(body).into_response())
}

#[utoipa::path(
    get,
    path = "/api/competitions/{token}",
    params(
        ("token" = String, Path, description = "Opaque competition token")
    ),
    responses(
        (status = 200, description = "Competition found", body = Envelope<CompetitionSummary>),
        (status = 404, description = "Competition not found")
    ),
    tag = "competitions"
)]
pub async fn get_competition(
    State(state): State<AppState>,
    Path(id_token): Path<String>,
) -> WebResult<Response> {
    let deadline = state.deadline();
    let competition =
        services::get_competition(state.store.as_ref(), &id_token, &deadline).await?;

    Ok(Json(Envelope::new(
        StatusCode::OK.as_u16(),
        "Success",
        Some(competition),
    ))
    .into_response())
}

#[utoipa::path(
    post,
    path = "/api/competitions",
    request_body = CreateCompetitionRequest,
    params(
        ("userKey" = String, Header, description = "Caller credential")
    ),
    responses(
        (status = 201, description = "Competition created", body = Envelope<CreatedCompetition>),
        (status = 400, description = "Payload could not be decoded or failed validation"),
        (status = 403, description = "Missing or unknown user key"),
        (status = 500, description = "Insert failed"),
        (status = 502, description = "Poster upload failed"),
        (status = 504, description = "Deadline exceeded")
    ),
    tag = "competitions"
)]
pub async fn create_competition(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Extension(deadline): Extension<Deadline>,
    payload: Result<Json<CreateCompetitionRequest>, JsonRejection>,
) -> WebResult<Response> {
    let Json(req) = payload.map_err(|rejection| WebError::Decode(rejection.body_text()))?;

    req.validate()?;

    let id = services::create_competition(
        state.store.as_ref(),
        state.uploader.as_ref(),
        &state.media_root,
        &user,
        req,
        &deadline,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(
            StatusCode::CREATED.as_u16(),
            "Competition created",
            Some(CreatedCompetition { id }),
        )),
    )
        .into_response())
}
