use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::deadline::Deadline;
use crate::error::WebError;
use crate::state::AppState;

/// Header carrying the caller's opaque credential
pub const USER_KEY_HEADER: &str = "userkey";

/// Resolves the `userKey` header to a user and stores it in the request
/// extensions for the handler, together with the request's [`Deadline`].
/// The lookup already spends from that deadline, so the handler must reuse it
/// rather than start a new one.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let user_key = req
        .headers()
        .get(USER_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(String::from)
        .ok_or(WebError::MissingCredential)?;

    let deadline = state.deadline();

    let user = deadline
        .run("find_user_by_key", state.store.find_user_by_key(&user_key))
        .await?
        .ok_or_else(|| {
            tracing::warn!("Invalid user key attempt");
            WebError::InvalidCredential
        })?;

    tracing::debug!(user_id = user.id, username = %user.username, "User authenticated");
    req.extensions_mut().insert(user);
    req.extensions_mut().insert(deadline);

    Ok(next.run(req).await)
}
