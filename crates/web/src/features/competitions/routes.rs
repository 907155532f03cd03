use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{create_competition, get_competition, list_competitions};
use crate::middleware::auth::require_user;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_competition))
        .route_layer(middleware::from_fn_with_state(state, require_user));

    Router::new()
        .route("/", get(list_competitions))
        .route("/:token", get(get_competition))
        .merge(protected)
}
