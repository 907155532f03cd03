use axum::Router;

use crate::features::competitions;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/competitions",
            competitions::routes::routes(state.clone()),
        )
        .with_state(state)
}
