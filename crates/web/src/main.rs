use std::sync::Arc;

use anyhow::Context;
use storage::Database;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod deadline;
mod error;
mod features;
mod media;
mod middleware;
mod routes;
mod state;

use config::Config;
use features::competitions::handlers;
use media::CloudinaryUploader;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_competitions,
        handlers::get_competition,
        handlers::create_competition,
    ),
    components(
        schemas(
            storage::dto::competition::CreateCompetitionRequest,
            storage::dto::competition::CompetitionSummary,
            storage::dto::competition::CompetitionPage,
            storage::dto::competition::CategoryRef,
            storage::dto::competition::CreatedCompetition,
        )
    ),
    tags(
        (name = "competitions", description = "Competition listing and submission"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting competition API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    let uploader = CloudinaryUploader::new(config.cloudinary.clone())
        .context("Failed to build media upload client")?;

    let state = AppState {
        store: Arc::new(db),
        uploader: Arc::new(uploader),
        request_timeout: config.request_timeout,
        media_root: Arc::from(config.media_root.as_str()),
    };

    let app = routes::router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    axum::serve(listener, app).await?;

    Ok(())
}
