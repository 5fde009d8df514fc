mod config;
mod db;
mod error;
mod handlers;
mod jobs;
mod middleware;
mod models;
mod pagination;
mod services;
mod storage;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::jobs::JobQueue;
use crate::storage::LocalStorage;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub storage: Arc<LocalStorage>,
    pub jobs: JobQueue,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkpost=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting inkpost...");

    // Load configuration
    let config = Arc::new(Config::load()?);
    tracing::info!("Configuration loaded");

    // Initialize database
    let db = Database::new(&config.database.path).await?;
    db.run_migrations().await?;
    tracing::info!("Database initialized");

    // Media storage and the thumbnail worker
    let storage = Arc::new(LocalStorage::new(&config.storage.media_path));
    let jobs = JobQueue::start();

    let state = AppState {
        db,
        config: config.clone(),
        storage,
        jobs,
    };

    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/posts", get(handlers::post::list_posts))
        .route("/posts/:id", get(handlers::post::view_post))
        .route("/categories", get(handlers::taxonomy::list_categories))
        .route("/tags", get(handlers::taxonomy::list_tags))
        .route("/media/*path", get(handlers::media::get_media));

    // Commenting works for logged-in users and bounces anonymous visitors
    // to login from inside the handler
    let comment_routes = Router::new()
        .route("/posts/:id/comments", post(handlers::comment::create_comment))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::optional_auth,
        ));

    // Protected routes (302 to login when unauthenticated)
    let protected_routes = Router::new()
        .route("/posts", post(handlers::post::create_post))
        .route(
            "/posts/:id",
            put(handlers::post::edit_post).delete(handlers::post::delete_post),
        )
        .route("/comments/:id", delete(handlers::comment::delete_comment))
        .route("/categories", post(handlers::taxonomy::create_category))
        .route("/categories/:id", delete(handlers::taxonomy::delete_category))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    // Combine all routes under /api/v1
    Router::new()
        .nest(
            "/api/v1",
            public_routes.merge(comment_routes).merge(protected_routes),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
