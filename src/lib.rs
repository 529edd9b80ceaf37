pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;

use axum::{
    extract::State,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Assemble the full router over the given state. Tests call this with
/// in-memory repositories; `main` calls it with Postgres-backed ones.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(note_routes())
        .with_state(state)
        // The authentication filter annotates every request; it never rejects
        .layer(axum::middleware::from_fn(middleware::identity_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route(
            "/api/auth/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route("/api/auth/password", put(auth::change_password))
        .route("/api/auth/check-username/:username", get(auth::check_username))
        .route("/api/auth/check-email/:email", get(auth::check_email))
        .route("/api/auth/logout", post(auth::logout))
}

fn note_routes() -> Router<AppState> {
    use handlers::notes;

    Router::new()
        .route(
            "/api/notes",
            get(notes::list).post(notes::create).delete(notes::delete_many),
        )
        .route("/api/notes/search", get(notes::search))
        .route("/api/notes/favorites", get(notes::favorites))
        .route("/api/notes/tags", get(notes::tags))
        .route("/api/notes/subjects", get(notes::subjects))
        .route("/api/notes/categories", get(notes::categories))
        .route("/api/notes/stats", get(notes::stats))
        .route("/api/notes/recent", get(notes::recent))
        .route("/api/notes/public", get(notes::public_feed))
        .route("/api/notes/public/mine", get(notes::own_public))
        .route("/api/notes/subject/:subject", get(notes::by_subject))
        .route("/api/notes/category/:category", get(notes::by_category))
        .route("/api/notes/tag/:tag", get(notes::by_tag))
        .route(
            "/api/notes/:id",
            get(notes::get).put(notes::update).delete(notes::delete),
        )
        .route("/api/notes/:id/favorite", put(notes::toggle_favorite))
        .route("/api/notes/:id/public", put(notes::toggle_public))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Notes API",
        "version": version,
        "endpoints": {
            "auth": "/api/auth/* (register, login, profile, password)",
            "notes": "/api/notes[/*] (Bearer token required)",
            "public": "/api/notes/public",
            "health": "/health",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match state.health().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string(),
            })),
        ),
    }
}
