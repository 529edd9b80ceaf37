use notes_api::{app, config, database, state::AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notes_api=debug,tower_http=info".into()),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Notes API in {:?} mode", config.environment);

    let pool = database::pool::connect()
        .await
        .unwrap_or_else(|e| panic!("failed to initialize database: {}", e));

    let app = app(AppState::with_pool(pool));

    // Allow tests or deployments to override port via env
    let port = std::env::var("NOTES_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(8080);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Notes API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
