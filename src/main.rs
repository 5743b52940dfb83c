use std::sync::Arc;

use course_modes_api::database::manager::DatabaseManager;
use course_modes_api::database::repository::PgCourseModeStore;
use course_modes_api::{app, AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = course_modes_api::config::config();
    tracing::info!("Starting course modes API in {:?} mode", config.environment);

    let pool = DatabaseManager::main_pool()
        .await
        .unwrap_or_else(|e| panic!("failed to connect to database: {}", e));
    let state = AppState::new(Arc::new(PgCourseModeStore::new(pool)));

    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("COURSE_MODES_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("course modes API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
