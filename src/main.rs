use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use students_api_rust::database::manager::DatabaseManager;
use students_api_rust::handlers;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, API_BASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = students_api_rust::config::config();
    tracing::info!("Starting Students API in {:?} mode", config.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(config.api.port);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Students API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(student_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn student_routes() -> Router {
    use handlers::students;

    Router::new()
        .route("/api/v1/students/:osu_id/gpa", get(students::gpa_get))
        .route(
            "/api/v1/students/:osu_id/account-balance",
            get(students::account_balance_get),
        )
        .route(
            "/api/v1/students/:osu_id/account-transactions",
            get(students::account_transactions_get),
        )
        .route(
            "/api/v1/students/:osu_id/academic-status",
            get(students::academic_status_get),
        )
        .route(
            "/api/v1/students/:osu_id/classification",
            get(students::classification_get),
        )
        .route("/api/v1/students/:osu_id/grades", get(students::grades_get))
        .route(
            "/api/v1/students/:osu_id/class-schedule",
            get(students::class_schedule_get),
        )
        .route("/api/v1/students/:osu_id/holds", get(students::holds_get))
        .route(
            "/api/v1/students/:osu_id/work-study",
            get(students::work_study_get),
        )
        .route(
            "/api/v1/students/:osu_id/dual-enrollment",
            get(students::dual_enrollment_get),
        )
        .route("/api/v1/students/:osu_id/degrees", get(students::degrees_get))
        .route(
            "/api/v1/students/:osu_id/emergency-contacts",
            get(students::emergency_contacts_get),
        )
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Students API (Rust)",
        "version": version,
        "description": "Read-only JSON:API access to student academic records",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "students": "/api/v1/students/:osuId/<resource>",
            "resources": [
                "gpa",
                "account-balance",
                "account-transactions",
                "academic-status",
                "classification",
                "grades",
                "class-schedule",
                "holds",
                "work-study",
                "dual-enrollment",
                "degrees",
                "emergency-contacts",
            ],
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
