// handlers/health.rs - liveness probe, public

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/rpc/health", get(health).post(health))
}

/// `{status, timestamp, service}`; `database` is reported when a pool is attached.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let mut body = json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "service": "ordo",
    });

    if let Some(pool) = &state.pool {
        body["database"] = match DatabaseManager::health_check(pool).await {
            Ok(()) => json!("ok"),
            Err(e) => {
                tracing::warn!("Health check database ping failed: {}", e);
                json!("unavailable")
            }
        };
    }

    Json(body)
}
