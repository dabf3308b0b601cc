pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Build the full HTTP application over the given repositories.
pub fn app(state: AppState) -> Router {
    let config = config::config();

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health::health))
        .merge(handlers::rpc_routes())
        .fallback(unknown_procedure)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_identity,
        ))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn unknown_procedure() -> impl IntoResponse {
    ApiError::not_found("Unknown procedure")
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Ordo",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Restaurant ordering and reservation API",
            "transport": "POST /rpc/<router>.<procedure>",
            "routers": ["auth", "restaurant", "menu", "order", "reservation"],
            "health": ["/health", "/rpc/health"],
        }
    }))
}
