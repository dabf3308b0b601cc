// handlers/restaurant.rs - restaurant.* procedures

use axum::{extract::State, routing::post, Router};
use serde::Deserialize;
use validator::Validate;

use super::guarded;
use crate::auth::{Guard, ADMIN_ONLY, ALL_STAFF};
use crate::database::models::{RestaurantConfig, RestaurantTable};
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::services::restaurant_service::{
    self, CreateRestaurantInput, CreateTableInput, OpenStatus, RestaurantStats, UpdateRestaurantInput,
    UpdateTableInput,
};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SlugInput {
    #[validate(length(min = 1, max = 60))]
    pub slug: String,
}

pub fn routes() -> Router<AppState> {
    let public = Router::new()
        .route("/rpc/restaurant.getConfig", post(get_config))
        .route("/rpc/restaurant.getBySlug", post(get_by_slug))
        .route("/rpc/restaurant.isOpen", post(is_open));

    let staff = guarded(
        Router::new().route("/rpc/restaurant.listTables", post(list_tables)),
        Guard::Roles(ALL_STAFF),
    );

    let admin = guarded(
        Router::new()
            .route("/rpc/restaurant.create", post(create))
            .route("/rpc/restaurant.update", post(update))
            .route("/rpc/restaurant.getStats", post(get_stats))
            .route("/rpc/restaurant.createTable", post(create_table))
            .route("/rpc/restaurant.updateTable", post(update_table)),
        Guard::Roles(ADMIN_ONLY),
    );

    public.merge(staff).merge(admin)
}

async fn get_config(State(state): State<AppState>) -> ApiResult<RestaurantConfig> {
    Ok(ApiResponse::success(restaurant_service::active_config(&state).await?))
}

async fn get_by_slug(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<SlugInput>,
) -> ApiResult<RestaurantConfig> {
    Ok(ApiResponse::success(restaurant_service::get_by_slug(&state, &input.slug).await?))
}

async fn is_open(State(state): State<AppState>) -> ApiResult<OpenStatus> {
    Ok(ApiResponse::success(restaurant_service::is_open(&state).await?))
}

async fn create(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateRestaurantInput>,
) -> ApiResult<RestaurantConfig> {
    Ok(ApiResponse::success(restaurant_service::create(&state, input).await?))
}

async fn update(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpdateRestaurantInput>,
) -> ApiResult<RestaurantConfig> {
    Ok(ApiResponse::success(restaurant_service::update(&state, input).await?))
}

async fn get_stats(State(state): State<AppState>) -> ApiResult<RestaurantStats> {
    Ok(ApiResponse::success(restaurant_service::stats(&state).await?))
}

async fn list_tables(State(state): State<AppState>) -> ApiResult<Vec<RestaurantTable>> {
    Ok(ApiResponse::success(restaurant_service::list_tables(&state).await?))
}

async fn create_table(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateTableInput>,
) -> ApiResult<RestaurantTable> {
    Ok(ApiResponse::success(restaurant_service::create_table(&state, input).await?))
}

async fn update_table(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpdateTableInput>,
) -> ApiResult<RestaurantTable> {
    Ok(ApiResponse::success(restaurant_service::update_table(&state, input).await?))
}
