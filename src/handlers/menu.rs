// handlers/menu.rs - menu.* procedures
//
// Reads are public, toggleAvailability is open to the kitchen, every other
// mutation is admin only.

use axum::{extract::State, routing::post, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{guarded, IdInput};
use crate::auth::{Guard, ADMIN_ONLY, KITCHEN_STAFF};
use crate::database::models::{ItemModifier, MenuCategory, MenuItem};
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::services::menu_service::{
    self, CategoryWithItems, CreateCategoryInput, CreateItemInput, CreateModifierInput, ItemWithModifiers,
    UpdateCategoryInput, UpdateItemInput, UpdateModifierInput,
};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesInput {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CategoryIdInput {
    pub category_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchInput {
    #[validate(length(max = 100))]
    pub query: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ToggleAvailabilityInput {
    pub id: Uuid,
    pub is_available: bool,
}

pub fn routes() -> Router<AppState> {
    let public = Router::new()
        .route("/rpc/menu.getCategories", post(get_categories))
        .route("/rpc/menu.getFullMenu", post(get_full_menu))
        .route("/rpc/menu.getItemsByCategory", post(get_items_by_category))
        .route("/rpc/menu.getItem", post(get_item))
        .route("/rpc/menu.getFeaturedItems", post(get_featured_items))
        .route("/rpc/menu.searchItems", post(search_items));

    let kitchen = guarded(
        Router::new().route("/rpc/menu.toggleAvailability", post(toggle_availability)),
        Guard::Roles(KITCHEN_STAFF),
    );

    let admin = guarded(
        Router::new()
            .route("/rpc/menu.createCategory", post(create_category))
            .route("/rpc/menu.updateCategory", post(update_category))
            .route("/rpc/menu.deleteCategory", post(delete_category))
            .route("/rpc/menu.createItem", post(create_item))
            .route("/rpc/menu.updateItem", post(update_item))
            .route("/rpc/menu.createModifier", post(create_modifier))
            .route("/rpc/menu.updateModifier", post(update_modifier))
            .route("/rpc/menu.deleteModifier", post(delete_modifier)),
        Guard::Roles(ADMIN_ONLY),
    );

    public.merge(kitchen).merge(admin)
}

async fn get_categories(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CategoriesInput>,
) -> ApiResult<Vec<MenuCategory>> {
    Ok(ApiResponse::success(menu_service::categories(&state, input.include_inactive).await?))
}

async fn get_full_menu(State(state): State<AppState>) -> ApiResult<Vec<CategoryWithItems>> {
    Ok(ApiResponse::success(menu_service::full_menu(&state).await?))
}

async fn get_items_by_category(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CategoryIdInput>,
) -> ApiResult<Vec<ItemWithModifiers>> {
    Ok(ApiResponse::success(menu_service::items_by_category(&state, input.category_id).await?))
}

async fn get_item(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<IdInput>,
) -> ApiResult<ItemWithModifiers> {
    Ok(ApiResponse::success(menu_service::item(&state, input.id).await?))
}

async fn get_featured_items(State(state): State<AppState>) -> ApiResult<Vec<ItemWithModifiers>> {
    Ok(ApiResponse::success(menu_service::featured_items(&state).await?))
}

async fn search_items(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<SearchInput>,
) -> ApiResult<Vec<MenuItem>> {
    Ok(ApiResponse::success(menu_service::search_items(&state, &input.query).await?))
}

async fn toggle_availability(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ToggleAvailabilityInput>,
) -> ApiResult<MenuItem> {
    Ok(ApiResponse::success(
        menu_service::set_availability(&state, input.id, input.is_available).await?,
    ))
}

async fn create_category(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateCategoryInput>,
) -> ApiResult<MenuCategory> {
    Ok(ApiResponse::success(menu_service::create_category(&state, input).await?))
}

async fn update_category(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpdateCategoryInput>,
) -> ApiResult<MenuCategory> {
    Ok(ApiResponse::success(menu_service::update_category(&state, input).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<IdInput>,
) -> ApiResult<MenuCategory> {
    Ok(ApiResponse::success(menu_service::delete_category(&state, input.id).await?))
}

async fn create_item(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateItemInput>,
) -> ApiResult<MenuItem> {
    Ok(ApiResponse::success(menu_service::create_item(&state, input).await?))
}

async fn update_item(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpdateItemInput>,
) -> ApiResult<MenuItem> {
    Ok(ApiResponse::success(menu_service::update_item(&state, input).await?))
}

async fn create_modifier(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateModifierInput>,
) -> ApiResult<ItemModifier> {
    Ok(ApiResponse::success(menu_service::create_modifier(&state, input).await?))
}

async fn update_modifier(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpdateModifierInput>,
) -> ApiResult<ItemModifier> {
    Ok(ApiResponse::success(menu_service::update_modifier(&state, input).await?))
}

async fn delete_modifier(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<IdInput>,
) -> ApiResult<serde_json::Value> {
    menu_service::delete_modifier(&state, input.id).await?;
    Ok(ApiResponse::success(serde_json::json!({ "id": input.id, "deleted": true })))
}
