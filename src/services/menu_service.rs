use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::database::models::{DietaryInfo, ItemModifier, MenuCategory, MenuItem};
use crate::database::repository::ItemQuery;
use crate::services::error::{ServiceError, ServiceResult};
use crate::state::AppState;

fn positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("price").with_message("Price must be greater than zero".into()))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 80))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemInput {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(custom(function = "positive_price"))]
    pub price: Decimal,
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[validate(range(min = 0, max = 600))]
    pub preparation_minutes: Option<i32>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub dietary_info: DietaryInfo,
    #[serde(default)]
    pub sort_order: i32,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemInput {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(custom(function = "positive_price"))]
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
    pub is_featured: Option<bool>,
    #[validate(range(min = 0, max = 600))]
    pub preparation_minutes: Option<i32>,
    pub ingredients: Option<Vec<String>>,
    pub allergens: Option<Vec<String>>,
    pub dietary_info: Option<DietaryInfo>,
    pub sort_order: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateModifierInput {
    pub menu_item_id: Uuid,
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[serde(default)]
    pub price_adjustment: Decimal,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModifierInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 80))]
    pub name: Option<String>,
    pub price_adjustment: Option<Decimal>,
    pub is_required: Option<bool>,
    pub options: Option<Vec<String>>,
}

/// Item with its modifiers, as shown to customers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemWithModifiers {
    #[serde(flatten)]
    pub item: MenuItem,
    pub modifiers: Vec<ItemModifier>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithItems {
    #[serde(flatten)]
    pub category: MenuCategory,
    pub items: Vec<ItemWithModifiers>,
}

async fn attach_modifiers(state: &AppState, items: Vec<MenuItem>) -> ServiceResult<Vec<ItemWithModifiers>> {
    let ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
    let mut by_item: HashMap<Uuid, Vec<ItemModifier>> = HashMap::new();
    for modifier in state.menu.modifiers_for(&ids).await? {
        by_item.entry(modifier.menu_item_id).or_default().push(modifier);
    }
    Ok(items
        .into_iter()
        .map(|item| {
            let modifiers = by_item.remove(&item.id).unwrap_or_default();
            ItemWithModifiers { item, modifiers }
        })
        .collect())
}

async fn require_item(state: &AppState, id: Uuid) -> ServiceResult<MenuItem> {
    state
        .menu
        .find_item(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Menu item"))
}

async fn require_category(state: &AppState, id: Uuid) -> ServiceResult<MenuCategory> {
    state
        .menu
        .find_category(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Category"))
}

pub async fn categories(state: &AppState, include_inactive: bool) -> ServiceResult<Vec<MenuCategory>> {
    Ok(state.menu.list_categories(include_inactive).await?)
}

pub async fn create_category(state: &AppState, input: CreateCategoryInput) -> ServiceResult<MenuCategory> {
    let now = Utc::now();
    let category = MenuCategory {
        id: Uuid::new_v4(),
        name: input.name,
        description: input.description,
        sort_order: input.sort_order,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    Ok(state.menu.insert_category(&category).await?)
}

pub async fn update_category(state: &AppState, input: UpdateCategoryInput) -> ServiceResult<MenuCategory> {
    let mut category = require_category(state, input.id).await?;
    if let Some(name) = input.name {
        category.name = name;
    }
    if input.description.is_some() {
        category.description = input.description;
    }
    if let Some(sort_order) = input.sort_order {
        category.sort_order = sort_order;
    }
    if let Some(is_active) = input.is_active {
        category.is_active = is_active;
    }
    Ok(state.menu.update_category(&category).await?)
}

/// Retire a category. Blocked while it still offers available items.
pub async fn delete_category(state: &AppState, id: Uuid) -> ServiceResult<MenuCategory> {
    let mut category = require_category(state, id).await?;
    let available = state.menu.count_available_items(id).await?;
    if available > 0 {
        return Err(ServiceError::precondition(format!(
            "Category '{}' still has {} available items",
            category.name, available
        )));
    }
    category.is_active = false;
    let updated = state.menu.update_category(&category).await?;
    info!("Deactivated category '{}'", updated.name);
    Ok(updated)
}

pub async fn full_menu(state: &AppState) -> ServiceResult<Vec<CategoryWithItems>> {
    let categories = state.menu.list_categories(false).await?;
    let items = state
        .menu
        .list_items(&ItemQuery {
            available_only: true,
            ..Default::default()
        })
        .await?;
    let mut by_category: HashMap<Uuid, Vec<ItemWithModifiers>> = HashMap::new();
    for item in attach_modifiers(state, items).await? {
        by_category.entry(item.item.category_id).or_default().push(item);
    }

    Ok(categories
        .into_iter()
        .map(|category| {
            let items = by_category.remove(&category.id).unwrap_or_default();
            CategoryWithItems { category, items }
        })
        .collect())
}

pub async fn items_by_category(state: &AppState, category_id: Uuid) -> ServiceResult<Vec<ItemWithModifiers>> {
    let items = state
        .menu
        .list_items(&ItemQuery {
            category_id: Some(category_id),
            available_only: true,
            ..Default::default()
        })
        .await?;
    attach_modifiers(state, items).await
}

pub async fn item(state: &AppState, id: Uuid) -> ServiceResult<ItemWithModifiers> {
    let item = require_item(state, id).await?;
    let mut with = attach_modifiers(state, vec![item]).await?;
    with.pop().ok_or_else(|| ServiceError::not_found("Menu item"))
}

pub async fn featured_items(state: &AppState) -> ServiceResult<Vec<ItemWithModifiers>> {
    let items = state
        .menu
        .list_items(&ItemQuery {
            available_only: true,
            featured_only: true,
            ..Default::default()
        })
        .await?;
    attach_modifiers(state, items).await
}

pub async fn search_items(state: &AppState, query: &str) -> ServiceResult<Vec<MenuItem>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(vec![]);
    }
    Ok(state
        .menu
        .list_items(&ItemQuery {
            available_only: true,
            search: Some(query.to_string()),
            ..Default::default()
        })
        .await?)
}

pub async fn create_item(state: &AppState, input: CreateItemInput) -> ServiceResult<MenuItem> {
    require_category(state, input.category_id).await?;
    let now = Utc::now();
    let item = MenuItem {
        id: Uuid::new_v4(),
        category_id: input.category_id,
        name: input.name,
        description: input.description,
        price: input.price,
        image_url: input.image_url,
        is_available: input.is_available,
        is_featured: input.is_featured,
        preparation_minutes: input.preparation_minutes,
        ingredients: input.ingredients,
        allergens: input.allergens,
        dietary_info: Json(input.dietary_info),
        sort_order: input.sort_order,
        created_at: now,
        updated_at: now,
    };
    Ok(state.menu.insert_item(&item).await?)
}

pub async fn update_item(state: &AppState, input: UpdateItemInput) -> ServiceResult<MenuItem> {
    let mut item = require_item(state, input.id).await?;
    if let Some(category_id) = input.category_id {
        require_category(state, category_id).await?;
        item.category_id = category_id;
    }
    if let Some(name) = input.name {
        item.name = name;
    }
    if input.description.is_some() {
        item.description = input.description;
    }
    if let Some(price) = input.price {
        item.price = price;
    }
    if input.image_url.is_some() {
        item.image_url = input.image_url;
    }
    if let Some(is_available) = input.is_available {
        item.is_available = is_available;
    }
    if let Some(is_featured) = input.is_featured {
        item.is_featured = is_featured;
    }
    if input.preparation_minutes.is_some() {
        item.preparation_minutes = input.preparation_minutes;
    }
    if let Some(ingredients) = input.ingredients {
        item.ingredients = ingredients;
    }
    if let Some(allergens) = input.allergens {
        item.allergens = allergens;
    }
    if let Some(dietary_info) = input.dietary_info {
        item.dietary_info = Json(dietary_info);
    }
    if let Some(sort_order) = input.sort_order {
        item.sort_order = sort_order;
    }
    Ok(state.menu.update_item(&item).await?)
}

/// Sets availability; repeating the same value is not an error.
pub async fn set_availability(state: &AppState, id: Uuid, is_available: bool) -> ServiceResult<MenuItem> {
    let mut item = require_item(state, id).await?;
    if item.is_available == is_available {
        return Ok(item);
    }
    item.is_available = is_available;
    let updated = state.menu.update_item(&item).await?;
    info!("Menu item '{}' available: {}", updated.name, updated.is_available);
    Ok(updated)
}

pub async fn create_modifier(state: &AppState, input: CreateModifierInput) -> ServiceResult<ItemModifier> {
    require_item(state, input.menu_item_id).await?;
    let modifier = ItemModifier {
        id: Uuid::new_v4(),
        menu_item_id: input.menu_item_id,
        name: input.name,
        price_adjustment: input.price_adjustment,
        is_required: input.is_required,
        options: input.options,
        created_at: Utc::now(),
    };
    Ok(state.menu.insert_modifier(&modifier).await?)
}

pub async fn update_modifier(state: &AppState, input: UpdateModifierInput) -> ServiceResult<ItemModifier> {
    let mut modifier = state
        .menu
        .find_modifier(input.id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Modifier"))?;
    if let Some(name) = input.name {
        modifier.name = name;
    }
    if let Some(price_adjustment) = input.price_adjustment {
        modifier.price_adjustment = price_adjustment;
    }
    if let Some(is_required) = input.is_required {
        modifier.is_required = is_required;
    }
    if let Some(options) = input.options {
        modifier.options = options;
    }
    Ok(state.menu.update_modifier(&modifier).await?)
}

pub async fn delete_modifier(state: &AppState, id: Uuid) -> ServiceResult<()> {
    if !state.menu.delete_modifier(id).await? {
        return Err(ServiceError::not_found("Modifier"));
    }
    info!("Deleted modifier {}", id);
    Ok(())
}
