use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MenuCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub is_featured: bool,
    pub preparation_minutes: Option<i32>,
    pub ingredients: Vec<String>,
    pub allergens: Vec<String>,
    pub dietary_info: Json<DietaryInfo>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DietaryInfo {
    pub vegetarian: bool,
    pub vegan: bool,
    pub gluten_free: bool,
    pub spicy: bool,
    pub calories: Option<i32>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ItemModifier {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub name: String,
    pub price_adjustment: Decimal,
    pub is_required: bool,
    pub options: Vec<String>,
    pub created_at: DateTime<Utc>,
}
