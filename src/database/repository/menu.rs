use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{ItemQuery, MenuRepository};
use crate::database::manager::DatabaseError;
use crate::database::models::{ItemModifier, MenuCategory, MenuItem};

const CATEGORY_COLUMNS: &str = "id, name, description, sort_order, is_active, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, category_id, name, description, price, image_url, is_available, is_featured, \
                            preparation_minutes, ingredients, allergens, dietary_info, sort_order, \
                            created_at, updated_at";
const MODIFIER_COLUMNS: &str = "id, menu_item_id, name, price_adjustment, is_required, options, created_at";

pub struct PgMenuRepository {
    pool: PgPool,
}

impl PgMenuRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MenuRepository for PgMenuRepository {
    async fn list_categories(&self, include_inactive: bool) -> Result<Vec<MenuCategory>, DatabaseError> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM menu_categories \
             WHERE ($1 = true OR is_active = true) ORDER BY sort_order, name"
        );
        Ok(sqlx::query_as::<_, MenuCategory>(&sql)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<MenuCategory>, DatabaseError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM menu_categories WHERE id = $1");
        Ok(sqlx::query_as::<_, MenuCategory>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_category(&self, category: &MenuCategory) -> Result<MenuCategory, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO menu_categories (id, name, description, sort_order, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CATEGORY_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, MenuCategory>(&sql)
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.description)
            .bind(category.sort_order)
            .bind(category.is_active)
            .bind(category.created_at)
            .bind(category.updated_at)
            .fetch_one(&self.pool)
            .await?;
        info!("Created menu category '{}'", created.name);
        Ok(created)
    }

    async fn update_category(&self, category: &MenuCategory) -> Result<MenuCategory, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE menu_categories
            SET name = $2, description = $3, sort_order = $4, is_active = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "#
        );
        sqlx::query_as::<_, MenuCategory>(&sql)
            .bind(category.id)
            .bind(&category.name)
            .bind(&category.description)
            .bind(category.sort_order)
            .bind(category.is_active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("category {}", category.id)))
    }

    async fn count_available_items(&self, category_id: Uuid) -> Result<i64, DatabaseError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM menu_items WHERE category_id = $1 AND is_available = true")
                .bind(category_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn list_items(&self, query: &ItemQuery) -> Result<Vec<MenuItem>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {ITEM_COLUMNS} FROM menu_items
            WHERE ($1::uuid IS NULL OR category_id = $1)
              AND ($2 = false OR is_available = true)
              AND ($3 = false OR is_featured = true)
              AND ($4::text IS NULL OR name ILIKE '%' || $4 || '%' OR description ILIKE '%' || $4 || '%')
            ORDER BY sort_order, name
            "#
        );
        Ok(sqlx::query_as::<_, MenuItem>(&sql)
            .bind(query.category_id)
            .bind(query.available_only)
            .bind(query.featured_only)
            .bind(query.search.as_deref())
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<MenuItem>, DatabaseError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM menu_items WHERE id = $1");
        Ok(sqlx::query_as::<_, MenuItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_items(&self, ids: &[Uuid]) -> Result<Vec<MenuItem>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {ITEM_COLUMNS} FROM menu_items WHERE id = ANY($1)");
        Ok(sqlx::query_as::<_, MenuItem>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_item(&self, item: &MenuItem) -> Result<MenuItem, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO menu_items
                (id, category_id, name, description, price, image_url, is_available, is_featured,
                 preparation_minutes, ingredients, allergens, dietary_info, sort_order, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {ITEM_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, MenuItem>(&sql)
            .bind(item.id)
            .bind(item.category_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.price)
            .bind(&item.image_url)
            .bind(item.is_available)
            .bind(item.is_featured)
            .bind(item.preparation_minutes)
            .bind(&item.ingredients)
            .bind(&item.allergens)
            .bind(&item.dietary_info)
            .bind(item.sort_order)
            .bind(item.created_at)
            .bind(item.updated_at)
            .fetch_one(&self.pool)
            .await?;
        info!("Created menu item '{}' at {}", created.name, created.price);
        Ok(created)
    }

    async fn update_item(&self, item: &MenuItem) -> Result<MenuItem, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE menu_items
            SET category_id = $2, name = $3, description = $4, price = $5, image_url = $6,
                is_available = $7, is_featured = $8, preparation_minutes = $9, ingredients = $10,
                allergens = $11, dietary_info = $12, sort_order = $13, updated_at = NOW()
            WHERE id = $1
            RETURNING {ITEM_COLUMNS}
            "#
        );
        sqlx::query_as::<_, MenuItem>(&sql)
            .bind(item.id)
            .bind(item.category_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.price)
            .bind(&item.image_url)
            .bind(item.is_available)
            .bind(item.is_featured)
            .bind(item.preparation_minutes)
            .bind(&item.ingredients)
            .bind(&item.allergens)
            .bind(&item.dietary_info)
            .bind(item.sort_order)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("menu item {}", item.id)))
    }

    async fn count_items(&self) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM menu_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn modifiers_for(&self, item_ids: &[Uuid]) -> Result<Vec<ItemModifier>, DatabaseError> {
        if item_ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!(
            "SELECT {MODIFIER_COLUMNS} FROM item_modifiers WHERE menu_item_id = ANY($1) ORDER BY created_at"
        );
        Ok(sqlx::query_as::<_, ItemModifier>(&sql)
            .bind(item_ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_modifier(&self, id: Uuid) -> Result<Option<ItemModifier>, DatabaseError> {
        let sql = format!("SELECT {MODIFIER_COLUMNS} FROM item_modifiers WHERE id = $1");
        Ok(sqlx::query_as::<_, ItemModifier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_modifier(&self, modifier: &ItemModifier) -> Result<ItemModifier, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO item_modifiers (id, menu_item_id, name, price_adjustment, is_required, options, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {MODIFIER_COLUMNS}
            "#
        );
        Ok(sqlx::query_as::<_, ItemModifier>(&sql)
            .bind(modifier.id)
            .bind(modifier.menu_item_id)
            .bind(&modifier.name)
            .bind(modifier.price_adjustment)
            .bind(modifier.is_required)
            .bind(&modifier.options)
            .bind(modifier.created_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_modifier(&self, modifier: &ItemModifier) -> Result<ItemModifier, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE item_modifiers
            SET name = $2, price_adjustment = $3, is_required = $4, options = $5
            WHERE id = $1
            RETURNING {MODIFIER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, ItemModifier>(&sql)
            .bind(modifier.id)
            .bind(&modifier.name)
            .bind(modifier.price_adjustment)
            .bind(modifier.is_required)
            .bind(&modifier.options)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("modifier {}", modifier.id)))
    }

    async fn delete_modifier(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM item_modifiers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
