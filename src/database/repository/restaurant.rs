use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::RestaurantRepository;
use crate::database::manager::DatabaseError;
use crate::database::models::{RestaurantConfig, RestaurantTable};

const CONFIG_COLUMNS: &str = "id, slug, name, phone, address, opening_hours, services, delivery_config, \
                              branding, is_active, created_at, updated_at";
const TABLE_COLUMNS: &str = "id, label, seats, is_active, created_at";

pub struct PgRestaurantRepository {
    pool: PgPool,
}

impl PgRestaurantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RestaurantRepository for PgRestaurantRepository {
    async fn find_active(&self) -> Result<Option<RestaurantConfig>, DatabaseError> {
        let sql = format!(
            "SELECT {CONFIG_COLUMNS} FROM restaurant_config WHERE is_active = true ORDER BY created_at LIMIT 1"
        );
        Ok(sqlx::query_as::<_, RestaurantConfig>(&sql)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RestaurantConfig>, DatabaseError> {
        let sql = format!("SELECT {CONFIG_COLUMNS} FROM restaurant_config WHERE id = $1");
        Ok(sqlx::query_as::<_, RestaurantConfig>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<RestaurantConfig>, DatabaseError> {
        let sql = format!("SELECT {CONFIG_COLUMNS} FROM restaurant_config WHERE slug = $1");
        Ok(sqlx::query_as::<_, RestaurantConfig>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, config: &RestaurantConfig) -> Result<RestaurantConfig, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO restaurant_config
                (id, slug, name, phone, address, opening_hours, services, delivery_config,
                 branding, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {CONFIG_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, RestaurantConfig>(&sql)
            .bind(config.id)
            .bind(&config.slug)
            .bind(&config.name)
            .bind(&config.phone)
            .bind(&config.address)
            .bind(&config.opening_hours)
            .bind(&config.services)
            .bind(&config.delivery_config)
            .bind(&config.branding)
            .bind(config.is_active)
            .bind(config.created_at)
            .bind(config.updated_at)
            .fetch_one(&self.pool)
            .await?;
        info!("Created restaurant config '{}'", created.slug);
        Ok(created)
    }

    async fn update(&self, config: &RestaurantConfig) -> Result<RestaurantConfig, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE restaurant_config
            SET slug = $2, name = $3, phone = $4, address = $5, opening_hours = $6, services = $7,
                delivery_config = $8, branding = $9, is_active = $10, updated_at = NOW()
            WHERE id = $1
            RETURNING {CONFIG_COLUMNS}
            "#
        );
        sqlx::query_as::<_, RestaurantConfig>(&sql)
            .bind(config.id)
            .bind(&config.slug)
            .bind(&config.name)
            .bind(&config.phone)
            .bind(&config.address)
            .bind(&config.opening_hours)
            .bind(&config.services)
            .bind(&config.delivery_config)
            .bind(&config.branding)
            .bind(config.is_active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("restaurant config {}", config.id)))
    }

    async fn list_tables(&self, active_only: bool) -> Result<Vec<RestaurantTable>, DatabaseError> {
        let sql = format!(
            "SELECT {TABLE_COLUMNS} FROM restaurant_tables WHERE ($1 = false OR is_active = true) ORDER BY label"
        );
        Ok(sqlx::query_as::<_, RestaurantTable>(&sql)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_table(&self, id: Uuid) -> Result<Option<RestaurantTable>, DatabaseError> {
        let sql = format!("SELECT {TABLE_COLUMNS} FROM restaurant_tables WHERE id = $1");
        Ok(sqlx::query_as::<_, RestaurantTable>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_table(&self, table: &RestaurantTable) -> Result<RestaurantTable, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO restaurant_tables (id, label, seats, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TABLE_COLUMNS}
            "#
        );
        Ok(sqlx::query_as::<_, RestaurantTable>(&sql)
            .bind(table.id)
            .bind(&table.label)
            .bind(table.seats)
            .bind(table.is_active)
            .bind(table.created_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_table(&self, table: &RestaurantTable) -> Result<RestaurantTable, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE restaurant_tables SET label = $2, seats = $3, is_active = $4
            WHERE id = $1
            RETURNING {TABLE_COLUMNS}
            "#
        );
        sqlx::query_as::<_, RestaurantTable>(&sql)
            .bind(table.id)
            .bind(&table.label)
            .bind(table.seats)
            .bind(table.is_active)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("table {}", table.id)))
    }
}
