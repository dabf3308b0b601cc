use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use super::UserRepository;
use crate::database::manager::DatabaseError;
use crate::database::models::User;

const USER_COLUMNS: &str = "id, email, name, password_hash, role, is_active, phone, created_at, updated_at";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert(&self, user: &User) -> Result<User, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO users (id, email, name, password_hash, role, is_active, phone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.is_active)
            .bind(&user.phone)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to insert user {}: {}", user.email, e);
                DatabaseError::from(e)
            })?;

        info!("Created user {} with role {}", created.id, created.role);
        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<User, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE users
            SET name = $2, role = $3, is_active = $4, phone = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(user.role)
            .bind(user.is_active)
            .bind(&user.phone)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", user.id)))
    }

    async fn list_staff(&self) -> Result<Vec<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role <> 'CUSTOMER' ORDER BY name");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }
}
