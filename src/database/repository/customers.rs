use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::CustomerRepository;
use crate::database::manager::DatabaseError;
use crate::database::models::Customer;

const CUSTOMER_COLUMNS: &str = "id, phone, name, email, addresses, created_at, updated_at";

pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DatabaseError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1");
        Ok(sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Customer>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ANY($1)");
        Ok(sqlx::query_as::<_, Customer>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<Customer>, DatabaseError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone = $1");
        Ok(sqlx::query_as::<_, Customer>(&sql)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, customer: &Customer) -> Result<Customer, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO customers (id, phone, name, email, addresses, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, Customer>(&sql)
            .bind(customer.id)
            .bind(&customer.phone)
            .bind(&customer.name)
            .bind(&customer.email)
            .bind(&customer.addresses)
            .bind(customer.created_at)
            .bind(customer.updated_at)
            .fetch_one(&self.pool)
            .await?;
        info!("Created customer {}", created.id);
        Ok(created)
    }

    async fn update(&self, customer: &Customer) -> Result<Customer, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE customers
            SET name = $2, email = $3, addresses = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Customer>(&sql)
            .bind(customer.id)
            .bind(&customer.name)
            .bind(&customer.email)
            .bind(&customer.addresses)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("customer {}", customer.id)))
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
