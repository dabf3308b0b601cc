use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{status_names, OrderQuery, OrderRepository};
use crate::database::manager::DatabaseError;
use crate::database::models::{Order, OrderItem};

const ORDER_COLUMNS: &str = "id, order_number, customer_id, order_type, status, subtotal, tax_amount, \
                             delivery_fee, tip_amount, discount_amount, total, payment_status, payment_method, \
                             payment_reference, delivery_address, table_number, notes, estimated_ready_time, \
                             ready_at, delivered_at, completed_at, cancelled_at, paid_at, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, order_id, menu_item_id, item_name, quantity, unit_price, total_price, \
                            modifiers, special_instructions";

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn next_sequence(&self) -> Result<i64, DatabaseError> {
        let (value,): (i64,) = sqlx::query_as("SELECT nextval('order_number_seq')")
            .fetch_one(&self.pool)
            .await?;
        Ok(value)
    }

    async fn insert(&self, order: &Order, items: &[OrderItem]) -> Result<(Order, Vec<OrderItem>), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO orders
                (id, order_number, customer_id, order_type, status, subtotal, tax_amount, delivery_fee,
                 tip_amount, discount_amount, total, payment_status, payment_method, payment_reference,
                 delivery_address, table_number, notes, estimated_ready_time, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, Order>(&sql)
            .bind(order.id)
            .bind(&order.order_number)
            .bind(order.customer_id)
            .bind(order.order_type)
            .bind(order.status)
            .bind(order.subtotal)
            .bind(order.tax_amount)
            .bind(order.delivery_fee)
            .bind(order.tip_amount)
            .bind(order.discount_amount)
            .bind(order.total)
            .bind(order.payment_status)
            .bind(order.payment_method)
            .bind(&order.payment_reference)
            .bind(&order.delivery_address)
            .bind(&order.table_number)
            .bind(&order.notes)
            .bind(order.estimated_ready_time)
            .bind(order.created_at)
            .bind(order.updated_at)
            .fetch_one(&mut *tx)
            .await?;

        let item_sql = format!(
            r#"
            INSERT INTO order_items
                (id, order_id, menu_item_id, item_name, quantity, unit_price, total_price, modifiers,
                 special_instructions)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ITEM_COLUMNS}
            "#
        );
        let mut stored = Vec::with_capacity(items.len());
        for item in items {
            let row = sqlx::query_as::<_, OrderItem>(&item_sql)
                .bind(item.id)
                .bind(created.id)
                .bind(item.menu_item_id)
                .bind(&item.item_name)
                .bind(item.quantity)
                .bind(item.unit_price)
                .bind(item.total_price)
                .bind(&item.modifiers)
                .bind(&item.special_instructions)
                .fetch_one(&mut *tx)
                .await?;
            stored.push(row);
        }

        tx.commit().await?;
        info!(
            "Created order {} with {} items, total {}",
            created.order_number,
            stored.len(),
            created.total
        );
        Ok((created, stored))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DatabaseError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        Ok(sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_number(&self, order_number: &str) -> Result<Option<Order>, DatabaseError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1");
        Ok(sqlx::query_as::<_, Order>(&sql)
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn items_for(&self, order_ids: &[Uuid]) -> Result<Vec<OrderItem>, DatabaseError> {
        if order_ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY item_name");
        Ok(sqlx::query_as::<_, OrderItem>(&sql)
            .bind(order_ids)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list(&self, query: &OrderQuery) -> Result<Vec<Order>, DatabaseError> {
        let direction = if query.oldest_first { "ASC" } else { "DESC" };
        let sql = format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE ($1::text[] IS NULL OR status::text = ANY($1))
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at < $3)
            ORDER BY created_at {direction}
            "#
        );
        Ok(sqlx::query_as::<_, Order>(&sql)
            .bind(status_names(&query.statuses))
            .bind(query.created_from)
            .bind(query.created_to)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update(&self, order: &Order) -> Result<Order, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE orders
            SET status = $2, payment_status = $3, payment_method = $4, payment_reference = $5,
                tip_amount = $6, total = $7, estimated_ready_time = $8, ready_at = $9,
                delivered_at = $10, completed_at = $11, cancelled_at = $12, paid_at = $13,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Order>(&sql)
            .bind(order.id)
            .bind(order.status)
            .bind(order.payment_status)
            .bind(order.payment_method)
            .bind(&order.payment_reference)
            .bind(order.tip_amount)
            .bind(order.total)
            .bind(order.estimated_ready_time)
            .bind(order.ready_at)
            .bind(order.delivered_at)
            .bind(order.completed_at)
            .bind(order.cancelled_at)
            .bind(order.paid_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("order {}", order.id)))
    }
}
