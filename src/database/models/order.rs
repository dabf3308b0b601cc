use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::customer::{Customer, DeliveryAddress};
use crate::types::{OrderStatus, OrderType, PaymentMethod, PaymentStatus};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub delivery_fee: Decimal,
    pub tip_amount: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub delivery_address: Option<Json<DeliveryAddress>>,
    pub table_number: Option<String>,
    pub notes: Option<String>,
    pub estimated_ready_time: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// subtotal + tax + delivery + tip - discount, from the stored components.
    pub fn computed_total(&self) -> Decimal {
        self.subtotal + self.tax_amount + self.delivery_fee + self.tip_amount - self.discount_amount
    }
}

/// Line of an order. Prices and modifiers are a snapshot taken at order time.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    pub item_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub modifiers: Json<Vec<ModifierSnapshot>>,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierSnapshot {
    pub id: Uuid,
    pub name: String,
    pub price_adjustment: Decimal,
    pub option: Option<String>,
}

/// Order with its items and customer, as returned by order procedures.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub customer: Option<Customer>,
}
