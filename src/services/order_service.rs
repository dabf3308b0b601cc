use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::config;
use crate::database::models::{Customer, DeliveryAddress, MenuItem, Order, OrderDetail, OrderItem};
use crate::database::repository::OrderQuery;
use crate::services::customer_service::{resolve_customer, ContactInfo};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::pricing::{self, ModifierChoice};
use crate::services::restaurant_service::local_midnight;
use crate::services::status::Transition;
use crate::state::AppState;
use crate::types::{OrderStatus, OrderType, PaymentMethod, PaymentStatus};

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub menu_item_id: Uuid,
    #[validate(range(min = 1, max = 99))]
    pub quantity: i32,
    #[serde(default)]
    pub modifiers: Vec<ModifierChoice>,
    #[validate(length(max = 500))]
    pub special_instructions: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CustomerInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderInput {
    pub order_type: OrderType,
    #[validate(length(min = 1, max = 50), nested)]
    pub items: Vec<OrderLineInput>,
    #[validate(nested)]
    pub customer: CustomerInput,
    #[validate(nested)]
    pub delivery_address: Option<DeliveryAddress>,
    #[validate(length(min = 1, max = 20))]
    pub table_number: Option<String>,
    #[serde(default = "default_payment_method")]
    pub payment_method: PaymentMethod,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

fn default_payment_method() -> PaymentMethod {
    PaymentMethod::Cash
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusInput {
    pub id: Uuid,
    pub status: OrderStatus,
    pub estimated_ready_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub reference: Option<String>,
    pub tip: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SalesStatsInput {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopItem {
    pub menu_item_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesStats {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub order_count: usize,
    pub cancelled_count: usize,
    pub revenue: Decimal,
    pub average_order_value: Decimal,
    pub by_type: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub top_items: Vec<TopItem>,
}

const TOP_ITEMS: usize = 10;

/// `<prefix>-YYYYMMDD-NNNN`; the sequence is store-wide so numbers never repeat.
pub fn format_order_number(prefix: &str, date: NaiveDate, sequence: i64) -> String {
    format!("{}-{}-{:04}", prefix, date.format("%Y%m%d"), sequence)
}

/// Place an order: price every line from the live menu, settle delivery,
/// resolve the customer and persist order and items together.
pub async fn create(state: &AppState, input: CreateOrderInput) -> ServiceResult<OrderDetail> {
    if input.order_type == OrderType::Delivery && input.delivery_address.is_none() {
        return Err(ServiceError::bad_request("Delivery orders need a delivery address"));
    }

    let restaurant = state.restaurant.find_active().await?;
    if let Some(restaurant) = &restaurant {
        let services = &restaurant.services;
        let offered = match input.order_type {
            OrderType::DineIn => services.dine_in,
            OrderType::Takeout => services.takeout,
            OrderType::Delivery => services.delivery,
        };
        if !offered {
            return Err(ServiceError::Forbidden(format!(
                "{} orders are not available",
                input.order_type
            )));
        }
    }

    let mut item_ids: Vec<Uuid> = input.items.iter().map(|l| l.menu_item_id).collect();
    item_ids.sort_unstable();
    item_ids.dedup();
    let menu: HashMap<Uuid, MenuItem> = state
        .menu
        .find_items(&item_ids)
        .await?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();
    let modifiers = state.menu.modifiers_for(&item_ids).await?;

    let order_id = Uuid::new_v4();
    let mut subtotal = Decimal::ZERO;
    let mut lines = Vec::with_capacity(input.items.len());
    for line in &input.items {
        let item = match menu.get(&line.menu_item_id) {
            Some(item) if item.is_available => item,
            _ => {
                return Err(ServiceError::not_found(format!(
                    "Menu item {} is not available",
                    line.menu_item_id
                )))
            }
        };
        let priced = pricing::price_line(item, &modifiers, &line.modifiers, line.quantity);
        subtotal += priced.total_price;
        lines.push(OrderItem {
            id: Uuid::new_v4(),
            order_id,
            menu_item_id: item.id,
            item_name: item.name.clone(),
            quantity: line.quantity,
            unit_price: priced.unit_price,
            total_price: priced.total_price,
            modifiers: Json(priced.modifiers),
            special_instructions: line.special_instructions.clone(),
        });
    }

    let delivery_fee = if input.order_type == OrderType::Delivery {
        let restaurant = restaurant
            .as_ref()
            .ok_or_else(|| ServiceError::not_found("Restaurant configuration"))?;
        pricing::delivery_fee(subtotal, &restaurant.delivery_config)?
    } else {
        Decimal::ZERO
    };

    let ordering = &config::config().ordering;
    let totals = pricing::totals(subtotal, ordering.tax_rate, delivery_fee);

    let contact = ContactInfo {
        phone: &input.customer.phone,
        name: Some(input.customer.name.as_str()),
        email: input.customer.email.as_deref(),
    };
    let mut customer = resolve_customer(state, contact, true).await?;
    if let Some(address) = &input.delivery_address {
        customer = remember_address(state, customer, address).await?;
    }

    let sequence = state.orders.next_sequence().await?;
    let now = Utc::now();
    let order = Order {
        id: order_id,
        order_number: format_order_number(&ordering.order_number_prefix, Local::now().date_naive(), sequence),
        customer_id: customer.id,
        order_type: input.order_type,
        status: OrderStatus::Pending,
        subtotal: totals.subtotal,
        tax_amount: totals.tax_amount,
        delivery_fee: totals.delivery_fee,
        tip_amount: totals.tip_amount,
        discount_amount: totals.discount_amount,
        total: totals.total,
        payment_status: PaymentStatus::Pending,
        payment_method: input.payment_method,
        payment_reference: None,
        delivery_address: input.delivery_address.map(Json),
        table_number: input.table_number,
        notes: input.notes,
        estimated_ready_time: None,
        ready_at: None,
        delivered_at: None,
        completed_at: None,
        cancelled_at: None,
        paid_at: None,
        created_at: now,
        updated_at: now,
    };

    let (order, items) = state.orders.insert(&order, &lines).await?;
    info!(
        "Order {} placed: {} lines, subtotal {}, total {}",
        order.order_number,
        items.len(),
        order.subtotal,
        order.total
    );
    Ok(OrderDetail {
        order,
        items,
        customer: Some(customer),
    })
}

async fn remember_address(state: &AppState, customer: Customer, address: &DeliveryAddress) -> ServiceResult<Customer> {
    if customer.addresses.iter().any(|a| a == address) {
        return Ok(customer);
    }
    let mut updated = customer;
    updated.addresses.push(address.clone());
    Ok(state.customers.update(&updated).await?)
}

/// Attach items and customers to a batch of orders, keeping their order.
async fn with_details(state: &AppState, orders: Vec<Order>) -> ServiceResult<Vec<OrderDetail>> {
    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut customer_ids: Vec<Uuid> = orders.iter().map(|o| o.customer_id).collect();
    customer_ids.sort_unstable();
    customer_ids.dedup();

    let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in state.orders.items_for(&order_ids).await? {
        items.entry(item.order_id).or_default().push(item);
    }
    let customers: HashMap<Uuid, Customer> = state
        .customers
        .find_by_ids(&customer_ids)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    Ok(orders
        .into_iter()
        .map(|order| OrderDetail {
            items: items.remove(&order.id).unwrap_or_default(),
            customer: customers.get(&order.customer_id).cloned(),
            order,
        })
        .collect())
}

async fn detail(state: &AppState, order: Order) -> ServiceResult<OrderDetail> {
    with_details(state, vec![order])
        .await?
        .pop()
        .ok_or_else(|| ServiceError::not_found("Order"))
}

async fn require_order(state: &AppState, id: Uuid) -> ServiceResult<Order> {
    state
        .orders
        .find_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Order"))
}

pub async fn by_order_number(state: &AppState, order_number: &str) -> ServiceResult<OrderDetail> {
    let order = state
        .orders
        .find_by_number(order_number.trim())
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("Order {}", order_number)))?;
    detail(state, order).await
}

pub async fn active_orders(state: &AppState) -> ServiceResult<Vec<OrderDetail>> {
    let orders = state
        .orders
        .list(&OrderQuery {
            statuses: Some(OrderStatus::ALL.iter().copied().filter(|s| s.is_active()).collect()),
            oldest_first: true,
            ..Default::default()
        })
        .await?;
    with_details(state, orders).await
}

pub async fn today_orders(state: &AppState, status: Option<OrderStatus>) -> ServiceResult<Vec<OrderDetail>> {
    let today = Local::now().date_naive();
    let orders = state
        .orders
        .list(&OrderQuery {
            statuses: status.map(|s| vec![s]),
            created_from: Some(local_midnight(today)),
            created_to: Some(local_midnight(today + Duration::days(1))),
            oldest_first: false,
        })
        .await?;
    with_details(state, orders).await
}

pub async fn kitchen_orders(state: &AppState) -> ServiceResult<Vec<OrderDetail>> {
    let orders = state
        .orders
        .list(&OrderQuery {
            statuses: Some(vec![OrderStatus::Confirmed, OrderStatus::Preparing]),
            oldest_first: true,
            ..Default::default()
        })
        .await?;
    with_details(state, orders).await
}

/// Move an order along its lifecycle and stamp the milestone times.
pub fn apply_status(order: &mut Order, next: OrderStatus, now: DateTime<Utc>) -> ServiceResult<Transition> {
    let transition = order.status.transition_to(next)?;
    if transition == Transition::Advance {
        order.status = next;
        match next {
            OrderStatus::Ready => order.ready_at = Some(now),
            OrderStatus::Delivered => order.delivered_at = Some(now),
            OrderStatus::Completed => order.completed_at = Some(now),
            OrderStatus::Cancelled => order.cancelled_at = Some(now),
            _ => {}
        }
    }
    Ok(transition)
}

pub async fn update_status(state: &AppState, input: UpdateStatusInput) -> ServiceResult<OrderDetail> {
    let mut order = require_order(state, input.id).await?;
    let previous = order.status;
    let transition = apply_status(&mut order, input.status, Utc::now()).map_err(|e| {
        warn!("Rejected status change on {}: {}", order.order_number, e);
        e
    })?;

    let eta_changed = input.estimated_ready_time.is_some() && input.estimated_ready_time != order.estimated_ready_time;
    if eta_changed {
        order.estimated_ready_time = input.estimated_ready_time;
    }
    if transition == Transition::Unchanged && !eta_changed {
        return detail(state, order).await;
    }

    let updated = state.orders.update(&order).await?;
    info!("Order {} moved {} -> {}", updated.order_number, previous, updated.status);
    detail(state, updated).await
}

/// Record payment. A tip is added on top of the stored components; the total
/// is always recomputed server-side.
pub fn apply_payment(order: &mut Order, input: &ConfirmPaymentInput, now: DateTime<Utc>) -> ServiceResult<()> {
    if order.status == OrderStatus::Cancelled {
        return Err(ServiceError::precondition("Cancelled orders cannot be paid"));
    }
    if order.payment_status == PaymentStatus::Paid {
        return Err(ServiceError::precondition("Order is already paid"));
    }
    if let Some(tip) = input.tip {
        if tip < Decimal::ZERO {
            return Err(ServiceError::bad_request("Tip cannot be negative"));
        }
        if tip > Decimal::ZERO {
            order.tip_amount = pricing::round_money(tip);
            order.total = order.computed_total();
        }
    }
    if let Some(method) = input.payment_method {
        order.payment_method = method;
    }
    order.payment_status = PaymentStatus::Paid;
    order.payment_reference = input.reference.clone();
    order.paid_at = Some(now);
    Ok(())
}

pub async fn confirm_payment(state: &AppState, input: ConfirmPaymentInput) -> ServiceResult<OrderDetail> {
    let mut order = require_order(state, input.id).await?;
    apply_payment(&mut order, &input, Utc::now())?;
    let updated = state.orders.update(&order).await?;
    info!("Order {} paid, total {}", updated.order_number, updated.total);
    detail(state, updated).await
}

pub async fn sales_stats(state: &AppState, input: SalesStatsInput) -> ServiceResult<SalesStats> {
    let today = Local::now().date_naive();
    let from = input.from.unwrap_or(today);
    let to = input.to.unwrap_or(from.max(today));
    if from > to {
        return Err(ServiceError::bad_request("'from' must not be after 'to'"));
    }

    let orders = state
        .orders
        .list(&OrderQuery {
            created_from: Some(local_midnight(from)),
            created_to: Some(local_midnight(to + Duration::days(1))),
            ..Default::default()
        })
        .await?;
    let details = with_details(state, orders).await?;
    Ok(summarize(from, to, &details))
}

/// Aggregate a period's orders. Cancelled orders count by status only.
pub fn summarize(from: NaiveDate, to: NaiveDate, orders: &[OrderDetail]) -> SalesStats {
    let mut by_type = BTreeMap::new();
    let mut by_status = BTreeMap::new();
    let mut items: HashMap<Uuid, TopItem> = HashMap::new();
    let mut revenue = Decimal::ZERO;
    let mut order_count = 0;

    for detail in orders {
        let order = &detail.order;
        *by_status.entry(order.status.to_string()).or_insert(0) += 1;
        if order.status == OrderStatus::Cancelled {
            continue;
        }
        order_count += 1;
        revenue += order.total;
        *by_type.entry(order.order_type.to_string()).or_insert(0) += 1;
        for item in &detail.items {
            let entry = items.entry(item.menu_item_id).or_insert_with(|| TopItem {
                menu_item_id: item.menu_item_id,
                name: item.item_name.clone(),
                quantity: 0,
                revenue: Decimal::ZERO,
            });
            entry.quantity += i64::from(item.quantity);
            entry.revenue += item.total_price;
        }
    }

    let mut top_items: Vec<TopItem> = items.into_values().collect();
    top_items.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
    top_items.truncate(TOP_ITEMS);

    let average_order_value = if order_count == 0 {
        Decimal::ZERO
    } else {
        pricing::round_money(revenue / Decimal::from(order_count))
    };

    SalesStats {
        from,
        to,
        order_count,
        cancelled_count: by_status.get(OrderStatus::Cancelled.as_str()).copied().unwrap_or(0),
        revenue,
        average_order_value,
        by_type,
        by_status,
        top_items,
    }
}
