//! Repository traits, one per aggregate, plus their Postgres implementations.
//!
//! Services only ever see the `Dyn*Repository` handles, so the same workflow
//! code runs against Postgres in production and against the in-memory store
//! in tests.

mod customers;
mod menu;
mod orders;
mod reservations;
mod restaurant;
mod users;

pub use customers::PgCustomerRepository;
pub use menu::PgMenuRepository;
pub use orders::PgOrderRepository;
pub use reservations::PgReservationRepository;
pub use restaurant::PgRestaurantRepository;
pub use users::PgUserRepository;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    Customer, ItemModifier, MenuCategory, MenuItem, Order, OrderItem, Reservation, RestaurantConfig,
    RestaurantTable, User,
};
use crate::types::{OrderStatus, ReservationStatus};

pub type DynUserRepository = Arc<dyn UserRepository + Send + Sync>;
pub type DynCustomerRepository = Arc<dyn CustomerRepository + Send + Sync>;
pub type DynRestaurantRepository = Arc<dyn RestaurantRepository + Send + Sync>;
pub type DynMenuRepository = Arc<dyn MenuRepository + Send + Sync>;
pub type DynOrderRepository = Arc<dyn OrderRepository + Send + Sync>;
pub type DynReservationRepository = Arc<dyn ReservationRepository + Send + Sync>;

#[async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
    /// Fails with `Conflict` when the email is taken.
    async fn insert(&self, user: &User) -> Result<User, DatabaseError>;
    async fn update(&self, user: &User) -> Result<User, DatabaseError>;
    /// Every non-customer account, active or not.
    async fn list_staff(&self) -> Result<Vec<User>, DatabaseError>;
}

#[async_trait]
pub trait CustomerRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DatabaseError>;
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Customer>, DatabaseError>;
    async fn find_by_phone(&self, phone: &str) -> Result<Option<Customer>, DatabaseError>;
    /// Fails with `Conflict` when the phone is taken.
    async fn insert(&self, customer: &Customer) -> Result<Customer, DatabaseError>;
    async fn update(&self, customer: &Customer) -> Result<Customer, DatabaseError>;
    async fn count(&self) -> Result<i64, DatabaseError>;
}

#[async_trait]
pub trait RestaurantRepository {
    async fn find_active(&self) -> Result<Option<RestaurantConfig>, DatabaseError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<RestaurantConfig>, DatabaseError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<RestaurantConfig>, DatabaseError>;
    async fn insert(&self, config: &RestaurantConfig) -> Result<RestaurantConfig, DatabaseError>;
    async fn update(&self, config: &RestaurantConfig) -> Result<RestaurantConfig, DatabaseError>;

    async fn list_tables(&self, active_only: bool) -> Result<Vec<RestaurantTable>, DatabaseError>;
    async fn find_table(&self, id: Uuid) -> Result<Option<RestaurantTable>, DatabaseError>;
    async fn insert_table(&self, table: &RestaurantTable) -> Result<RestaurantTable, DatabaseError>;
    async fn update_table(&self, table: &RestaurantTable) -> Result<RestaurantTable, DatabaseError>;
}

/// Filter for menu item listings. Empty filter lists every item.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    pub category_id: Option<Uuid>,
    pub available_only: bool,
    pub featured_only: bool,
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
}

#[async_trait]
pub trait MenuRepository {
    async fn list_categories(&self, include_inactive: bool) -> Result<Vec<MenuCategory>, DatabaseError>;
    async fn find_category(&self, id: Uuid) -> Result<Option<MenuCategory>, DatabaseError>;
    async fn insert_category(&self, category: &MenuCategory) -> Result<MenuCategory, DatabaseError>;
    async fn update_category(&self, category: &MenuCategory) -> Result<MenuCategory, DatabaseError>;
    async fn count_available_items(&self, category_id: Uuid) -> Result<i64, DatabaseError>;

    /// Ordered by sort order then name.
    async fn list_items(&self, query: &ItemQuery) -> Result<Vec<MenuItem>, DatabaseError>;
    async fn find_item(&self, id: Uuid) -> Result<Option<MenuItem>, DatabaseError>;
    async fn find_items(&self, ids: &[Uuid]) -> Result<Vec<MenuItem>, DatabaseError>;
    async fn insert_item(&self, item: &MenuItem) -> Result<MenuItem, DatabaseError>;
    async fn update_item(&self, item: &MenuItem) -> Result<MenuItem, DatabaseError>;
    async fn count_items(&self) -> Result<i64, DatabaseError>;

    async fn modifiers_for(&self, item_ids: &[Uuid]) -> Result<Vec<ItemModifier>, DatabaseError>;
    async fn find_modifier(&self, id: Uuid) -> Result<Option<ItemModifier>, DatabaseError>;
    async fn insert_modifier(&self, modifier: &ItemModifier) -> Result<ItemModifier, DatabaseError>;
    async fn update_modifier(&self, modifier: &ItemModifier) -> Result<ItemModifier, DatabaseError>;
    /// Returns false when nothing was deleted.
    async fn delete_modifier(&self, id: Uuid) -> Result<bool, DatabaseError>;
}

#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub statuses: Option<Vec<OrderStatus>>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub oldest_first: bool,
}

#[async_trait]
pub trait OrderRepository {
    /// Next value of the store-wide order number sequence.
    async fn next_sequence(&self) -> Result<i64, DatabaseError>;
    /// Persist an order and all of its items atomically.
    async fn insert(&self, order: &Order, items: &[OrderItem]) -> Result<(Order, Vec<OrderItem>), DatabaseError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DatabaseError>;
    async fn find_by_number(&self, order_number: &str) -> Result<Option<Order>, DatabaseError>;
    async fn items_for(&self, order_ids: &[Uuid]) -> Result<Vec<OrderItem>, DatabaseError>;
    async fn list(&self, query: &OrderQuery) -> Result<Vec<Order>, DatabaseError>;
    /// Writes the mutable columns: status, payment and progress stamps, tip and total.
    async fn update(&self, order: &Order) -> Result<Order, DatabaseError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReservationQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub phone: Option<String>,
    pub statuses: Option<Vec<ReservationStatus>>,
    pub newest_first: bool,
}

#[async_trait]
pub trait ReservationRepository {
    async fn insert(&self, reservation: &Reservation) -> Result<Reservation, DatabaseError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, DatabaseError>;
    async fn list(&self, query: &ReservationQuery) -> Result<Vec<Reservation>, DatabaseError>;
    async fn update(&self, reservation: &Reservation) -> Result<Reservation, DatabaseError>;
}

pub(crate) fn status_names<T: ToString>(statuses: &Option<Vec<T>>) -> Option<Vec<String>> {
    statuses
        .as_ref()
        .map(|list| list.iter().map(ToString::to_string).collect())
}
