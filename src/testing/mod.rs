//! In-memory repositories for integration tests.
//!
//! `MemoryStore` implements every repository trait over plain vectors behind
//! one lock. Unique keys (email, phone, slug, table label, order number)
//! raise `DatabaseError::Conflict` the same way the Postgres constraints do.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    Customer, ItemModifier, MenuCategory, MenuItem, Order, OrderItem, Reservation, RestaurantConfig,
    RestaurantTable, User,
};
use crate::database::repository::{
    CustomerRepository, ItemQuery, MenuRepository, OrderQuery, OrderRepository, ReservationQuery,
    ReservationRepository, RestaurantRepository, UserRepository,
};
use crate::database::DatabaseError;
use crate::state::AppState;
use crate::types::Role;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    customers: Vec<Customer>,
    configs: Vec<RestaurantConfig>,
    tables: Vec<RestaurantTable>,
    categories: Vec<MenuCategory>,
    items: Vec<MenuItem>,
    modifiers: Vec<ItemModifier>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    reservations: Vec<Reservation>,
    order_sequence: i64,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Application state whose every repository is this store.
    pub fn state(&self) -> AppState {
        AppState {
            users: Arc::new(self.clone()),
            customers: Arc::new(self.clone()),
            restaurant: Arc::new(self.clone()),
            menu: Arc::new(self.clone()),
            orders: Arc::new(self.clone()),
            reservations: Arc::new(self.clone()),
            pool: None,
        }
    }

    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }

    pub async fn customer_count(&self) -> usize {
        self.inner.read().await.customers.len()
    }

    pub async fn reservation_count(&self) -> usize {
        self.inner.read().await.reservations.len()
    }
}

impl AppState {
    /// State over a fresh, empty in-memory store.
    pub fn in_memory() -> (AppState, MemoryStore) {
        let store = MemoryStore::new();
        (store.state(), store)
    }
}

fn missing(what: &str, id: Uuid) -> DatabaseError {
    DatabaseError::NotFound(format!("{} {}", what, id))
}

fn replace<T: Clone>(rows: &mut [T], id: Uuid, key: impl Fn(&T) -> Uuid, row: &T, what: &str) -> Result<T, DatabaseError> {
    let slot = rows.iter_mut().find(|r| key(r) == id).ok_or_else(|| missing(what, id))?;
    *slot = row.clone();
    Ok(row.clone())
}

fn matches_search(item: &MenuItem, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    item.name.to_lowercase().contains(&needle)
        || item
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&needle))
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.inner.read().await.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let email = email.to_lowercase();
        Ok(self
            .inner
            .read()
            .await
            .users
            .iter()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn insert(&self, user: &User) -> Result<User, DatabaseError> {
        let mut tables = self.inner.write().await;
        let email = user.email.to_lowercase();
        if tables.users.iter().any(|u| u.email.to_lowercase() == email) {
            return Err(DatabaseError::Conflict("users_email_key".into()));
        }
        tables.users.push(user.clone());
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> Result<User, DatabaseError> {
        let mut tables = self.inner.write().await;
        replace(&mut tables.users, user.id, |u| u.id, user, "user")
    }

    async fn list_staff(&self) -> Result<Vec<User>, DatabaseError> {
        let mut staff: Vec<User> = self
            .inner
            .read()
            .await
            .users
            .iter()
            .filter(|u| u.role != Role::Customer)
            .cloned()
            .collect();
        staff.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(staff)
    }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, DatabaseError> {
        Ok(self.inner.read().await.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Customer>, DatabaseError> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        Ok(self
            .inner
            .read()
            .await
            .customers
            .iter()
            .filter(|c| wanted.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<Customer>, DatabaseError> {
        Ok(self
            .inner
            .read()
            .await
            .customers
            .iter()
            .find(|c| c.phone == phone)
            .cloned())
    }

    async fn insert(&self, customer: &Customer) -> Result<Customer, DatabaseError> {
        let mut tables = self.inner.write().await;
        if tables.customers.iter().any(|c| c.phone == customer.phone) {
            return Err(DatabaseError::Conflict("customers_phone_key".into()));
        }
        tables.customers.push(customer.clone());
        Ok(customer.clone())
    }

    async fn update(&self, customer: &Customer) -> Result<Customer, DatabaseError> {
        let mut tables = self.inner.write().await;
        replace(&mut tables.customers, customer.id, |c| c.id, customer, "customer")
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        Ok(self.inner.read().await.customers.len() as i64)
    }
}

#[async_trait]
impl RestaurantRepository for MemoryStore {
    async fn find_active(&self) -> Result<Option<RestaurantConfig>, DatabaseError> {
        let tables = self.inner.read().await;
        Ok(tables
            .configs
            .iter()
            .filter(|c| c.is_active)
            .min_by_key(|c| c.created_at)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RestaurantConfig>, DatabaseError> {
        Ok(self.inner.read().await.configs.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<RestaurantConfig>, DatabaseError> {
        Ok(self.inner.read().await.configs.iter().find(|c| c.slug == slug).cloned())
    }

    async fn insert(&self, config: &RestaurantConfig) -> Result<RestaurantConfig, DatabaseError> {
        let mut tables = self.inner.write().await;
        if tables.configs.iter().any(|c| c.slug == config.slug) {
            return Err(DatabaseError::Conflict("restaurant_config_slug_key".into()));
        }
        tables.configs.push(config.clone());
        Ok(config.clone())
    }

    async fn update(&self, config: &RestaurantConfig) -> Result<RestaurantConfig, DatabaseError> {
        let mut tables = self.inner.write().await;
        if tables.configs.iter().any(|c| c.slug == config.slug && c.id != config.id) {
            return Err(DatabaseError::Conflict("restaurant_config_slug_key".into()));
        }
        replace(&mut tables.configs, config.id, |c| c.id, config, "restaurant config")
    }

    async fn list_tables(&self, active_only: bool) -> Result<Vec<RestaurantTable>, DatabaseError> {
        let mut tables: Vec<RestaurantTable> = self
            .inner
            .read()
            .await
            .tables
            .iter()
            .filter(|t| !active_only || t.is_active)
            .cloned()
            .collect();
        tables.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(tables)
    }

    async fn find_table(&self, id: Uuid) -> Result<Option<RestaurantTable>, DatabaseError> {
        Ok(self.inner.read().await.tables.iter().find(|t| t.id == id).cloned())
    }

    async fn insert_table(&self, table: &RestaurantTable) -> Result<RestaurantTable, DatabaseError> {
        let mut tables = self.inner.write().await;
        if tables.tables.iter().any(|t| t.label == table.label) {
            return Err(DatabaseError::Conflict("restaurant_tables_label_key".into()));
        }
        tables.tables.push(table.clone());
        Ok(table.clone())
    }

    async fn update_table(&self, table: &RestaurantTable) -> Result<RestaurantTable, DatabaseError> {
        let mut tables = self.inner.write().await;
        if tables.tables.iter().any(|t| t.label == table.label && t.id != table.id) {
            return Err(DatabaseError::Conflict("restaurant_tables_label_key".into()));
        }
        replace(&mut tables.tables, table.id, |t| t.id, table, "table")
    }
}

#[async_trait]
impl MenuRepository for MemoryStore {
    async fn list_categories(&self, include_inactive: bool) -> Result<Vec<MenuCategory>, DatabaseError> {
        let mut categories: Vec<MenuCategory> = self
            .inner
            .read()
            .await
            .categories
            .iter()
            .filter(|c| include_inactive || c.is_active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        Ok(categories)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<MenuCategory>, DatabaseError> {
        Ok(self.inner.read().await.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_category(&self, category: &MenuCategory) -> Result<MenuCategory, DatabaseError> {
        self.inner.write().await.categories.push(category.clone());
        Ok(category.clone())
    }

    async fn update_category(&self, category: &MenuCategory) -> Result<MenuCategory, DatabaseError> {
        let mut tables = self.inner.write().await;
        replace(&mut tables.categories, category.id, |c| c.id, category, "category")
    }

    async fn count_available_items(&self, category_id: Uuid) -> Result<i64, DatabaseError> {
        let tables = self.inner.read().await;
        Ok(tables
            .items
            .iter()
            .filter(|i| i.category_id == category_id && i.is_available)
            .count() as i64)
    }

    async fn list_items(&self, query: &ItemQuery) -> Result<Vec<MenuItem>, DatabaseError> {
        let mut items: Vec<MenuItem> = self
            .inner
            .read()
            .await
            .items
            .iter()
            .filter(|i| query.category_id.map_or(true, |id| i.category_id == id))
            .filter(|i| !query.available_only || i.is_available)
            .filter(|i| !query.featured_only || i.is_featured)
            .filter(|i| query.search.as_deref().map_or(true, |s| matches_search(i, s)))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        Ok(items)
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<MenuItem>, DatabaseError> {
        Ok(self.inner.read().await.items.iter().find(|i| i.id == id).cloned())
    }

    async fn find_items(&self, ids: &[Uuid]) -> Result<Vec<MenuItem>, DatabaseError> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        Ok(self
            .inner
            .read()
            .await
            .items
            .iter()
            .filter(|i| wanted.contains(&i.id))
            .cloned()
            .collect())
    }

    async fn insert_item(&self, item: &MenuItem) -> Result<MenuItem, DatabaseError> {
        self.inner.write().await.items.push(item.clone());
        Ok(item.clone())
    }

    async fn update_item(&self, item: &MenuItem) -> Result<MenuItem, DatabaseError> {
        let mut tables = self.inner.write().await;
        replace(&mut tables.items, item.id, |i| i.id, item, "menu item")
    }

    async fn count_items(&self) -> Result<i64, DatabaseError> {
        Ok(self.inner.read().await.items.len() as i64)
    }

    async fn modifiers_for(&self, item_ids: &[Uuid]) -> Result<Vec<ItemModifier>, DatabaseError> {
        let wanted: HashSet<&Uuid> = item_ids.iter().collect();
        let mut modifiers: Vec<ItemModifier> = self
            .inner
            .read()
            .await
            .modifiers
            .iter()
            .filter(|m| wanted.contains(&m.menu_item_id))
            .cloned()
            .collect();
        modifiers.sort_by_key(|m| m.created_at);
        Ok(modifiers)
    }

    async fn find_modifier(&self, id: Uuid) -> Result<Option<ItemModifier>, DatabaseError> {
        Ok(self.inner.read().await.modifiers.iter().find(|m| m.id == id).cloned())
    }

    async fn insert_modifier(&self, modifier: &ItemModifier) -> Result<ItemModifier, DatabaseError> {
        self.inner.write().await.modifiers.push(modifier.clone());
        Ok(modifier.clone())
    }

    async fn update_modifier(&self, modifier: &ItemModifier) -> Result<ItemModifier, DatabaseError> {
        let mut tables = self.inner.write().await;
        replace(&mut tables.modifiers, modifier.id, |m| m.id, modifier, "modifier")
    }

    async fn delete_modifier(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.inner.write().await;
        let before = tables.modifiers.len();
        tables.modifiers.retain(|m| m.id != id);
        Ok(tables.modifiers.len() != before)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn next_sequence(&self) -> Result<i64, DatabaseError> {
        let mut tables = self.inner.write().await;
        tables.order_sequence += 1;
        Ok(tables.order_sequence)
    }

    async fn insert(&self, order: &Order, items: &[OrderItem]) -> Result<(Order, Vec<OrderItem>), DatabaseError> {
        let mut tables = self.inner.write().await;
        if tables.orders.iter().any(|o| o.order_number == order.order_number) {
            return Err(DatabaseError::Conflict("orders_order_number_key".into()));
        }
        tables.orders.push(order.clone());
        tables.order_items.extend(items.iter().cloned());
        Ok((order.clone(), items.to_vec()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, DatabaseError> {
        Ok(self.inner.read().await.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn find_by_number(&self, order_number: &str) -> Result<Option<Order>, DatabaseError> {
        Ok(self
            .inner
            .read()
            .await
            .orders
            .iter()
            .find(|o| o.order_number == order_number)
            .cloned())
    }

    async fn items_for(&self, order_ids: &[Uuid]) -> Result<Vec<OrderItem>, DatabaseError> {
        let wanted: HashSet<&Uuid> = order_ids.iter().collect();
        let mut items: Vec<OrderItem> = self
            .inner
            .read()
            .await
            .order_items
            .iter()
            .filter(|i| wanted.contains(&i.order_id))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.item_name.cmp(&b.item_name));
        Ok(items)
    }

    async fn list(&self, query: &OrderQuery) -> Result<Vec<Order>, DatabaseError> {
        let mut orders: Vec<Order> = self
            .inner
            .read()
            .await
            .orders
            .iter()
            .filter(|o| query.statuses.as_ref().map_or(true, |s| s.contains(&o.status)))
            .filter(|o| query.created_from.map_or(true, |from| o.created_at >= from))
            .filter(|o| query.created_to.map_or(true, |to| o.created_at < to))
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        if !query.oldest_first {
            orders.reverse();
        }
        Ok(orders)
    }

    async fn update(&self, order: &Order) -> Result<Order, DatabaseError> {
        let mut tables = self.inner.write().await;
        replace(&mut tables.orders, order.id, |o| o.id, order, "order")
    }
}

#[async_trait]
impl ReservationRepository for MemoryStore {
    async fn insert(&self, reservation: &Reservation) -> Result<Reservation, DatabaseError> {
        self.inner.write().await.reservations.push(reservation.clone());
        Ok(reservation.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, DatabaseError> {
        Ok(self.inner.read().await.reservations.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self, query: &ReservationQuery) -> Result<Vec<Reservation>, DatabaseError> {
        let mut reservations: Vec<Reservation> = self
            .inner
            .read()
            .await
            .reservations
            .iter()
            .filter(|r| query.date_from.map_or(true, |from| r.reservation_date >= from))
            .filter(|r| query.date_to.map_or(true, |to| r.reservation_date <= to))
            .filter(|r| query.phone.as_deref().map_or(true, |p| r.customer_phone == p))
            .filter(|r| query.statuses.as_ref().map_or(true, |s| s.contains(&r.status)))
            .cloned()
            .collect();
        reservations.sort_by(|a, b| {
            a.reservation_date
                .cmp(&b.reservation_date)
                .then_with(|| a.reservation_time.cmp(&b.reservation_time))
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        if query.newest_first {
            reservations.reverse();
        }
        Ok(reservations)
    }

    async fn update(&self, reservation: &Reservation) -> Result<Reservation, DatabaseError> {
        let mut tables = self.inner.write().await;
        replace(&mut tables.reservations, reservation.id, |r| r.id, reservation, "reservation")
    }
}
