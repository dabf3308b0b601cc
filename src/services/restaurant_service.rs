use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::database::models::{
    Branding, DayHours, DeliveryConfig, OpeningHours, RestaurantConfig, RestaurantTable, Services,
};
use crate::database::repository::{OrderQuery, ReservationQuery};
use crate::database::DatabaseError;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::schedule::{self, parse_hhmm};
use crate::state::AppState;

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let ok = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new("slug").with_message("Use lowercase letters, digits and dashes".into()))
    }
}

fn validate_hours(hours: &OpeningHours) -> Result<(), ValidationError> {
    let readable = hours
        .days()
        .iter()
        .all(|d| d.is_closed || (parse_hhmm(&d.open).is_some() && parse_hhmm(&d.close).is_some()));
    if readable {
        Ok(())
    } else {
        Err(ValidationError::new("opening_hours").with_message("Times must be HH:MM".into()))
    }
}

fn validate_delivery(config: &DeliveryConfig) -> Result<(), ValidationError> {
    let negative = [Some(config.fee), Some(config.minimum_order), config.radius, config.is_free_over_amount]
        .into_iter()
        .flatten()
        .any(|v| v < Decimal::ZERO);
    if negative {
        Err(ValidationError::new("delivery_config").with_message("Amounts cannot be negative".into()))
    } else {
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRestaurantInput {
    #[validate(length(min = 1, max = 60), custom(function = "validate_slug"))]
    pub slug: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[validate(custom(function = "validate_hours"))]
    pub opening_hours: OpeningHours,
    pub services: Services,
    #[validate(custom(function = "validate_delivery"))]
    pub delivery_config: DeliveryConfig,
    #[serde(default)]
    pub branding: Branding,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRestaurantInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 60), custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[validate(custom(function = "validate_hours"))]
    pub opening_hours: Option<OpeningHours>,
    pub services: Option<Services>,
    #[validate(custom(function = "validate_delivery"))]
    pub delivery_config: Option<DeliveryConfig>,
    pub branding: Option<Branding>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTableInput {
    #[validate(length(min = 1, max = 30))]
    pub label: String,
    #[validate(range(min = 1, max = 20))]
    pub seats: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTableInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 30))]
    pub label: Option<String>,
    #[validate(range(min = 1, max = 20))]
    pub seats: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenStatus {
    pub is_open: bool,
    pub today: Option<DayHours>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantStats {
    pub today_orders: usize,
    pub today_revenue: Decimal,
    pub active_orders: usize,
    pub today_reservations: usize,
    pub upcoming_reservations: usize,
    pub menu_items: i64,
    pub customers: i64,
}

/// The deployment's active configuration.
pub async fn active_config(state: &AppState) -> ServiceResult<RestaurantConfig> {
    state
        .restaurant
        .find_active()
        .await?
        .ok_or_else(|| ServiceError::not_found("Restaurant configuration"))
}

pub async fn get_by_slug(state: &AppState, slug: &str) -> ServiceResult<RestaurantConfig> {
    state
        .restaurant
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("Restaurant '{}'", slug)))
}

pub async fn create(state: &AppState, input: CreateRestaurantInput) -> ServiceResult<RestaurantConfig> {
    if state.restaurant.find_active().await?.is_some() {
        return Err(ServiceError::Conflict("An active restaurant configuration already exists".into()));
    }
    if state.restaurant.find_by_slug(&input.slug).await?.is_some() {
        return Err(ServiceError::Conflict(format!("Slug '{}' is taken", input.slug)));
    }

    let now = Utc::now();
    let config = RestaurantConfig {
        id: Uuid::new_v4(),
        slug: input.slug,
        name: input.name,
        phone: input.phone,
        address: input.address,
        opening_hours: Json(input.opening_hours),
        services: Json(input.services),
        delivery_config: Json(input.delivery_config),
        branding: Json(input.branding),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    let created = state.restaurant.insert(&config).await.map_err(slug_conflict)?;
    info!("Created restaurant '{}'", created.slug);
    Ok(created)
}

fn slug_conflict(err: DatabaseError) -> ServiceError {
    match err {
        DatabaseError::Conflict(_) => ServiceError::Conflict("Slug is taken".into()),
        other => other.into(),
    }
}

pub async fn update(state: &AppState, input: UpdateRestaurantInput) -> ServiceResult<RestaurantConfig> {
    let mut config = state
        .restaurant
        .find_by_id(input.id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Restaurant configuration"))?;

    if input.is_active == Some(true) && !config.is_active {
        if let Some(active) = state.restaurant.find_active().await? {
            if active.id != config.id {
                return Err(ServiceError::Conflict("Another restaurant configuration is active".into()));
            }
        }
    }

    if let Some(slug) = input.slug {
        config.slug = slug;
    }
    if let Some(name) = input.name {
        config.name = name;
    }
    if input.phone.is_some() {
        config.phone = input.phone;
    }
    if input.address.is_some() {
        config.address = input.address;
    }
    if let Some(hours) = input.opening_hours {
        config.opening_hours = Json(hours);
    }
    if let Some(services) = input.services {
        config.services = Json(services);
    }
    if let Some(delivery) = input.delivery_config {
        config.delivery_config = Json(delivery);
    }
    if let Some(branding) = input.branding {
        config.branding = Json(branding);
    }
    if let Some(is_active) = input.is_active {
        config.is_active = is_active;
    }

    let updated = state.restaurant.update(&config).await.map_err(slug_conflict)?;
    info!("Updated restaurant '{}'", updated.slug);
    Ok(updated)
}

pub fn open_status(config: &RestaurantConfig, now: NaiveDateTime) -> OpenStatus {
    OpenStatus {
        is_open: schedule::is_open_at(&config.opening_hours, now),
        today: Some(config.opening_hours.for_weekday(now.date().weekday()).clone()),
    }
}

pub async fn is_open(state: &AppState) -> ServiceResult<OpenStatus> {
    let now = Local::now().naive_local();
    match state.restaurant.find_active().await? {
        Some(config) => Ok(open_status(&config, now)),
        None => Ok(OpenStatus {
            is_open: false,
            today: None,
        }),
    }
}

/// UTC instant of local midnight starting `date`.
pub fn local_midnight(date: NaiveDate) -> chrono::DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::default());
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

pub async fn stats(state: &AppState) -> ServiceResult<RestaurantStats> {
    let today = Local::now().date_naive();

    let todays_orders = state
        .orders
        .list(&OrderQuery {
            created_from: Some(local_midnight(today)),
            created_to: Some(local_midnight(today + Duration::days(1))),
            ..Default::default()
        })
        .await?;
    let today_revenue = todays_orders
        .iter()
        .filter(|o| o.status != crate::types::OrderStatus::Cancelled)
        .map(|o| o.total)
        .sum();

    let active_orders = state
        .orders
        .list(&OrderQuery {
            statuses: Some(crate::types::OrderStatus::ALL.iter().copied().filter(|s| s.is_active()).collect()),
            ..Default::default()
        })
        .await?
        .len();

    let upcoming = state
        .reservations
        .list(&ReservationQuery {
            date_from: Some(today),
            ..Default::default()
        })
        .await?;
    let open: Vec<_> = upcoming.iter().filter(|r| r.status.expects_guests()).collect();

    Ok(RestaurantStats {
        today_orders: todays_orders.len(),
        today_revenue,
        active_orders,
        today_reservations: open.iter().filter(|r| r.reservation_date == today).count(),
        upcoming_reservations: open.iter().filter(|r| r.reservation_date > today).count(),
        menu_items: state.menu.count_items().await?,
        customers: state.customers.count().await?,
    })
}

pub async fn list_tables(state: &AppState) -> ServiceResult<Vec<RestaurantTable>> {
    Ok(state.restaurant.list_tables(false).await?)
}

fn table_conflict(err: DatabaseError) -> ServiceError {
    match err {
        DatabaseError::Conflict(_) => ServiceError::Conflict("A table with that label exists".into()),
        other => other.into(),
    }
}

pub async fn create_table(state: &AppState, input: CreateTableInput) -> ServiceResult<RestaurantTable> {
    let table = RestaurantTable {
        id: Uuid::new_v4(),
        label: input.label,
        seats: input.seats,
        is_active: true,
        created_at: Utc::now(),
    };
    let created = state.restaurant.insert_table(&table).await.map_err(table_conflict)?;
    info!("Created table {} ({} seats)", created.label, created.seats);
    Ok(created)
}

pub async fn update_table(state: &AppState, input: UpdateTableInput) -> ServiceResult<RestaurantTable> {
    let mut table = state
        .restaurant
        .find_table(input.id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Table"))?;
    if let Some(label) = input.label {
        table.label = label;
    }
    if let Some(seats) = input.seats {
        table.seats = seats;
    }
    if let Some(is_active) = input.is_active {
        table.is_active = is_active;
    }
    Ok(state.restaurant.update_table(&table).await.map_err(table_conflict)?)
}
