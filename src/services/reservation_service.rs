use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::config::{self, CapacityMode, ReservationConfig};
use crate::database::models::{Reservation, RestaurantConfig, RestaurantTable};
use crate::database::repository::ReservationQuery;
use crate::middleware::AuthUser;
use crate::services::customer_service::{normalize_phone, resolve_customer, ContactInfo};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::restaurant_service::active_config;
use crate::services::schedule::{self, minute_of_day, parse_hhmm};
use crate::services::status::Transition;
use crate::state::AppState;
use crate::types::ReservationStatus;

fn validate_time(time: &str) -> Result<(), ValidationError> {
    match parse_hhmm(time) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("time").with_message("Use HH:MM (24-hour clock)".into())),
    }
}

fn not_in_past(date: &NaiveDate) -> Result<(), ValidationError> {
    if *date < Local::now().date_naive() {
        Err(ValidationError::new("date").with_message("Date is in the past".into()))
    } else {
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom(function = "not_in_past"))]
    pub date: NaiveDate,
    #[validate(custom(function = "validate_time"))]
    pub time: String,
    #[validate(range(min = 1, max = 20))]
    pub party_size: i32,
    #[validate(length(max = 500))]
    pub special_requests: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTimesInput {
    pub date: NaiveDate,
    #[validate(range(min = 1, max = 20))]
    pub party_size: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReservationInput {
    pub id: Uuid,
    #[validate(custom(function = "not_in_past"))]
    pub date: Option<NaiveDate>,
    #[validate(custom(function = "validate_time"))]
    pub time: Option<String>,
    #[validate(range(min = 1, max = 20))]
    pub party_size: Option<i32>,
    #[validate(length(max = 500))]
    pub special_requests: Option<String>,
    pub status: Option<ReservationStatus>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmReservationInput {
    pub id: Uuid,
    pub table_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CancelReservationInput {
    pub id: Uuid,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Slot {
    pub time: String,
    pub remaining: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTimes {
    pub date: NaiveDate,
    pub is_closed: bool,
    pub slots: Vec<Slot>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub total_guests: i64,
    pub today: usize,
}

/// How many parties of `party_size` one slot takes.
pub fn slot_capacity(config: &ReservationConfig, tables: &[RestaurantTable], party_size: i32) -> u32 {
    match config.capacity_mode {
        CapacityMode::Fixed => config.slot_capacity,
        CapacityMode::Tables => tables
            .iter()
            .filter(|t| t.is_active && t.seats >= party_size)
            .count() as u32,
    }
}

/// Open slots for a date given the bookings already on it. Past dates have
/// none; today only keeps slots that have not started.
pub fn open_slots(
    restaurant: &RestaurantConfig,
    config: &ReservationConfig,
    date: NaiveDate,
    now: NaiveDateTime,
    booked: &[Reservation],
    capacity: u32,
) -> AvailableTimes {
    let day = restaurant.opening_hours.for_weekday(date.weekday());
    let is_closed = day.is_closed;
    if is_closed || date < now.date() {
        return AvailableTimes {
            date,
            is_closed,
            slots: vec![],
        };
    }

    let mut taken: HashMap<&str, u32> = HashMap::new();
    for reservation in booked.iter().filter(|r| r.status.occupies_slot()) {
        *taken.entry(reservation.reservation_time.as_str()).or_insert(0) += 1;
    }

    let cutoff = (date == now.date()).then(|| minute_of_day(now));
    let slots = schedule::slot_times(&restaurant.opening_hours, date, config)
        .into_iter()
        .filter(|time| match (cutoff, parse_hhmm(time)) {
            (Some(cutoff), Some(start)) => start > cutoff,
            _ => true,
        })
        .filter_map(|time| {
            let used = taken.get(time.as_str()).copied().unwrap_or(0);
            let remaining = capacity.saturating_sub(used);
            (remaining > 0).then_some(Slot { time, remaining })
        })
        .collect();

    AvailableTimes {
        date,
        is_closed,
        slots,
    }
}

async fn bookings_on(state: &AppState, date: NaiveDate) -> ServiceResult<Vec<Reservation>> {
    Ok(state
        .reservations
        .list(&ReservationQuery {
            date_from: Some(date),
            date_to: Some(date),
            ..Default::default()
        })
        .await?)
}

async fn capacity_for(state: &AppState, party_size: i32) -> ServiceResult<u32> {
    let config = &config::config().reservations;
    let tables = match config.capacity_mode {
        CapacityMode::Tables => state.restaurant.list_tables(true).await?,
        CapacityMode::Fixed => vec![],
    };
    Ok(slot_capacity(config, &tables, party_size))
}

async fn reservations_restaurant(state: &AppState) -> ServiceResult<RestaurantConfig> {
    let restaurant = active_config(state).await?;
    if !restaurant.services.reservations {
        return Err(ServiceError::Forbidden("Reservations are not available".into()));
    }
    Ok(restaurant)
}

/// Count bookings in the same slot, optionally ignoring one reservation.
async fn ensure_slot_free(
    state: &AppState,
    date: NaiveDate,
    time: &str,
    party_size: i32,
    ignore: Option<Uuid>,
) -> ServiceResult<()> {
    let capacity = capacity_for(state, party_size).await?;
    let used = bookings_on(state, date)
        .await?
        .iter()
        .filter(|r| Some(r.id) != ignore && r.status.occupies_slot() && r.reservation_time == time)
        .count() as u32;
    if used >= capacity {
        return Err(ServiceError::precondition(format!("No tables left at {} on {}", time, date)));
    }
    Ok(())
}

pub async fn create(state: &AppState, input: CreateReservationInput) -> ServiceResult<Reservation> {
    let restaurant = reservations_restaurant(state).await?;
    let buffer = config::config().reservations.last_seating_buffer_minutes;
    schedule::check_reservation_time(&restaurant.opening_hours, input.date, &input.time, buffer)?;
    ensure_slot_free(state, input.date, &input.time, input.party_size, None).await?;

    let contact = ContactInfo {
        phone: &input.phone,
        name: Some(input.name.as_str()),
        email: input.email.as_deref(),
    };
    let customer = resolve_customer(state, contact, false).await?;

    let now = Utc::now();
    let reservation = Reservation {
        id: Uuid::new_v4(),
        customer_id: customer.id,
        customer_name: input.name,
        customer_phone: customer.phone.clone(),
        customer_email: input.email,
        reservation_date: input.date,
        reservation_time: input.time,
        party_size: input.party_size,
        status: ReservationStatus::Pending,
        special_requests: input.special_requests,
        table_id: None,
        cancellation_reason: None,
        confirmed_at: None,
        seated_at: None,
        cancelled_at: None,
        created_at: now,
        updated_at: now,
    };
    Ok(state.reservations.insert(&reservation).await?)
}

pub async fn available_times(state: &AppState, input: AvailableTimesInput) -> ServiceResult<AvailableTimes> {
    let restaurant = reservations_restaurant(state).await?;
    let booked = bookings_on(state, input.date).await?;
    let capacity = capacity_for(state, input.party_size).await?;
    Ok(open_slots(
        &restaurant,
        &config::config().reservations,
        input.date,
        Local::now().naive_local(),
        &booked,
        capacity,
    ))
}

pub async fn by_phone(state: &AppState, phone: &str) -> ServiceResult<Vec<Reservation>> {
    Ok(state
        .reservations
        .list(&ReservationQuery {
            phone: Some(normalize_phone(phone)),
            newest_first: true,
            ..Default::default()
        })
        .await?)
}

async fn require_reservation(state: &AppState, id: Uuid) -> ServiceResult<Reservation> {
    state
        .reservations
        .find_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Reservation"))
}

pub async fn by_id(state: &AppState, id: Uuid) -> ServiceResult<Reservation> {
    require_reservation(state, id).await
}

pub async fn today(state: &AppState) -> ServiceResult<Vec<Reservation>> {
    bookings_on(state, Local::now().date_naive()).await
}

pub async fn upcoming(state: &AppState, days: u32) -> ServiceResult<Vec<Reservation>> {
    let today = Local::now().date_naive();
    Ok(state
        .reservations
        .list(&ReservationQuery {
            date_from: Some(today),
            date_to: Some(today + Duration::days(i64::from(days))),
            ..Default::default()
        })
        .await?)
}

/// Move a reservation along its lifecycle and stamp the milestone times.
pub fn apply_status(reservation: &mut Reservation, next: ReservationStatus, now: chrono::DateTime<Utc>) -> ServiceResult<Transition> {
    let transition = reservation.status.transition_to(next)?;
    if transition == Transition::Advance {
        reservation.status = next;
        match next {
            ReservationStatus::Confirmed => reservation.confirmed_at = Some(now),
            ReservationStatus::Seated => reservation.seated_at = Some(now),
            ReservationStatus::Cancelled => reservation.cancelled_at = Some(now),
            _ => {}
        }
    }
    Ok(transition)
}

pub async fn update(state: &AppState, input: UpdateReservationInput) -> ServiceResult<Reservation> {
    let mut reservation = require_reservation(state, input.id).await?;

    let rescheduled = input.date.is_some_and(|d| d != reservation.reservation_date)
        || input.time.as_deref().is_some_and(|t| t != reservation.reservation_time)
        || input.party_size.is_some_and(|p| p != reservation.party_size);
    if rescheduled {
        if reservation.status.is_terminal() {
            return Err(ServiceError::precondition(format!(
                "A {} reservation cannot be changed",
                reservation.status
            )));
        }
        let date = input.date.unwrap_or(reservation.reservation_date);
        let time = input.time.clone().unwrap_or_else(|| reservation.reservation_time.clone());
        let party_size = input.party_size.unwrap_or(reservation.party_size);

        let restaurant = active_config(state).await?;
        let buffer = config::config().reservations.last_seating_buffer_minutes;
        schedule::check_reservation_time(&restaurant.opening_hours, date, &time, buffer)?;
        ensure_slot_free(state, date, &time, party_size, Some(reservation.id)).await?;

        reservation.reservation_date = date;
        reservation.reservation_time = time;
        reservation.party_size = party_size;
    }
    if input.special_requests.is_some() {
        reservation.special_requests = input.special_requests;
    }
    if let Some(status) = input.status {
        apply_status(&mut reservation, status, Utc::now())?;
    }

    let updated = state.reservations.update(&reservation).await?;
    info!("Updated reservation {} ({})", updated.id, updated.status);
    Ok(updated)
}

pub async fn confirm(state: &AppState, input: ConfirmReservationInput) -> ServiceResult<Reservation> {
    let mut reservation = require_reservation(state, input.id).await?;
    if let Some(table_id) = input.table_id {
        let table = state
            .restaurant
            .find_table(table_id)
            .await?
            .filter(|t| t.is_active)
            .ok_or_else(|| ServiceError::not_found("Table"))?;
        if table.seats < reservation.party_size {
            return Err(ServiceError::bad_request(format!(
                "Table {} seats {}, party is {}",
                table.label, table.seats, reservation.party_size
            )));
        }
        reservation.table_id = Some(table.id);
    }
    apply_status(&mut reservation, ReservationStatus::Confirmed, Utc::now())?;
    let updated = state.reservations.update(&reservation).await?;
    info!("Confirmed reservation {}", updated.id);
    Ok(updated)
}

pub async fn mark_seated(state: &AppState, id: Uuid) -> ServiceResult<Reservation> {
    let mut reservation = require_reservation(state, id).await?;
    apply_status(&mut reservation, ReservationStatus::Seated, Utc::now())?;
    let updated = state.reservations.update(&reservation).await?;
    info!("Seated reservation {}", updated.id);
    Ok(updated)
}

/// Staff may cancel any reservation; anyone else must present the phone the
/// reservation was made with.
pub async fn cancel(state: &AppState, caller: Option<&AuthUser>, input: CancelReservationInput) -> ServiceResult<Reservation> {
    let mut reservation = require_reservation(state, input.id).await?;

    let is_staff = caller.is_some_and(|u| u.role.is_staff());
    if !is_staff {
        let matches = input
            .phone
            .as_deref()
            .is_some_and(|p| normalize_phone(p) == reservation.customer_phone);
        if !matches {
            warn!("Cancellation of reservation {} refused: phone mismatch", reservation.id);
            return Err(ServiceError::Forbidden("Phone number does not match this reservation".into()));
        }
    }

    apply_status(&mut reservation, ReservationStatus::Cancelled, Utc::now())?;
    if input.reason.is_some() {
        reservation.cancellation_reason = input.reason;
    }
    let updated = state.reservations.update(&reservation).await?;
    info!("Cancelled reservation {}", updated.id);
    Ok(updated)
}

pub fn summarize(reservations: &[Reservation], today: NaiveDate) -> ReservationStats {
    let mut by_status = BTreeMap::new();
    for reservation in reservations {
        *by_status.entry(reservation.status.to_string()).or_insert(0) += 1;
    }
    ReservationStats {
        total: reservations.len(),
        by_status,
        total_guests: reservations
            .iter()
            .filter(|r| r.status.expects_guests())
            .map(|r| i64::from(r.party_size))
            .sum(),
        today: reservations.iter().filter(|r| r.reservation_date == today).count(),
    }
}

pub async fn stats(state: &AppState) -> ServiceResult<ReservationStats> {
    let all = state.reservations.list(&ReservationQuery::default()).await?;
    Ok(summarize(&all, Local::now().date_naive()))
}
