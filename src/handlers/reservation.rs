// handlers/reservation.rs - reservation.* procedures
//
// cancel is public; the service checks that anonymous and customer callers
// own the reservation through its phone number.

use axum::{extract::State, routing::post, Router};
use serde::Deserialize;
use validator::Validate;

use super::{guarded, IdInput};
use crate::auth::{Guard, ADMIN_ONLY, ALL_STAFF};
use crate::database::models::Reservation;
use crate::middleware::{ApiResponse, ApiResult, Identity, ValidatedJson};
use crate::services::reservation_service::{
    self, AvailableTimes, AvailableTimesInput, CancelReservationInput, ConfirmReservationInput,
    CreateReservationInput, ReservationStats, UpdateReservationInput,
};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct PhoneInput {
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpcomingInput {
    #[validate(range(min = 1, max = 90))]
    pub days: Option<u32>,
}

const DEFAULT_UPCOMING_DAYS: u32 = 7;

pub fn routes() -> Router<AppState> {
    let public = Router::new()
        .route("/rpc/reservation.create", post(create))
        .route("/rpc/reservation.getAvailableTimes", post(get_available_times))
        .route("/rpc/reservation.getByPhone", post(get_by_phone))
        .route("/rpc/reservation.cancel", post(cancel));

    let staff = guarded(
        Router::new()
            .route("/rpc/reservation.getById", post(get_by_id))
            .route("/rpc/reservation.getTodayReservations", post(get_today))
            .route("/rpc/reservation.getUpcoming", post(get_upcoming))
            .route("/rpc/reservation.update", post(update))
            .route("/rpc/reservation.confirm", post(confirm))
            .route("/rpc/reservation.markSeated", post(mark_seated)),
        Guard::Roles(ALL_STAFF),
    );

    let admin = guarded(
        Router::new().route("/rpc/reservation.getStats", post(get_stats)),
        Guard::Roles(ADMIN_ONLY),
    );

    public.merge(staff).merge(admin)
}

async fn create(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateReservationInput>,
) -> ApiResult<Reservation> {
    Ok(ApiResponse::success(reservation_service::create(&state, input).await?))
}

async fn get_available_times(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<AvailableTimesInput>,
) -> ApiResult<AvailableTimes> {
    Ok(ApiResponse::success(reservation_service::available_times(&state, input).await?))
}

async fn get_by_phone(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<PhoneInput>,
) -> ApiResult<Vec<Reservation>> {
    Ok(ApiResponse::success(reservation_service::by_phone(&state, &input.phone).await?))
}

async fn cancel(
    State(state): State<AppState>,
    identity: Identity,
    ValidatedJson(input): ValidatedJson<CancelReservationInput>,
) -> ApiResult<Reservation> {
    Ok(ApiResponse::success(
        reservation_service::cancel(&state, identity.user(), input).await?,
    ))
}

async fn get_by_id(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<IdInput>,
) -> ApiResult<Reservation> {
    Ok(ApiResponse::success(reservation_service::by_id(&state, input.id).await?))
}

async fn get_today(State(state): State<AppState>) -> ApiResult<Vec<Reservation>> {
    Ok(ApiResponse::success(reservation_service::today(&state).await?))
}

async fn get_upcoming(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpcomingInput>,
) -> ApiResult<Vec<Reservation>> {
    let days = input.days.unwrap_or(DEFAULT_UPCOMING_DAYS);
    Ok(ApiResponse::success(reservation_service::upcoming(&state, days).await?))
}

async fn update(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpdateReservationInput>,
) -> ApiResult<Reservation> {
    Ok(ApiResponse::success(reservation_service::update(&state, input).await?))
}

async fn confirm(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ConfirmReservationInput>,
) -> ApiResult<Reservation> {
    Ok(ApiResponse::success(reservation_service::confirm(&state, input).await?))
}

async fn mark_seated(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<IdInput>,
) -> ApiResult<Reservation> {
    Ok(ApiResponse::success(reservation_service::mark_seated(&state, input.id).await?))
}

async fn get_stats(State(state): State<AppState>) -> ApiResult<ReservationStats> {
    Ok(ApiResponse::success(reservation_service::stats(&state).await?))
}
