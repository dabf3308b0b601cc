// handlers/order.rs - order.* procedures

use axum::{extract::State, routing::post, Router};
use serde::Deserialize;
use validator::Validate;

use super::guarded;
use crate::auth::{Guard, ADMIN_ONLY, ALL_STAFF, KITCHEN_STAFF};
use crate::database::models::OrderDetail;
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::services::order_service::{
    self, ConfirmPaymentInput, CreateOrderInput, SalesStats, SalesStatsInput, UpdateStatusInput,
};
use crate::state::AppState;
use crate::types::OrderStatus;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderNumberInput {
    #[validate(length(min = 1, max = 40))]
    pub order_number: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct TodayOrdersInput {
    pub status: Option<OrderStatus>,
}

pub fn routes() -> Router<AppState> {
    let public = Router::new()
        .route("/rpc/order.create", post(create))
        .route("/rpc/order.getByOrderNumber", post(get_by_order_number));

    let staff = guarded(
        Router::new()
            .route("/rpc/order.getActiveOrders", post(get_active_orders))
            .route("/rpc/order.getTodayOrders", post(get_today_orders))
            .route("/rpc/order.updateStatus", post(update_status))
            .route("/rpc/order.confirmPayment", post(confirm_payment)),
        Guard::Roles(ALL_STAFF),
    );

    let kitchen = guarded(
        Router::new().route("/rpc/order.getKitchenOrders", post(get_kitchen_orders)),
        Guard::Roles(KITCHEN_STAFF),
    );

    let admin = guarded(
        Router::new().route("/rpc/order.getSalesStats", post(get_sales_stats)),
        Guard::Roles(ADMIN_ONLY),
    );

    public.merge(staff).merge(kitchen).merge(admin)
}

async fn create(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateOrderInput>,
) -> ApiResult<OrderDetail> {
    Ok(ApiResponse::success(order_service::create(&state, input).await?))
}

async fn get_by_order_number(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<OrderNumberInput>,
) -> ApiResult<OrderDetail> {
    Ok(ApiResponse::success(
        order_service::by_order_number(&state, &input.order_number).await?,
    ))
}

async fn get_active_orders(State(state): State<AppState>) -> ApiResult<Vec<OrderDetail>> {
    Ok(ApiResponse::success(order_service::active_orders(&state).await?))
}

async fn get_today_orders(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<TodayOrdersInput>,
) -> ApiResult<Vec<OrderDetail>> {
    Ok(ApiResponse::success(order_service::today_orders(&state, input.status).await?))
}

async fn get_kitchen_orders(State(state): State<AppState>) -> ApiResult<Vec<OrderDetail>> {
    Ok(ApiResponse::success(order_service::kitchen_orders(&state).await?))
}

async fn update_status(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpdateStatusInput>,
) -> ApiResult<OrderDetail> {
    Ok(ApiResponse::success(order_service::update_status(&state, input).await?))
}

async fn confirm_payment(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ConfirmPaymentInput>,
) -> ApiResult<OrderDetail> {
    Ok(ApiResponse::success(order_service::confirm_payment(&state, input).await?))
}

async fn get_sales_stats(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<SalesStatsInput>,
) -> ApiResult<SalesStats> {
    Ok(ApiResponse::success(order_service::sales_stats(&state, input).await?))
}
