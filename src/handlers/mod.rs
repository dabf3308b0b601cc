// handlers/mod.rs - RPC procedure groups
//
// Every procedure is `POST /rpc/<router>.<procedure>` with a JSON object body.
// Each group module builds its own router and attaches the guards its
// procedures need; `rpc_routes` stitches them together.

use axum::Router;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Guard;
use crate::middleware::require_guard;
use crate::state::AppState;

pub mod auth;
pub mod health;
pub mod menu;
pub mod order;
pub mod reservation;
pub mod restaurant;

/// Input of procedures addressing one entity.
#[derive(Debug, Deserialize, Validate)]
pub struct IdInput {
    pub id: Uuid,
}

/// Wrap every route of `router` with `guard`.
pub(crate) fn guarded(router: Router<AppState>, guard: Guard) -> Router<AppState> {
    router.route_layer(axum::middleware::from_fn_with_state(guard, require_guard))
}

pub fn rpc_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(restaurant::routes())
        .merge(menu::routes())
        .merge(order::routes())
        .merge(reservation::routes())
}
