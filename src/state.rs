use std::sync::Arc;

use sqlx::PgPool;

use crate::database::repository::{
    DynCustomerRepository, DynMenuRepository, DynOrderRepository, DynReservationRepository, DynRestaurantRepository,
    DynUserRepository, PgCustomerRepository, PgMenuRepository, PgOrderRepository, PgReservationRepository,
    PgRestaurantRepository, PgUserRepository,
};

/// Request context shared by every procedure: one handle per aggregate.
#[derive(Clone)]
pub struct AppState {
    pub users: DynUserRepository,
    pub customers: DynCustomerRepository,
    pub restaurant: DynRestaurantRepository,
    pub menu: DynMenuRepository,
    pub orders: DynOrderRepository,
    pub reservations: DynReservationRepository,
    /// Present when backed by Postgres; used by the health check.
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            customers: Arc::new(PgCustomerRepository::new(pool.clone())),
            restaurant: Arc::new(PgRestaurantRepository::new(pool.clone())),
            menu: Arc::new(PgMenuRepository::new(pool.clone())),
            orders: Arc::new(PgOrderRepository::new(pool.clone())),
            reservations: Arc::new(PgReservationRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }
}
