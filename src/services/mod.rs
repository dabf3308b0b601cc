//! Workflow services. Handlers stay thin: they validate input, call one
//! function here, and wrap the result.

pub mod auth_service;
pub mod customer_service;
pub mod error;
pub mod menu_service;
pub mod order_service;
pub mod pricing;
pub mod reservation_service;
pub mod restaurant_service;
pub mod schedule;
pub mod status;

pub use error::{ServiceError, ServiceResult};
