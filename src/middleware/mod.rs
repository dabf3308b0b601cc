pub mod auth;
pub mod response;
pub mod validate;

pub use auth::{require_guard, resolve_identity, AuthUser, Identity};
pub use response::{ApiResponse, ApiResult};
pub use validate::ValidatedJson;
