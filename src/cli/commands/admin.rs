use serde_json::json;
use validator::Validate;

use crate::cli::{utils::{open_pool, output_success}, OutputFormat};
use crate::services::auth_service::{self, CreateStaffInput};
use crate::state::AppState;
use crate::types::Role;

pub async fn handle(email: String, name: String, password: String, output_format: OutputFormat) -> anyhow::Result<()> {
    let input = CreateStaffInput {
        email,
        password,
        name,
        role: Role::Admin,
        phone: None,
    };
    input.validate()?;

    let state = AppState::postgres(open_pool().await?);
    let user = auth_service::create_staff(&state, input).await?;

    output_success(
        output_format,
        &format!("Created administrator {}", user.email),
        Some(json!({ "id": user.id, "email": user.email })),
    )
}
