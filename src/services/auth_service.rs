use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{generate_jwt, hash_password, verify_password, Claims};
use crate::database::models::User;
use crate::database::DatabaseError;
use crate::middleware::AuthUser;
use crate::services::error::{ServiceError, ServiceResult};
use crate::state::AppState;
use crate::types::Role;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStaffInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub role: Role,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaffInput {
    pub id: Uuid,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub role: Option<Role>,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

/// Token plus the account it was issued for.
#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

fn issue(user: User) -> ServiceResult<Session> {
    let token = generate_jwt(&Claims::new(user.id, user.email.clone(), user.role))?;
    Ok(Session { token, user })
}

fn invalid_credentials() -> ServiceError {
    ServiceError::Unauthorized("Invalid credentials".to_string())
}

pub async fn login(state: &AppState, input: LoginInput) -> ServiceResult<Session> {
    let Some(user) = state.users.find_by_email(&input.email).await? else {
        warn!("Login rejected for unknown email {}", input.email);
        return Err(invalid_credentials());
    };
    if !verify_password(&input.password, &user.password_hash).await? {
        warn!("Login rejected for {}: wrong password", user.email);
        return Err(invalid_credentials());
    }
    if !user.is_active {
        warn!("Login rejected for {}: account deactivated", user.email);
        return Err(ServiceError::Forbidden("Account is deactivated".to_string()));
    }
    info!("User {} signed in as {}", user.email, user.role);
    issue(user)
}

async fn insert_user(
    state: &AppState,
    email: String,
    password: &str,
    name: String,
    role: Role,
    phone: Option<String>,
) -> ServiceResult<User> {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        email: email.trim().to_lowercase(),
        name,
        password_hash: hash_password(password).await?,
        role,
        is_active: true,
        phone,
        created_at: now,
        updated_at: now,
    };
    match state.users.insert(&user).await {
        Ok(created) => Ok(created),
        Err(DatabaseError::Conflict(_)) => Err(ServiceError::Conflict(format!(
            "Email {} is already registered",
            user.email
        ))),
        Err(e) => Err(e.into()),
    }
}

pub async fn register(state: &AppState, input: RegisterInput) -> ServiceResult<Session> {
    if state.users.find_by_email(&input.email).await?.is_some() {
        return Err(ServiceError::Conflict(format!("Email {} is already registered", input.email)));
    }
    let user = insert_user(state, input.email, &input.password, input.name, Role::Customer, input.phone).await?;
    info!("Registered customer account {}", user.email);
    issue(user)
}

pub async fn me(state: &AppState, caller: &AuthUser) -> ServiceResult<User> {
    state
        .users
        .find_by_id(caller.id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))
}

pub async fn create_staff(state: &AppState, input: CreateStaffInput) -> ServiceResult<User> {
    if input.role == Role::Customer {
        return Err(ServiceError::bad_request("Staff accounts need a staff role"));
    }
    if state.users.find_by_email(&input.email).await?.is_some() {
        return Err(ServiceError::Conflict(format!("Email {} is already registered", input.email)));
    }
    let user = insert_user(state, input.email, &input.password, input.name, input.role, input.phone).await?;
    info!("Created staff account {} ({})", user.email, user.role);
    Ok(user)
}

pub async fn list_staff(state: &AppState) -> ServiceResult<Vec<User>> {
    Ok(state.users.list_staff().await?)
}

pub async fn update_staff(state: &AppState, caller: &AuthUser, input: UpdateStaffInput) -> ServiceResult<User> {
    let mut user = state
        .users
        .find_by_id(input.id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;

    if user.id == caller.id {
        if input.is_active == Some(false) {
            return Err(ServiceError::precondition("You cannot deactivate your own account"));
        }
        if input.role.is_some_and(|role| role != Role::Admin) {
            return Err(ServiceError::precondition("You cannot remove your own admin role"));
        }
    }

    if let Some(name) = input.name {
        user.name = name;
    }
    if let Some(role) = input.role {
        user.role = role;
    }
    if let Some(phone) = input.phone {
        user.phone = Some(phone);
    }
    if let Some(is_active) = input.is_active {
        user.is_active = is_active;
    }

    let updated = state.users.update(&user).await?;
    info!("Updated account {} (role {}, active {})", updated.email, updated.role, updated.is_active);
    Ok(updated)
}

pub async fn deactivate_staff(state: &AppState, caller: &AuthUser, id: Uuid) -> ServiceResult<User> {
    if id == caller.id {
        return Err(ServiceError::precondition("You cannot deactivate your own account"));
    }
    let mut user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;
    user.is_active = false;
    let updated = state.users.update(&user).await?;
    info!("Deactivated account {}", updated.email);
    Ok(updated)
}
