// handlers/auth.rs - auth.* procedures
//
// login/register/logout are public; me needs any session; staff management
// is admin only.

use axum::{extract::State, routing::post, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use super::{guarded, IdInput};
use crate::auth::{Guard, ADMIN_ONLY};
use crate::config;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, Identity, ValidatedJson};
use crate::services::auth_service::{
    self, CreateStaffInput, LoginInput, RegisterInput, Session, UpdateStaffInput,
};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    let public = Router::new()
        .route("/rpc/auth.login", post(login))
        .route("/rpc/auth.register", post(register))
        .route("/rpc/auth.logout", post(logout));

    let authed = guarded(Router::new().route("/rpc/auth.me", post(me)), Guard::Authed);

    let admin = guarded(
        Router::new()
            .route("/rpc/auth.createStaff", post(create_staff))
            .route("/rpc/auth.listStaff", post(list_staff))
            .route("/rpc/auth.updateStaff", post(update_staff))
            .route("/rpc/auth.deactivateStaff", post(deactivate_staff)),
        Guard::Roles(ADMIN_ONLY),
    );

    public.merge(authed).merge(admin)
}

/// HttpOnly session cookie living as long as the token.
fn session_cookie(token: String) -> Cookie<'static> {
    let security = &config::config().security;
    Cookie::build((security.session_cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(security.session_cookie_secure)
        .max_age(time::Duration::hours(security.jwt_expiry_hours as i64))
        .build()
}

fn with_cookie(jar: CookieJar, session: Session) -> (CookieJar, ApiResponse<Session>) {
    let jar = jar.add(session_cookie(session.token.clone()));
    (jar, ApiResponse::success(session))
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(input): ValidatedJson<LoginInput>,
) -> Result<(CookieJar, ApiResponse<Session>), ApiError> {
    let session = auth_service::login(&state, input).await?;
    Ok(with_cookie(jar, session))
}

async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(input): ValidatedJson<RegisterInput>,
) -> Result<(CookieJar, ApiResponse<Session>), ApiError> {
    let session = auth_service::register(&state, input).await?;
    Ok(with_cookie(jar, session))
}

async fn logout(jar: CookieJar) -> (CookieJar, ApiResponse<serde_json::Value>) {
    let name = config::config().security.session_cookie_name.clone();
    let jar = jar.remove(Cookie::build((name, "")).path("/").build());
    (jar, ApiResponse::success(serde_json::json!({ "loggedOut": true })))
}

async fn me(State(state): State<AppState>, identity: Identity) -> ApiResult<User> {
    let caller = identity.require()?;
    Ok(ApiResponse::success(auth_service::me(&state, caller).await?))
}

async fn create_staff(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CreateStaffInput>,
) -> ApiResult<User> {
    Ok(ApiResponse::success(auth_service::create_staff(&state, input).await?))
}

async fn list_staff(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    Ok(ApiResponse::success(auth_service::list_staff(&state).await?))
}

async fn update_staff(
    State(state): State<AppState>,
    identity: Identity,
    ValidatedJson(input): ValidatedJson<UpdateStaffInput>,
) -> ApiResult<User> {
    let caller = identity.require()?;
    Ok(ApiResponse::success(auth_service::update_staff(&state, caller, input).await?))
}

async fn deactivate_staff(
    State(state): State<AppState>,
    identity: Identity,
    ValidatedJson(input): ValidatedJson<IdInput>,
) -> ApiResult<User> {
    let caller = identity.require()?;
    Ok(ApiResponse::success(auth_service::deactivate_staff(&state, caller, input.id).await?))
}
