use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::{guard::GuardError, validate_jwt, Guard};
use crate::config;
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::Role;

/// Authenticated caller, re-read from storage on every request so role
/// changes and deactivation apply immediately.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Resolved identity for the current request. Anonymous when no usable
/// credential was presented.
#[derive(Clone, Debug, Default)]
pub struct Identity(pub Option<AuthUser>);

impl Identity {
    pub fn user(&self) -> Option<&AuthUser> {
        self.0.as_ref()
    }

    pub fn require(&self) -> Result<&AuthUser, ApiError> {
        self.user().ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Identity>().cloned().unwrap_or_default())
    }
}

/// Where a session token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Bearer,
    Cookie,
}

/// `Authorization: Bearer <token>`
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Session cookie set by `auth.login` / `auth.register`.
fn cookie_token(jar: &CookieJar) -> Option<String> {
    let name = &config::config().security.session_cookie_name;
    jar.get(name)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Bearer first, then cookie.
pub fn credential(headers: &HeaderMap, jar: &CookieJar) -> Option<(CredentialSource, String)> {
    bearer_token(headers)
        .map(|t| (CredentialSource::Bearer, t))
        .or_else(|| cookie_token(jar).map(|t| (CredentialSource::Cookie, t)))
}

/// Turn a token into an active user. Every failure degrades to `None`.
pub async fn resolve_user(state: &AppState, token: &str) -> Option<AuthUser> {
    let claims = match validate_jwt(token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Ignoring session token: {}", e);
            return None;
        }
    };

    let user = match state.users.find_by_id(claims.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("Session token for unknown user {}", claims.user_id);
            return None;
        }
        Err(e) => {
            warn!("User lookup failed while resolving session: {}", e);
            return None;
        }
    };

    if !user.is_active {
        debug!("Session token for deactivated user {}", user.email);
        return None;
    }

    Some(AuthUser {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
    })
}

/// Global middleware building the request identity from whichever credential
/// the client sent. Never rejects a request.
pub async fn resolve_identity(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match credential(request.headers(), &jar) {
        Some((source, token)) => {
            let user = resolve_user(&state, &token).await;
            if let Some(user) = &user {
                debug!("Request authenticated as {} via {:?}", user.email, source);
            }
            user
        }
        None => None,
    };
    request.extensions_mut().insert(Identity(user));
    next.run(request).await
}

/// Route layer enforcing a `Guard` before the procedure body runs.
pub async fn require_guard(State(guard): State<Guard>, request: Request, next: Next) -> Result<Response, ApiError> {
    let role = request
        .extensions()
        .get::<Identity>()
        .and_then(Identity::user)
        .map(|u| u.role);

    guard.check(role).map_err(|e| match e {
        GuardError::Unauthenticated => ApiError::unauthorized("Authentication required"),
        GuardError::Forbidden => ApiError::forbidden("You do not have permission to perform this action"),
    })?;

    Ok(next.run(request).await)
}
