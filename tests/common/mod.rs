#![allow(dead_code)]

use std::str::FromStr;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use ordo::auth::{generate_jwt, Claims};
use ordo::database::models::User;
use ordo::state::AppState;
use ordo::testing::MemoryStore;
use ordo::types::Role;

/// Far enough ahead that "not in the past" checks never trip.
pub const MONDAY: &str = "2031-06-02";
pub const SUNDAY: &str = "2031-06-01";

pub struct TestApp {
    pub state: AppState,
    pub store: MemoryStore,
    router: Router,
}

pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
    pub set_cookie: Option<String>,
}

impl Reply {
    /// `data` of a success envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}

pub fn dec(value: &Value) -> Decimal {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Decimal::from_str(&text).unwrap_or_else(|_| panic!("not a decimal: {}", value))
}

/// Log through the test harness when `RUST_LOG` is set. Every test binary
/// calls this; only the first call installs a subscriber.
fn init_tracing() {
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
    {
        tracing::trace!(error = %e, "tracing already initialised");
    }
}

impl TestApp {
    pub fn new() -> Self {
        init_tracing();
        let (state, store) = AppState::in_memory();
        let router = ordo::app(state.clone());
        Self { state, store, router }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>, headers: &[(&str, String)]) -> Result<Reply> {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value)?)
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body)?).await?;
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response is not JSON")?
        };
        Ok(Reply { status, body, set_cookie })
    }

    /// Call `POST /rpc/<procedure>`, optionally with a bearer token.
    pub async fn call(&self, procedure: &str, input: Value, token: Option<&str>) -> Result<Reply> {
        let headers: Vec<(&str, String)> = token
            .map(|t| vec![("authorization", format!("Bearer {}", t))])
            .unwrap_or_default();
        self.request(Method::POST, &format!("/rpc/{}", procedure), Some(input), &headers)
            .await
    }

    /// Insert an active account with `role` and return a session token for it.
    pub async fn token_for(&self, role: Role) -> Result<String> {
        let user = self.user(role).await?;
        Ok(generate_jwt(&Claims::new(user.id, user.email, user.role))?)
    }

    /// Token for a real active account whose expiry lies two hours in the past.
    pub async fn expired_token_for(&self, role: Role) -> Result<String> {
        let user = self.user(role).await?;
        let mut claims = Claims::new(user.id, user.email, user.role);
        claims.iat -= 10 * 3600;
        claims.exp = (Utc::now() - chrono::Duration::hours(2)).timestamp();
        Ok(generate_jwt(&claims)?)
    }

    pub async fn user(&self, role: Role) -> Result<User> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let user = User {
            id,
            email: format!("{}-{}@ordo.test", role.as_str().to_lowercase(), id.simple()),
            name: format!("{} user", role),
            password_hash: String::new(),
            role,
            is_active: true,
            phone: None,
            created_at: now,
            updated_at: now,
        };
        Ok(self.state.users.insert(&user).await?)
    }

    /// Restaurant open 09:00-22:00 every day except Sunday.
    pub async fn seed_restaurant(&self, services: Value) -> Result<Value> {
        let admin = self.token_for(Role::Admin).await?;
        let day = json!({ "open": "09:00", "close": "22:00" });
        let reply = self
            .call(
                "restaurant.create",
                json!({
                    "slug": "casa-ordo",
                    "name": "Casa Ordo",
                    "openingHours": {
                        "monday": day, "tuesday": day, "wednesday": day, "thursday": day,
                        "friday": day, "saturday": day,
                        "sunday": { "open": "09:00", "close": "22:00", "is_closed": true },
                    },
                    "services": services,
                    "deliveryConfig": {
                        "fee": "30.00",
                        "minimum_order": "150.00",
                        "is_free_over_amount": "300.00",
                    },
                }),
                Some(&admin),
            )
            .await?;
        anyhow::ensure!(reply.status == StatusCode::OK, "restaurant.create failed: {}", reply.body);
        Ok(reply.data().clone())
    }

    pub async fn seed_default_restaurant(&self) -> Result<Value> {
        self.seed_restaurant(json!({
            "dine_in": true, "takeout": true, "delivery": true, "reservations": true
        }))
        .await
    }

    /// One category holding one item at `price`; returns the item id.
    pub async fn seed_item(&self, name: &str, price: &str) -> Result<String> {
        let admin = self.token_for(Role::Admin).await?;
        let category = self
            .call("menu.createCategory", json!({ "name": format!("{} category", name) }), Some(&admin))
            .await?;
        anyhow::ensure!(category.status == StatusCode::OK, "createCategory failed: {}", category.body);

        let item = self
            .call(
                "menu.createItem",
                json!({
                    "categoryId": category.data()["id"],
                    "name": name,
                    "description": format!("House {}", name.to_lowercase()),
                    "price": price,
                }),
                Some(&admin),
            )
            .await?;
        anyhow::ensure!(item.status == StatusCode::OK, "createItem failed: {}", item.body);
        Ok(item.data()["id"].as_str().unwrap_or_default().to_string())
    }
}
