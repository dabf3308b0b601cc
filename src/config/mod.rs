use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub ordering: OrderingConfig,
    pub reservations: ReservationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub password_hash_cost: u32,
    pub session_cookie_name: String,
    pub session_cookie_secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingConfig {
    pub tax_rate: Decimal,
    pub order_number_prefix: String,
}

/// How many reservations a single time slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityMode {
    /// Every slot takes `slot_capacity` parties.
    Fixed,
    /// A slot takes as many parties as there are active tables seating the party.
    Tables,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationConfig {
    pub slot_interval_minutes: u32,
    pub last_seating_buffer_minutes: u32,
    pub slot_capacity: u32,
    pub capacity_mode: CapacityMode,
}

const DEVELOPMENT_JWT_SECRET: &str = "ordo-development-secret-do-not-deploy";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("ORDO_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("ORDO_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_PASSWORD_HASH_COST") {
            self.security.password_hash_cost = v.parse().unwrap_or(self.security.password_hash_cost);
        }
        if let Ok(v) = env::var("SECURITY_SESSION_COOKIE_NAME") {
            self.security.session_cookie_name = v;
        }
        if let Ok(v) = env::var("SECURITY_SESSION_COOKIE_SECURE") {
            self.security.session_cookie_secure = v.parse().unwrap_or(self.security.session_cookie_secure);
        }

        // Business overrides
        if let Ok(v) = env::var("ORDERING_TAX_RATE") {
            self.ordering.tax_rate = v.parse().unwrap_or(self.ordering.tax_rate);
        }
        if let Ok(v) = env::var("ORDERING_ORDER_NUMBER_PREFIX") {
            self.ordering.order_number_prefix = v;
        }
        if let Ok(v) = env::var("RESERVATIONS_SLOT_INTERVAL_MINUTES") {
            self.reservations.slot_interval_minutes = v.parse().unwrap_or(self.reservations.slot_interval_minutes);
        }
        if let Ok(v) = env::var("RESERVATIONS_LAST_SEATING_BUFFER_MINUTES") {
            self.reservations.last_seating_buffer_minutes =
                v.parse().unwrap_or(self.reservations.last_seating_buffer_minutes);
        }
        if let Ok(v) = env::var("RESERVATIONS_SLOT_CAPACITY") {
            self.reservations.slot_capacity = v.parse().unwrap_or(self.reservations.slot_capacity);
        }
        if let Ok(v) = env::var("RESERVATIONS_CAPACITY_MODE") {
            self.reservations.capacity_mode = match v.as_str() {
                "tables" => CapacityMode::Tables,
                "fixed" => CapacityMode::Fixed,
                _ => self.reservations.capacity_mode,
            };
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                password_hash_cost: 4,
                session_cookie_name: "ordo_session".to_string(),
                session_cookie_secure: false,
            },
            ordering: OrderingConfig::default(),
            reservations: ReservationConfig::default(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7,
                password_hash_cost: 10,
                session_cookie_name: "ordo_session".to_string(),
                session_cookie_secure: true,
            },
            ordering: OrderingConfig::default(),
            reservations: ReservationConfig::default(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7,
                password_hash_cost: 12,
                session_cookie_name: "ordo_session".to_string(),
                session_cookie_secure: true,
            },
            ordering: OrderingConfig::default(),
            reservations: ReservationConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(16, 2),
            order_number_prefix: "ORD".to_string(),
        }
    }
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            slot_interval_minutes: 30,
            last_seating_buffer_minutes: 120,
            slot_capacity: 3,
            capacity_mode: CapacityMode::Fixed,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}
