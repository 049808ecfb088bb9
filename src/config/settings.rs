//! Application settings loaded from environment variables.

use std::env;

use super::constants::{
    DEFAULT_ACCESS_TOKEN_MINUTES, DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
    DEFAULT_DATABASE_MAX_CONNECTIONS, DEFAULT_DATABASE_URL, DEFAULT_REFRESH_TOKEN_DAYS,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEFAULT_VNPAY_BASE_URL, DEFAULT_VNPAY_RETURN_URL,
    MIN_JWT_SECRET_LENGTH,
};

const DEV_JWT_SECRET: &str = "dev-secret-key-minimum-32-chars!!";
const DEV_VNPAY_TMN_CODE: &str = "DEVTMN01";
const DEV_VNPAY_HASH_SECRET: &str = "DEVHASHSECRETDEVHASHSECRET000000";

/// JWT signing settings
#[derive(Clone)]
pub struct JwtSettings {
    secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
}

impl JwtSettings {
    pub fn new(secret: impl Into<String>, access_token_minutes: i64, refresh_token_days: i64) -> Self {
        Self {
            secret: secret.into(),
            access_token_minutes,
            refresh_token_days,
        }
    }

    /// Secret bytes for token signing/verification.
    pub fn secret_bytes(&self) -> &[u8] {
        self.secret.as_bytes()
    }
}

/// VNPay merchant settings
#[derive(Clone)]
pub struct VnPaySettings {
    pub tmn_code: String,
    hash_secret: String,
    pub base_url: String,
    pub return_url: String,
}

impl VnPaySettings {
    pub fn new(
        tmn_code: impl Into<String>,
        hash_secret: impl Into<String>,
        base_url: impl Into<String>,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            tmn_code: tmn_code.into(),
            hash_secret: hash_secret.into(),
            base_url: base_url.into(),
            return_url: return_url.into(),
        }
    }

    /// Merchant secret used for HMAC-SHA512 signatures.
    pub fn hash_secret(&self) -> &str {
        &self.hash_secret
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_connect_timeout_secs: u64,
    pub jwt: JwtSettings,
    pub vnpay: VnPaySettings,
    pub server_host: String,
    pub server_port: u16,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("database_max_connections", &self.database_max_connections)
            .field("jwt_secret", &"[REDACTED]")
            .field("access_token_minutes", &self.jwt.access_token_minutes)
            .field("refresh_token_days", &self.jwt.refresh_token_days)
            .field("vnpay_tmn_code", &self.vnpay.tmn_code)
            .field("vnpay_hash_secret", &"[REDACTED]")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .finish()
    }
}

impl Default for Config {
    /// Development defaults. Never use in production: the secrets are public.
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            database_max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            database_connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            jwt: JwtSettings::new(
                DEV_JWT_SECRET,
                DEFAULT_ACCESS_TOKEN_MINUTES,
                DEFAULT_REFRESH_TOKEN_DAYS,
            ),
            vnpay: VnPaySettings::new(
                DEV_VNPAY_TMN_CODE,
                DEV_VNPAY_HASH_SECRET,
                DEFAULT_VNPAY_BASE_URL,
                DEFAULT_VNPAY_RETURN_URL,
            ),
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics in release builds if `JWT_SECRET` or the VNPay merchant
    /// credentials are missing, and whenever the JWT secret is too short.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = required_in_release("JWT_SECRET", DEV_JWT_SECRET);
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            panic!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            database_max_connections: parsed_or(
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            ),
            database_connect_timeout_secs: parsed_or(
                "DATABASE_CONNECT_TIMEOUT_SECS",
                DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            ),
            jwt: JwtSettings::new(
                jwt_secret,
                parsed_or("JWT_ACCESS_TOKEN_MINUTES", DEFAULT_ACCESS_TOKEN_MINUTES),
                parsed_or("JWT_REFRESH_TOKEN_DAYS", DEFAULT_REFRESH_TOKEN_DAYS),
            ),
            vnpay: VnPaySettings::new(
                required_in_release("VNPAY_TMN_CODE", DEV_VNPAY_TMN_CODE),
                required_in_release("VNPAY_HASH_SECRET", DEV_VNPAY_HASH_SECRET),
                env::var("VNPAY_BASE_URL").unwrap_or_else(|_| DEFAULT_VNPAY_BASE_URL.to_string()),
                env::var("VNPAY_RETURN_URL")
                    .unwrap_or_else(|_| DEFAULT_VNPAY_RETURN_URL.to_string()),
            ),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: parsed_or("SERVER_PORT", DEFAULT_SERVER_PORT),
        }
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn required_in_release(key: &str, dev_default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            tracing::warn!("{} not set, using insecure default for development", key);
            dev_default.to_string()
        } else {
            panic!("{} environment variable must be set in production", key);
        }
    })
}
