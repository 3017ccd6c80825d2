/// API server configuration
///
/// Read from environment variables (and a `.env` file in development).
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: Bind address (default `0.0.0.0:8080`)
/// - `API_CORS_ORIGINS`: Comma-separated origins, `*` for any (default `*`)
/// - `API_PRODUCTION`: Enables HSTS (default `false`)
/// - `PUBLIC_MENU_BASE_URL`: Base of the customer menu URLs encoded in QR codes
/// - `DATABASE_URL` (required), `DATABASE_MAX_CONNECTIONS` (default 10)
/// - `JWT_SECRET` (required, at least 32 characters)
/// - `BILLING_WEBHOOK_SECRET` (required, at least 32 characters)
/// - `TRIAL_DAYS` (default 14)
/// - `PREMIUM_MONTHLY_PRICE` (default `19.99`), `BILLING_CURRENCY` (default `EUR`)

use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

/// Minimum length of signing secrets
pub const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub billing: BillingConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub production: bool,

    /// Customer-facing menu site, without trailing slash
    pub public_menu_base_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub webhook_secret: String,
    pub trial_days: i64,
    pub monthly_price: Decimal,
    pub currency: String,
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| {
            lookup(key).ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
        };

        let port = var("API_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT: {}", e))?;

        let cors_origins = var("API_CORS_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let production = parse_bool(&var("API_PRODUCTION", "false"))
            .ok_or_else(|| anyhow::anyhow!("API_PRODUCTION must be true or false"))?;

        let max_connections = var("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS: {}", e))?;

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let webhook_secret = required("BILLING_WEBHOOK_SECRET")?;
        if webhook_secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!("BILLING_WEBHOOK_SECRET must be at least 32 characters long");
        }

        let trial_days = var("TRIAL_DAYS", "14")
            .parse::<i64>()
            .map_err(|e| anyhow::anyhow!("TRIAL_DAYS: {}", e))?;
        if !(1..=365).contains(&trial_days) {
            anyhow::bail!("TRIAL_DAYS must be between 1 and 365");
        }

        let monthly_price = Decimal::from_str(&var("PREMIUM_MONTHLY_PRICE", "19.99"))
            .map_err(|e| anyhow::anyhow!("PREMIUM_MONTHLY_PRICE: {}", e))?;
        if monthly_price <= Decimal::ZERO {
            anyhow::bail!("PREMIUM_MONTHLY_PRICE must be positive");
        }

        let currency = var("BILLING_CURRENCY", "EUR").to_uppercase();
        if !menuboard_shared::models::settings::is_currency_code(&currency) {
            anyhow::bail!("BILLING_CURRENCY must be a 3-letter ISO 4217 code");
        }

        Ok(Self {
            api: ApiConfig {
                host: var("API_HOST", "0.0.0.0"),
                port,
                cors_origins,
                production,
                public_menu_base_url: var("PUBLIC_MENU_BASE_URL", "http://localhost:3000")
                    .trim_end_matches('/')
                    .to_string(),
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            billing: BillingConfig {
                webhook_secret,
                trial_days,
                monthly_price,
                currency,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
