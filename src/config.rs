use std::env;
use std::time::Duration;

/// Placeholder secrets used only when running in dev mode without a `.env`.
const DEV_JWT_SECRET: &str = "dev-only-jwt-secret-change-me";
const DEV_STRIPE_SECRET_KEY: &str = "sk_test_dev_placeholder";
const DEV_STRIPE_WEBHOOK_SECRET: &str = "whsec_dev_placeholder";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Origin of the client application; used for default checkout redirects and CORS.
    pub frontend_url: String,
    pub jwt_secret: String,
    pub token_ttl_days: u64,
    pub stripe: StripeSettings,
    pub bootstrap_admin_email: Option<String>,
    pub dev_mode: bool,
}

#[derive(Debug, Clone)]
pub struct StripeSettings {
    pub secret_key: String,
    pub webhook_secret: String,
    /// Overridable so tests and local mocks can stand in for api.stripe.com.
    pub api_base: String,
    /// ISO currency code (lowercase) used for every checkout line item.
    pub currency: String,
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from the environment (and `.env` if present).
    ///
    /// Outside dev mode the JWT secret and both Stripe secrets are required.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("APP_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5001);

        let frontend_url = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let jwt_secret = required_secret("JWT_SECRET", DEV_JWT_SECRET, dev_mode)?;
        let token_ttl_days = env::var("TOKEN_TTL_DAYS")
            .ok()
            .and_then(|d| d.parse().ok())
            .unwrap_or(30);

        let stripe = StripeSettings {
            secret_key: required_secret("STRIPE_SECRET_KEY", DEV_STRIPE_SECRET_KEY, dev_mode)?,
            webhook_secret: required_secret(
                "STRIPE_WEBHOOK_SECRET",
                DEV_STRIPE_WEBHOOK_SECRET,
                dev_mode,
            )?,
            api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            currency: env::var("CURRENCY")
                .unwrap_or_else(|_| "usd".to_string())
                .to_lowercase(),
            timeout: Duration::from_secs(
                env::var("GATEWAY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(15),
            ),
        };

        Ok(Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "donations.db".to_string()),
            frontend_url,
            jwt_secret,
            token_ttl_days,
            stripe,
            bootstrap_admin_email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            dev_mode,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required_secret(name: &str, dev_default: &str, dev_mode: bool) -> Result<String, String> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ if dev_mode => {
            tracing::warn!("{} not set, using dev placeholder", name);
            Ok(dev_default.to_string())
        }
        _ => Err(format!("{} must be set outside dev mode", name)),
    }
}
