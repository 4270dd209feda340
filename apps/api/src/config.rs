use std::env;
use std::net::IpAddr;
use std::str::FromStr;

use muster_core::AppError;

/// Runtime configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub api_host: IpAddr,
    pub api_port: u16,
    pub allowed_origin: String,
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_display_name: String,
}

impl ApiConfig {
    /// Loads and validates configuration from the process environment.
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_host = IpAddr::from_str(api_host.as_str())
            .map_err(|error| AppError::Validation(format!("invalid API_HOST: {error}")))?;
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let allowed_origin =
            env::var("ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let bootstrap_admin_email = env::var("BOOTSTRAP_ADMIN_EMAIL")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let bootstrap_admin_display_name = env::var("BOOTSTRAP_ADMIN_DISPLAY_NAME")
            .unwrap_or_else(|_| "Portal Administrator".to_owned());

        Ok(Self {
            migrate_only,
            database_url,
            api_host,
            api_port,
            allowed_origin,
            bootstrap_admin_email,
            bootstrap_admin_display_name,
        })
    }
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} must be set")))
}
