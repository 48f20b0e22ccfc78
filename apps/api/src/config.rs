use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use summitdesk_core::AppError;
use tracing_subscriber::EnvFilter;

/// Environment-derived runtime configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub roblox_api_key: String,
    pub universe_id: String,
    pub datastore_name: String,
    pub datastore_scope: String,
    pub admin_password: String,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
}

impl ApiConfig {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, AppError> {
        let roblox_api_key = required_env("ROBLOX_API_KEY")?;
        let universe_id = required_env("UNIVERSE_ID")?;
        let admin_password = required_env("ADMIN_PASSWORD")?;
        if admin_password.trim().is_empty() {
            return Err(AppError::Validation(
                "ADMIN_PASSWORD must not be empty".to_owned(),
            ));
        }

        let datastore_name =
            env::var("DATASTORE_NAME").unwrap_or_else(|_| "PlayerData".to_owned());
        let datastore_scope = env::var("DATASTORE_SCOPE").unwrap_or_else(|_| "global".to_owned());
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(5000);

        Ok(Self {
            roblox_api_key,
            universe_id,
            datastore_name,
            datastore_scope,
            admin_password,
            frontend_url,
            api_host,
            api_port,
        })
    }

    /// Resolves the configured bind address.
    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;

        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
