use std::env;
use chrono_tz::Tz;
use crate::error::BootstrapError;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub timezone: Tz, // Day boundaries for event status are computed in this zone
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self, BootstrapError> {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse()
                .map_err(|_| BootstrapError::Config(format!("PORT must be a number, got '{}'", raw)))?,
            Err(_) => 5000,
        };

        let timezone = match env::var("EVENT_TIMEZONE") {
            Ok(raw) => raw.parse::<Tz>()
                .map_err(|_| BootstrapError::Config(format!("EVENT_TIMEZONE '{}' is not an IANA timezone", raw)))?,
            Err(_) => chrono_tz::UTC,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://campus_portal.db?mode=rwc".to_string()),
            port,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| BootstrapError::Config("JWT_SECRET must be set".into()))?,
            timezone,
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_default(),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string()),
        })
    }
}
