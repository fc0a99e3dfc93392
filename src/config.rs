use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", "8080"),
            database_url: must_load("DATABASE_URL"),
            jwt_secret: must_load("JWT_SECRET"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn must_load(key: &str) -> String {
    var(key).expect("Environment misconfigured!")
}
