use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

use tracing::{info, warn};

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub database_url: Option<String>,
    pub seed_samples: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            addr: try_load("CHEERS_ADDR", DEFAULT_ADDR),
            database_url: var("DATABASE_URL"),
            seed_samples: try_load("CHEERS_SEED_SAMPLES", "false"),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_url: None,
            seed_samples: false,
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    match raw.parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            parse_default(key, default)
        }
    }
}

fn parse_default<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    default
        .parse()
        .unwrap_or_else(|e| panic!("default for {key} does not parse: {e}"))
}
