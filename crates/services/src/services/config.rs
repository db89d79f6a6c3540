//! Runtime configuration loaded from the environment.

use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    /// How often the expiry poller runs.
    pub poll_interval: Duration,
    /// How far ahead contract expirations are flagged.
    pub contract_lookahead_days: i64,
    /// How far ahead payment due dates are flagged.
    pub payment_lookahead_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("locmaq.db"),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            poll_interval: Duration::from_secs(3600),
            contract_lookahead_days: 7,
            payment_lookahead_days: 5,
        }
    }
}

impl Config {
    /// Build a config from `LOCMAQ_*` environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = env::var("LOCMAQ_DB_PATH") {
            config.db_path = PathBuf::from(value);
        }
        if let Ok(value) = env::var("LOCMAQ_BIND_ADDR") {
            match value.parse() {
                Ok(addr) => config.bind_addr = addr,
                Err(_) => warn!(value, "ignoring invalid LOCMAQ_BIND_ADDR"),
            }
        }
        if let Some(secs) = parse_env_i64("LOCMAQ_POLL_INTERVAL_SECS") {
            config.poll_interval = Duration::from_secs(secs.max(1) as u64);
        }
        if let Some(days) = parse_env_i64("LOCMAQ_CONTRACT_LOOKAHEAD_DAYS") {
            config.contract_lookahead_days = days.max(0);
        }
        if let Some(days) = parse_env_i64("LOCMAQ_PAYMENT_LOOKAHEAD_DAYS") {
            config.payment_lookahead_days = days.max(0);
        }
        config
    }
}

fn parse_env_i64(key: &str) -> Option<i64> {
    let value = env::var(key).ok()?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(key, value, "ignoring invalid numeric environment variable");
            None
        }
    }
}
