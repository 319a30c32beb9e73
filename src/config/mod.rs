//! Environment-driven configuration.
//!
//! Everything the process needs comes from `VENUE_*` variables, with
//! defaults suitable for local development.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication; unset disables auth
    pub api_psk: Option<String>,
    /// Path to the SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from the environment, reading a `.env` file first
    /// when one is present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let bind_addr = env_or("VENUE_BIND_ADDR", "127.0.0.1:8080")
            .parse()
            .expect("VENUE_BIND_ADDR is not a valid socket address");

        Self {
            api_psk: env::var("VENUE_API_PSK").ok(),
            db_path: env_or("VENUE_DB_PATH", "./data/venue.sqlite").into(),
            bind_addr,
            log_level: env_or("VENUE_LOG_LEVEL", "info"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 4] = [
        "VENUE_API_PSK",
        "VENUE_DB_PATH",
        "VENUE_BIND_ADDR",
        "VENUE_LOG_LEVEL",
    ];

    // Both cases mutate the process environment, so they live in one test
    // instead of racing each other across threads.
    #[test]
    fn test_from_env_defaults_and_overrides() {
        for key in KEYS {
            env::remove_var(key);
        }

        let defaults = Config::from_env();
        assert!(defaults.api_psk.is_none());
        assert_eq!(defaults.db_path, PathBuf::from("./data/venue.sqlite"));
        assert_eq!(defaults.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(defaults.log_level, "info");

        env::set_var("VENUE_API_PSK", "local-test-key");
        env::set_var("VENUE_DB_PATH", "/tmp/venue-test.sqlite");
        env::set_var("VENUE_BIND_ADDR", "0.0.0.0:9099");
        env::set_var("VENUE_LOG_LEVEL", "debug");

        let overridden = Config::from_env();
        assert_eq!(overridden.api_psk.as_deref(), Some("local-test-key"));
        assert_eq!(overridden.db_path, PathBuf::from("/tmp/venue-test.sqlite"));
        assert_eq!(overridden.bind_addr.to_string(), "0.0.0.0:9099");
        assert_eq!(overridden.log_level, "debug");

        for key in KEYS {
            env::remove_var(key);
        }
    }
}
