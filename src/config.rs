//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Store backend: `"redis"` or `"memory"`.
    pub store_backend: String,

    /// Redis connection URL.
    pub redis_url: String,

    /// Retention window for a booking's bid list, refreshed on every append.
    pub bid_ttl_secs: u64,

    /// Symmetric secret used to verify bearer tokens.
    pub token_secret: String,

    /// Ring-buffer capacity per channel for the in-memory broker backend.
    pub broker_channel_capacity: usize,
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let store_backend =
            std::env::var("STORE_BACKEND").unwrap_or_else(|_| "redis".to_string());

        let redis_url = std::env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://localhost:6379".to_string());

        // 15 minutes: bids are only useful for the lifetime of an active
        // bidding window.
        let bid_ttl_secs = parse_env("BID_TTL_SECS", 900);

        let token_secret = std::env::var("TOKEN_SECRET")
            .unwrap_or_else(|_| "insecure-dev-secret".to_string());

        let broker_channel_capacity = parse_env("BROKER_CHANNEL_CAPACITY", 1024);

        Ok(Self {
            listen_addr,
            store_backend,
            redis_url,
            bid_ttl_secs,
            token_secret,
            broker_channel_capacity,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_on_missing() {
        assert_eq!(parse_env("RIDEBID_TEST_UNSET_KEY", 900u64), 900);
    }
}
