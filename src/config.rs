use anyhow::{Context, Result};
use std::env;
use url::Url;

/// Default game server endpoint for local development.
pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:3842/socket";

/// Default minimum withdrawal, in bits. The server enforces its own floor;
/// this one only drives client-side validation.
pub const DEFAULT_MIN_DIVEST_BITS: u64 = 100;

/// One bit expressed in the smallest currency unit carried on the wire.
pub const BITS_SCALE: u64 = 100;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_url: String,
    /// Minimum withdrawal in smallest currency units (bits * 100).
    pub min_divest: u64,
}

impl Config {
    pub fn new(server_url: String, min_divest: u64) -> Self {
        Self {
            server_url,
            min_divest,
        }
    }

    /// Build a config from the environment, falling back to defaults.
    ///
    /// `BANKROLL_SERVER_URL` must be a valid ws:// or wss:// URL when set.
    /// `MIN_DIVEST_BITS` is given in bits and stored in base units.
    pub fn from_env() -> Result<Self> {
        let server_url = match env::var("BANKROLL_SERVER_URL") {
            Ok(raw) => {
                let url = Url::parse(raw.trim())
                    .with_context(|| format!("invalid BANKROLL_SERVER_URL: {}", raw))?;
                if url.scheme() != "ws" && url.scheme() != "wss" {
                    anyhow::bail!(
                        "BANKROLL_SERVER_URL must use ws:// or wss://, got {}",
                        url.scheme()
                    );
                }
                url.to_string()
            }
            Err(_) => DEFAULT_SERVER_URL.to_string(),
        };

        let min_divest = env::var("MIN_DIVEST_BITS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_MIN_DIVEST_BITS)
            * BITS_SCALE;

        Ok(Self {
            server_url,
            min_divest,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            DEFAULT_SERVER_URL.to_string(),
            DEFAULT_MIN_DIVEST_BITS * BITS_SCALE,
        )
    }
}
