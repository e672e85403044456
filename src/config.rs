// src/config.rs

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;

/// Process-wide configuration, loaded once at startup from the .env file.
/// The signing credential is supplied out-of-band and never persisted or
/// logged by this crate.
#[derive(Clone, Debug)]
pub struct Config {
    /// JSON-RPC endpoint of the configured chain.
    pub rpc_url: String,
    /// Address of the deployed contract every invocation targets.
    pub contract_address: String,
    /// Signing key of the configured identity.
    pub private_key: SecretString,

    // Transaction settings
    /// Fixed gas limit; estimated per transaction when unset.
    pub gas_limit: Option<u64>,
    /// Fixed legacy gas price in wei; fetched per transaction when unset.
    pub gas_price: Option<u64>,

    // Confirmation settings
    /// Maximum confirmation wait; unbounded when unset.
    pub confirmation_timeout: Option<Duration>,
    /// Pause between receipt polls.
    pub confirmation_poll_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let rpc_url = env::var("RPC_URL")
            .context("RPC_URL must be set to the chain's JSON-RPC endpoint")?;
        let contract_address = env::var("CONTRACT_ADDRESS")
            .context("CONTRACT_ADDRESS must be set to the deployed contract address")?;
        let private_key = SecretString::new(
            env::var("PRIVATE_KEY").context("PRIVATE_KEY must be set to the signing key")?,
        );

        let gas_limit = match env::var("GAS_LIMIT") {
            Ok(v) => Some(v.parse().context("GAS_LIMIT must be a valid number")?),
            Err(_) => None,
        };
        let gas_price = match env::var("GAS_PRICE") {
            Ok(v) => Some(v.parse().context("GAS_PRICE must be a valid number")?),
            Err(_) => None,
        };

        let confirmation_timeout = match env::var("CONFIRMATION_TIMEOUT_SECS") {
            Ok(v) => Some(Duration::from_secs(
                v.parse()
                    .context("CONFIRMATION_TIMEOUT_SECS must be a valid number")?,
            )),
            Err(_) => None,
        };
        let confirmation_poll_interval = Duration::from_millis(
            env::var("CONFIRMATION_POLL_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .context("CONFIRMATION_POLL_MS must be a valid number")?,
        );

        Ok(Config {
            rpc_url,
            contract_address,
            private_key,
            gas_limit,
            gas_price,
            confirmation_timeout,
            confirmation_poll_interval,
        })
    }
}
