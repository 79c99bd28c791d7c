use std::time::Duration;

use fdg_common::Secret;
use log::*;

const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Base URL of the gateway REST API, e.g. `https://gateway.example.com`.
    pub api_url: String,
    /// API key presented as a bearer token on every call.
    pub secret_key: Secret<String>,
    /// Key used to verify the HMAC signature on inbound webhook events.
    pub webhook_secret: Secret<String>,
    /// Upper bound on any single gateway call. Calls that exceed it surface as a retryable timeout.
    pub timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            api_url: "https://gateway.example.com".to_string(),
            secret_key: Secret::default(),
            webhook_secret: Secret::default(),
            timeout: Duration::from_secs(DEFAULT_GATEWAY_TIMEOUT_SECS),
        }
    }
}

impl CheckoutConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("FDG_CHECKOUT_API_URL").unwrap_or_else(|_| {
            warn!("FDG_CHECKOUT_API_URL not set, using a (probably useless) default");
            "https://gateway.example.com".to_string()
        });
        let secret_key = Secret::new(std::env::var("FDG_CHECKOUT_SECRET_KEY").unwrap_or_else(|_| {
            warn!("FDG_CHECKOUT_SECRET_KEY not set, gateway calls will not authenticate");
            String::default()
        }));
        let webhook_secret = Secret::new(std::env::var("FDG_CHECKOUT_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("FDG_CHECKOUT_WEBHOOK_SECRET not set, webhook signatures cannot be verified");
            String::default()
        }));
        let timeout = std::env::var("FDG_CHECKOUT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_GATEWAY_TIMEOUT_SECS));
        Self { api_url, secret_key, webhook_secret, timeout }
    }
}
