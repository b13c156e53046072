use std::time::Duration;

use bms_common::Secret;
use log::*;

pub const DEFAULT_IDP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct IdpConfig {
    pub base_url: String,
    pub service_key: Secret<String>,
    pub timeout: Duration,
}

impl Default for IdpConfig {
    fn default() -> Self {
        Self { base_url: String::default(), service_key: Secret::default(), timeout: DEFAULT_IDP_TIMEOUT }
    }
}

impl IdpConfig {
    pub fn new(base_url: &str, service_key: Secret<String>) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), service_key, timeout: DEFAULT_IDP_TIMEOUT }
    }

    /// Build the provider configuration from the environment, or `None` when
    /// `BMS_IDP_BASE_URL` is not set (local-only deployments have no identity provider).
    pub fn try_from_env() -> Option<Self> {
        let base_url = std::env::var("BMS_IDP_BASE_URL").ok()?;
        let service_key = Secret::new(std::env::var("BMS_IDP_SERVICE_KEY").unwrap_or_else(|_| {
            warn!("🪛️ BMS_IDP_SERVICE_KEY is not set. Key-set queries will be unauthenticated and the provider will \
                   most likely reject them.");
            String::new()
        }));
        let timeout = match std::env::var("BMS_IDP_TIMEOUT_SECS") {
            Ok(s) => match s.parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(_) => {
                    warn!("🪛️ BMS_IDP_TIMEOUT_SECS ({s}) is not a number of seconds. Using the default.");
                    DEFAULT_IDP_TIMEOUT
                },
            },
            Err(_) => DEFAULT_IDP_TIMEOUT,
        };
        let mut config = Self::new(&base_url, service_key);
        config.timeout = timeout;
        Some(config)
    }
}
