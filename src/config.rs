use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::scheduler::Period;
use crate::utils::get_env_with_prefix;

/// Main configuration for a tollgate instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub billing: BillingConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

/// Configuration for the charge retry loop and batch fan-out.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingConfig {
    /// Maximum provider calls per invoice per run.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base retry delay in milliseconds (exponential: base * 2^(attempt-1)).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum invoices charged concurrently within one batch.
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
}

/// Configuration for the periodic billing trigger.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Run billing automatically at each period boundary.
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,

    /// Calendar period between billing runs.
    #[serde(default)]
    pub period: Period,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            billing: BillingConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            batch_concurrency: default_batch_concurrency(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            period: Period::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Each variable is checked with the `TOLLGATE_` prefix first, then
    /// unprefixed. Unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(host) = get_env_with_prefix("HOST") {
            config.server.host = host;
        }
        if let Some(port) = get_env_with_prefix("PORT") {
            if let Ok(p) = port.parse() {
                config.server.port = p;
            }
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            config.logging.json = json.parse().unwrap_or(false);
        }
        if let Some(attempts) = get_env_with_prefix("BILLING_MAX_ATTEMPTS") {
            if let Ok(a) = attempts.parse() {
                config.billing.max_attempts = a;
            }
        }
        if let Some(delay) = get_env_with_prefix("BILLING_BASE_DELAY_MS") {
            if let Ok(d) = delay.parse() {
                config.billing.base_delay_ms = d;
            }
        }
        if let Some(concurrency) = get_env_with_prefix("BILLING_BATCH_CONCURRENCY") {
            if let Ok(c) = concurrency.parse() {
                config.billing.batch_concurrency = c;
            }
        }
        if let Some(enabled) = get_env_with_prefix("SCHEDULER_ENABLED") {
            config.scheduler.enabled = enabled.parse().unwrap_or(true);
        }

        config
    }
}

impl ServerConfig {
    /// The socket address to bind the REST server to.
    pub fn addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_batch_concurrency() -> usize {
    8
}

fn default_scheduler_enabled() -> bool {
    true
}
