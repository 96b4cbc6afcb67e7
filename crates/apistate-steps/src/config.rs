//! Configuration of a scenario state and its collaborators.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StepResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateConfig {
    /// Print the last response body when a node step fails
    #[serde(default)]
    pub debug: bool,

    /// Timeout applied to every HTTP request
    #[serde(default = "default_request_timeout", with = "duration_millis")]
    pub request_timeout: Duration,

    /// Directory schema references are resolved against
    #[serde(default)]
    pub schema_dir: Option<PathBuf>,

    /// Seed for the random data generator; entropy when absent
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Fallback filter when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub json_logging: bool,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            debug: false,
            request_timeout: default_request_timeout(),
            schema_dir: None,
            random_seed: None,
            log_filter: default_log_filter(),
            json_logging: false,
        }
    }
}

impl StateConfig {
    /// Defaults overridden by `APISTATE_*` environment variables
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Ok(value) = env::var("APISTATE_DEBUG") {
            match parse_flag(&value) {
                Some(flag) => config.debug = flag,
                None => warn!("Invalid APISTATE_DEBUG value: {}", value),
            }
        }

        if let Ok(timeout) = env::var("APISTATE_REQUEST_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(ms) => config.request_timeout = Duration::from_millis(ms),
                Err(_) => warn!("Invalid APISTATE_REQUEST_TIMEOUT_MS value: {}", timeout),
            }
        }

        if let Ok(dir) = env::var("APISTATE_SCHEMA_DIR") {
            config.schema_dir = Some(PathBuf::from(dir));
        }

        if let Ok(seed) = env::var("APISTATE_RANDOM_SEED") {
            match seed.parse::<u64>() {
                Ok(seed) => config.random_seed = Some(seed),
                Err(_) => warn!("Invalid APISTATE_RANDOM_SEED value: {}", seed),
            }
        }

        if let Ok(filter) = env::var("APISTATE_LOG_FILTER") {
            config.log_filter = filter;
        }

        if let Ok(json) = env::var("APISTATE_JSON_LOGS") {
            match parse_flag(&json) {
                Some(flag) => config.json_logging = flag,
                None => warn!("Invalid APISTATE_JSON_LOGS value: {}", json),
            }
        }

        config
    }

    pub fn from_yaml_str(yaml: &str) -> StepResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
