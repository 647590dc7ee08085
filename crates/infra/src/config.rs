//! Environment-driven configuration.
//!
//! Every setting has a development default; see [`StreamConfig::from_lookup`]
//! for the variables and their meaning.

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use funcstream_employees::Topics;

pub const BROKER_VAR: &str = "FUNCSTREAM_BROKER";
pub const REDIS_URL_VAR: &str = "REDIS_URL";
pub const CREATE_EMPLOYEE_TOPIC_VAR: &str = "FUNCSTREAM_CREATE_EMPLOYEE_TOPIC";
pub const EMPLOYEE_CREATED_TOPIC_VAR: &str = "FUNCSTREAM_EMPLOYEE_CREATED_TOPIC";
pub const FUNCTION_DEFINITION_VAR: &str = "FUNCSTREAM_FUNCTION_DEFINITION";
pub const TICK_TOPIC_VAR: &str = "FUNCSTREAM_TICK_TOPIC";
pub const TICK_INTERVAL_VAR: &str = "FUNCSTREAM_TICK_INTERVAL_MS";

const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";
const DEFAULT_FUNCTION_DEFINITION: &str = "calculate|round";
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown broker `{0}` (expected `memory` or `redis`)")]
    UnknownBroker(String),

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Which transport to run over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerKind {
    InMemory,
    Redis { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    pub broker: BrokerKind,
    pub topics: Topics,
    /// Calculator function definition, e.g. `calculate|round`.
    pub function_definition: String,
    /// When set, the `tick` supplier is polled onto this topic.
    pub tick_topic: Option<String>,
    pub tick_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            broker: BrokerKind::InMemory,
            topics: Topics::default(),
            function_definition: DEFAULT_FUNCTION_DEFINITION.to_string(),
            tick_topic: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl StreamConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    ///
    /// | variable | default |
    /// |----------|---------|
    /// | `FUNCSTREAM_BROKER` | `memory` (`memory` or `redis`) |
    /// | `REDIS_URL` | `redis://localhost:6379` |
    /// | `FUNCSTREAM_CREATE_EMPLOYEE_TOPIC` | `createEmployee` |
    /// | `FUNCSTREAM_EMPLOYEE_CREATED_TOPIC` | `employeeCreated` |
    /// | `FUNCSTREAM_FUNCTION_DEFINITION` | `calculate\|round` |
    /// | `FUNCSTREAM_TICK_TOPIC` | unset (no polling) |
    /// | `FUNCSTREAM_TICK_INTERVAL_MS` | `1000` |
    ///
    /// Values are trimmed; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let broker = match get(BROKER_VAR).as_deref() {
            None | Some("memory") => BrokerKind::InMemory,
            Some("redis") => {
                let url = get(REDIS_URL_VAR).unwrap_or_else(|| {
                    warn!("REDIS_URL not set; using {DEFAULT_REDIS_URL}");
                    DEFAULT_REDIS_URL.to_string()
                });
                BrokerKind::Redis { url }
            }
            Some(other) => return Err(ConfigError::UnknownBroker(other.to_string())),
        };

        let topics = Topics {
            create_employee: get(CREATE_EMPLOYEE_TOPIC_VAR)
                .unwrap_or(defaults.topics.create_employee),
            employee_created: get(EMPLOYEE_CREATED_TOPIC_VAR)
                .unwrap_or(defaults.topics.employee_created),
        };
        if topics.create_employee == topics.employee_created {
            return Err(ConfigError::Invalid {
                var: EMPLOYEE_CREATED_TOPIC_VAR,
                reason: "command and event topics must differ".to_string(),
            });
        }

        let tick_interval = match get(TICK_INTERVAL_VAR) {
            None => defaults.tick_interval,
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        var: TICK_INTERVAL_VAR,
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Ok(ms) => Duration::from_millis(ms),
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: TICK_INTERVAL_VAR,
                        reason: e.to_string(),
                    });
                }
            },
        };

        Ok(Self {
            broker,
            topics,
            function_definition: get(FUNCTION_DEFINITION_VAR)
                .unwrap_or(defaults.function_definition),
            tick_topic: get(TICK_TOPIC_VAR),
            tick_interval,
        })
    }
}
