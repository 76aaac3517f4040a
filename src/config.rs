//! Configuration types for visreg-dl

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level library configuration
///
/// Groups the tunables of the long-running-request protocol client. All fields
/// have defaults matching the service's documented behavior, so
/// `Config::default()` works out of the box.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Send-attempt retry behavior for transport-level failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Polling behavior after the service accepts a job asynchronously
    #[serde(default)]
    pub polling: PollingConfig,

    /// Per-request timeout applied to the HTTP client
    #[serde(default = "default_request_timeout", with = "duration_secs_serde")]
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            polling: PollingConfig::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Retry configuration for individual send attempts
///
/// Applies only to transport-level failures (connection refused, timeouts).
/// HTTP error statuses are classified by the long-request state machine and
/// are never retried here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after a failed send (default: 1)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Sleep for `retry_interval` before each retry (default: false)
    #[serde(default)]
    pub delay_before_retry: bool,

    /// Fixed delay before a retry when `delay_before_retry` is set (default: 500ms)
    #[serde(default = "default_retry_interval", with = "duration_millis_serde")]
    pub retry_interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay_before_retry: false,
            retry_interval: Duration::from_millis(500),
        }
    }
}

/// Polling configuration for asynchronously accepted jobs
///
/// After a `202 Accepted`, the client polls the follow-up location with a
/// delay that grows by `backoff_multiplier` each round, capped at `max_delay`.
/// There is no iteration limit; polling ends when the service resolves the job
/// or a failure propagates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Delay before the first poll (default: 2 seconds)
    #[serde(default = "default_initial_delay", with = "duration_secs_serde")]
    pub initial_delay: Duration,

    /// Upper bound on the poll delay (default: 10 seconds)
    #[serde(default = "default_max_delay", with = "duration_secs_serde")]
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each unresolved poll (default: 1.5)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 1.5,
        }
    }
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_backoff_multiplier() -> f64 {
    1.5
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

// Duration serialization helper (whole seconds)
mod duration_secs_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds, for sub-second intervals)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
