//! Configuration for the metric filter.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration for [`crate::MetricFilter`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Address the TCP ingester listens on.
    pub listen_address: String,
    /// Path to the retention schema file.
    pub retention_config_path: PathBuf,
    /// Batcher flushes once its buffer holds this many metrics.
    pub cache_capacity: usize,
    /// How often the pattern trie is rebuilt from the store.
    #[serde(with = "seconds")]
    pub refresh_interval: Duration,
    /// How often the batcher flushes regardless of buffer size.
    #[serde(with = "seconds")]
    pub flush_interval: Duration,
    /// How often the heartbeat samples the received counter.
    #[serde(with = "seconds")]
    pub heartbeat_interval: Duration,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1:2003".to_string(),
            retention_config_path: PathBuf::from("storage-schemas.conf"),
            cache_capacity: 10_000,
            refresh_interval: Duration::from_secs(1),
            flush_interval: Duration::from_secs(1),
            heartbeat_interval: Duration::from_secs(5),
        }
    }
}

mod seconds {
    //! Durations configured as integer seconds.

    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
