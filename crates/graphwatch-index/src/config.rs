//! Configuration for the index lifecycle.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for [`crate::SearchIndex`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// How many trigger checks are fetched and written per fill batch.
    pub batch_size: usize,
    /// How many fill batches are in flight concurrently.
    pub fill_parallelism: usize,
    /// How often the actualizer consumes the change-feed.
    #[serde(with = "seconds")]
    pub actualize_interval: Duration,
    /// How often the sweeper trims the change-feed.
    #[serde(with = "seconds")]
    pub sweeper_interval: Duration,
    /// Change-feed entries older than this are swept.
    #[serde(with = "seconds")]
    pub sweeper_keep: Duration,
    /// How often the index is refilled from scratch.
    #[serde(with = "seconds")]
    pub refill_interval: Duration,
    /// The actualizer logs an error once the watermark lags this far behind.
    #[serde(with = "seconds")]
    pub max_staleness: Duration,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            fill_parallelism: 4,
            actualize_interval: Duration::from_secs(1),
            sweeper_interval: Duration::from_secs(60),
            sweeper_keep: Duration::from_secs(3600),
            refill_interval: Duration::from_secs(30 * 60),
            max_staleness: Duration::from_secs(3600),
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
