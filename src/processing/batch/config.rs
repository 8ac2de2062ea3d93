use std::time::Duration;
use serde::{Serialize, Deserialize};

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Tuning for one batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchConfig {
    /// Conversions in flight at once
    pub concurrency: usize,
    /// Per-item limit; `None` waits as long as the converter takes
    #[serde(default)]
    pub item_timeout: Option<Duration>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            item_timeout: None,
        }
    }
}

impl BatchConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_item_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.item_timeout = timeout;
        self
    }

    /// Concurrency clamped to at least one
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_concurrency_still_runs_one() {
        let config = BatchConfig { concurrency: 0, item_timeout: None };
        assert_eq!(config.effective_concurrency(), 1);
        assert_eq!(BatchConfig::default().with_concurrency(0).concurrency, 1);
    }
}
