//! Engine configuration.

use std::time::Duration;

use crate::state::DEFAULT_MAX_GROUPS_PER_WINDOW;

/// Configuration for one pipeline instance.
///
/// Window shapes and lateness are externally settable so feature
/// definitions can evolve without code changes; the defaults match the
/// built-in coupon-validation features.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hopping window size. Default: 10 minutes.
    pub hopping_size: Duration,
    /// Hopping window slide. Default: 5 minutes.
    pub hopping_slide: Duration,
    /// Tumbling window size. Default: 5 minutes.
    pub tumbling_size: Duration,
    /// Bounded out-of-order tolerance subtracted from the max observed
    /// event time. Default: 5 seconds.
    pub allowed_lateness: Duration,
    /// Cap on distinct keys within a single window. Default: 1,000,000.
    pub max_groups_per_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hopping_size: Duration::from_secs(600),
            hopping_slide: Duration::from_secs(300),
            tumbling_size: Duration::from_secs(300),
            allowed_lateness: Duration::from_secs(5),
            max_groups_per_window: DEFAULT_MAX_GROUPS_PER_WINDOW,
        }
    }
}
