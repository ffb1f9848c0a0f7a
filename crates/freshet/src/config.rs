//! Configuration for a `Freshet` job.

use freshet_core::EngineConfig;

/// Configuration for a [`crate::FeatureJob`] instance.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Engine configuration: window shapes, lateness, cardinality cap.
    pub engine: EngineConfig,
    /// Capacity of the sink task's command channel. Default: 128.
    pub sink_buffer: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            sink_buffer: 128,
        }
    }
}
