use thiserror::Error;

/// A transient failure while capturing one round of metrics.
///
/// Collector faults are recovered inside the sampling loop: the iteration
/// is skipped, the previous snapshot stays in place, and sampling resumes
/// on the next tick. Nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("failed to read system counters: {0}")]
    Io(#[from] std::io::Error),

    /// Platform returned data the collector could not interpret.
    #[error("unusable metric source: {0}")]
    Unavailable(String),
}

/// An invalid sampler configuration, rejected at the call site.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// `set_interval(0)` — a zero period would spin the sampling loop.
    /// The previous interval stays in effect.
    #[error("update interval must be greater than zero")]
    ZeroInterval,
}
