use crate::error::CollectorError;
use crate::model::Snapshot;

pub mod system;

pub use system::SystemCollector;

/// Capability that produces one complete [`Snapshot`] on demand.
///
/// Implementations own all OS-specific logic and any internal counters
/// needed for rate computation (CPU usage and network throughput both need
/// a delta between consecutive reads). Before a baseline exists the first
/// capture must report those rates as 0.0, not fail.
///
/// `capture` is synchronous and may take tens of milliseconds; it must be
/// safe to call repeatedly. A returned error is treated as transient by
/// the sampler: the iteration is skipped and sampling continues.
pub trait Collector: Send {
    fn capture(&mut self) -> Result<Snapshot, CollectorError>;
}
