use std::time::Duration;

use serde::Serialize;

// --- Per-subsystem stats ---

/// Processor identity and utilisation.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CpuStats {
    /// Marketing name of the processor, e.g. "AMD Ryzen 7 5800X".
    pub name: String,
    /// Physical core count.
    pub cores: usize,
    /// Logical processor count.
    pub threads: usize,
    /// Aggregate utilisation across all logical processors, 0.0–100.0.
    /// 0.0 on the first sample, before a usage baseline exists.
    pub usage_percent: f64,
}

/// Physical memory occupancy. `used_bytes + available_bytes` tracks
/// `total_bytes` up to kernel rounding.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MemoryStats {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub usage_percent: f64,
}

/// Capacity of one mounted filesystem.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DiskStats {
    /// Mount point, e.g. "/" or "/home".
    pub name: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub usage_percent: f64,
}

/// Cumulative traffic counters for one network interface, plus the
/// throughput observed since the previous sample.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NetworkStats {
    pub interface: String,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    /// Combined rx+tx throughput in megabits per second. 0.0 on the
    /// first sample, before a traffic baseline exists.
    pub bandwidth_mbps: f64,
}

// --- Aggregated snapshot ---

/// One complete, immutable capture of host state at a point in time.
///
/// Produced by a [`Collector`](crate::collectors::Collector); once returned
/// it is never mutated. `Snapshot::default()` is the documented
/// "no sample taken yet" value returned by
/// [`Sampler::current_snapshot`](crate::sampler::Sampler::current_snapshot)
/// before the first capture completes.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Snapshot {
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub disks: Vec<DiskStats>,
    pub networks: Vec<NetworkStats>,
    /// 1-minute load average.
    pub load_avg: f64,
    /// Time since boot.
    #[serde(with = "uptime_secs")]
    pub uptime: Duration,
}

/// Serialize uptime as whole seconds rather than serde's default
/// `{secs, nanos}` struct, so JSON output stays flat.
mod uptime_secs {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
}
