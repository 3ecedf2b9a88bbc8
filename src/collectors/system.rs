use std::time::{Duration, Instant};

use sysinfo::{Disks, Networks, System};

use super::Collector;
use crate::error::CollectorError;
use crate::model::{CpuStats, DiskStats, MemoryStats, NetworkStats, Snapshot};

/// Reference collector backed by the `sysinfo` crate, which owns the
/// platform-specific counter reads. The sampler never branches on the
/// target operating system; this type is usable on every platform
/// `sysinfo` supports.
pub struct SystemCollector {
    sys: System,
    disks: Disks,
    networks: Networks,
    /// Previous per-interface (rx, tx) totals and when they were read,
    /// for throughput computation across captures.
    prev_net: Option<(Instant, Vec<(String, u64, u64)>)>,
}

impl SystemCollector {
    pub fn new() -> Self {
        Self {
            sys: System::new_all(),
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            prev_net: None,
        }
    }

    // ── per-subsystem readers ────────────────────────────────────────────

    fn cpu_stats(&self) -> CpuStats {
        let threads = self.sys.cpus().len();
        let name = self
            .sys
            .cpus()
            .first()
            .map(|c| c.brand().trim().to_string())
            .unwrap_or_default();
        CpuStats {
            name,
            cores: System::physical_core_count().unwrap_or(threads),
            threads,
            // sysinfo reports 0 before its own baseline exists, which is
            // exactly the documented first-sample behavior.
            usage_percent: f64::from(self.sys.global_cpu_usage()).clamp(0.0, 100.0),
        }
    }

    fn memory_stats(&self) -> MemoryStats {
        let total = self.sys.total_memory();
        let used = self.sys.used_memory();
        let available_raw = self.sys.available_memory();
        // On macOS, available_memory() can return 0; fall back to total - used
        let available = if available_raw > 0 {
            available_raw
        } else {
            total.saturating_sub(used)
        };
        let usage_percent = if total > 0 {
            used as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        MemoryStats {
            total_bytes: total,
            used_bytes: used,
            available_bytes: available,
            usage_percent,
        }
    }

    fn disk_stats(&self) -> Vec<DiskStats> {
        let mut stats = Vec::new();
        for disk in self.disks.list() {
            let total = disk.total_space();
            if total == 0 {
                continue;
            }
            let free = disk.available_space();
            let used = total.saturating_sub(free);
            stats.push(DiskStats {
                name: disk.mount_point().to_string_lossy().into_owned(),
                total_bytes: total,
                used_bytes: used,
                free_bytes: free,
                usage_percent: used as f64 / total as f64 * 100.0,
            });
        }
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    fn network_stats(&mut self, now: Instant) -> Vec<NetworkStats> {
        let mut current: Vec<(String, u64, u64)> = self
            .networks
            .list()
            .iter()
            .map(|(name, data)| (name.clone(), data.total_received(), data.total_transmitted()))
            .collect();
        current.sort_by(|a, b| a.0.cmp(&b.0));

        let mut stats = Vec::with_capacity(current.len());
        for (name, rx, tx) in &current {
            let mut bandwidth_mbps = 0.0;
            if let Some((prev_time, ref prev)) = self.prev_net {
                let elapsed = now.duration_since(prev_time).as_secs_f64();
                if elapsed > 0.1 {
                    if let Some((_, prev_rx, prev_tx)) = prev.iter().find(|(n, _, _)| n == name) {
                        let delta = rx.saturating_sub(*prev_rx) + tx.saturating_sub(*prev_tx);
                        bandwidth_mbps = delta as f64 * 8.0 / elapsed / 1_000_000.0;
                    }
                }
            }
            stats.push(NetworkStats {
                interface: name.clone(),
                bytes_sent: *tx,
                bytes_received: *rx,
                bandwidth_mbps,
            });
        }
        self.prev_net = Some((now, current));
        stats
    }
}

impl Default for SystemCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for SystemCollector {
    fn capture(&mut self) -> Result<Snapshot, CollectorError> {
        self.sys.refresh_cpu_all();
        self.sys.refresh_memory();
        self.disks.refresh(true);
        self.networks.refresh(true);

        let now = Instant::now();
        Ok(Snapshot {
            cpu: self.cpu_stats(),
            memory: self.memory_stats(),
            disks: self.disk_stats(),
            networks: self.network_stats(now),
            load_avg: System::load_average().one,
            uptime: Duration::from_secs(System::uptime()),
        })
    }
}
