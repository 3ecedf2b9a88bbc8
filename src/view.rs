use std::io::{self, Write};
use std::time::Duration;

use chrono::Local;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, SetAttribute},
    terminal::{Clear, ClearType},
};

use crate::model::Snapshot;

/// Render one snapshot as a full-screen console view: clear, home the
/// cursor, then one section per subsystem.
pub fn render(out: &mut impl Write, snap: &Snapshot) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;

    queue!(out, SetAttribute(Attribute::Bold))?;
    writeln!(out, "=== Host Resource Monitor ===")?;
    queue!(out, SetAttribute(Attribute::Reset))?;
    writeln!(
        out,
        "{}  |  up {}  |  load {:.2}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        format_uptime(snap.uptime),
        snap.load_avg
    )?;
    writeln!(out)?;

    writeln!(out, "CPU")?;
    writeln!(
        out,
        "  {}  ({} cores / {} threads)",
        snap.cpu.name, snap.cpu.cores, snap.cpu.threads
    )?;
    writeln!(
        out,
        "  usage {:5.1}%  {}",
        snap.cpu.usage_percent,
        progress_bar(snap.cpu.usage_percent, 20)
    )?;
    writeln!(out)?;

    let m = &snap.memory;
    writeln!(out, "Memory")?;
    writeln!(
        out,
        "  {} used / {} total ({} available)",
        format_bytes(m.used_bytes),
        format_bytes(m.total_bytes),
        format_bytes(m.available_bytes)
    )?;
    writeln!(
        out,
        "  usage {:5.1}%  {}",
        m.usage_percent,
        progress_bar(m.usage_percent, 20)
    )?;
    writeln!(out)?;

    if !snap.disks.is_empty() {
        writeln!(out, "Disks")?;
        for disk in &snap.disks {
            writeln!(
                out,
                "  {:<20} {:>10} / {:>10}  {:5.1}%  {}",
                disk.name,
                format_bytes(disk.used_bytes),
                format_bytes(disk.total_bytes),
                disk.usage_percent,
                progress_bar(disk.usage_percent, 10)
            )?;
        }
        writeln!(out)?;
    }

    if !snap.networks.is_empty() {
        writeln!(out, "Network")?;
        for net in &snap.networks {
            writeln!(
                out,
                "  {:<12} rx {:>10}  tx {:>10}  {:8.2} Mbps",
                net.interface,
                format_bytes(net.bytes_received),
                format_bytes(net.bytes_sent),
                net.bandwidth_mbps
            )?;
        }
    }

    out.flush()
}

// ── formatting helpers ───────────────────────────────────────────────────

/// Human-readable byte count: "3.21 GB", "45.0 MB", "512 B".
pub fn format_bytes(bytes: u64) -> String {
    const GB: f64 = 1_073_741_824.0;
    const MB: f64 = 1_048_576.0;
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= GB {
        format!("{:.2} GB", b / GB)
    } else if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Uptime as "Nd Nh Nm".
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    format!("{}d {}h {}m", days, hours, minutes)
}

pub fn progress_bar(percent: f64, width: usize) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}
