use monitor_core::MetricId;

/// Format a byte count as a human-readable string (e.g. `"7.3 GiB"`).
pub fn format_bytes(bytes: f64) -> String {
    const GIB: f64 = (1u64 << 30) as f64;
    const MIB: f64 = (1u64 << 20) as f64;
    const KIB: f64 = (1u64 << 10) as f64;

    if bytes >= GIB {
        format!("{:.1} GiB", bytes / GIB)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes / KIB)
    } else {
        format!("{bytes:.0} B")
    }
}

/// Render a value of `metric` in its natural unit.
///
/// Network metrics are per-slot deltas once they reach a window, so they are
/// shown as byte amounts rather than totals.
pub fn format_metric(metric: MetricId, value: f64) -> String {
    match metric {
        MetricId::CpuUsage => format!("{value:.1}%"),
        MetricId::MemoryUsed
        | MetricId::SwapUsed
        | MetricId::NetReceived
        | MetricId::NetTransmitted => format_bytes(value),
        MetricId::ProcessCount => format!("{value:.0}"),
        MetricId::LoadAverage => format!("{value:.2}"),
    }
}
