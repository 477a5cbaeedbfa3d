use serde::{Deserialize, Serialize};

/// Every metric tracked by the monitor, in storage order.
///
/// The discriminant doubles as the index into [`WorldSnapshot`] and into the
/// per-metric windows of a tier buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricId {
    /// Average CPU usage across all cores (0.0 – 100.0).
    CpuUsage,
    /// RAM used in bytes.
    MemoryUsed,
    /// Swap used in bytes.
    SwapUsed,
    /// Number of live processes.
    ProcessCount,
    /// One-minute load average.
    LoadAverage,
    /// Total bytes received on all interfaces since start.
    NetReceived,
    /// Total bytes transmitted on all interfaces since start.
    NetTransmitted,
}

/// How a metric's readings combine over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Instantaneous level; each reading stands on its own.
    Gauge,
    /// Monotonic total; windows track the change between readings.
    Counter,
}

impl MetricId {
    pub const COUNT: usize = 7;

    pub const ALL: [MetricId; Self::COUNT] = [
        MetricId::CpuUsage,
        MetricId::MemoryUsed,
        MetricId::SwapUsed,
        MetricId::ProcessCount,
        MetricId::LoadAverage,
        MetricId::NetReceived,
        MetricId::NetTransmitted,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn kind(self) -> MetricKind {
        match self {
            MetricId::NetReceived | MetricId::NetTransmitted => MetricKind::Counter,
            _ => MetricKind::Gauge,
        }
    }

    /// Stable snake_case name, matching the serialized form.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            MetricId::CpuUsage       => "cpu_usage",
            MetricId::MemoryUsed     => "memory_used",
            MetricId::SwapUsed       => "swap_used",
            MetricId::ProcessCount   => "process_count",
            MetricId::LoadAverage    => "load_average",
            MetricId::NetReceived    => "net_received",
            MetricId::NetTransmitted => "net_transmitted",
        }
    }
}

/// A point-in-time reading of every tracked metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    values: [f64; MetricId::COUNT],
}

impl WorldSnapshot {
    /// Snapshot with every metric set to `value`; handy for synthetic sources.
    #[must_use]
    pub fn splat(value: f64) -> Self {
        Self {
            values: [value; MetricId::COUNT],
        }
    }

    #[must_use]
    pub fn get(&self, id: MetricId) -> f64 {
        self.values[id.index()]
    }

    pub fn set(&mut self, id: MetricId, value: f64) {
        self.values[id.index()] = value;
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, id: MetricId, value: f64) -> Self {
        self.set(id, value);
        self
    }

    /// Iterate `(metric, reading)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (MetricId, f64)> + '_ {
        MetricId::ALL.iter().map(move |&id| (id, self.get(id)))
    }
}
