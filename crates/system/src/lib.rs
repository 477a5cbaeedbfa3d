pub mod cpu;
pub mod units;

use monitor_core::{MetricId, MetricSource, WorldSnapshot};
use std::time::Duration;
use sysinfo::{Networks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tokio::sync::watch;
use tokio::time;
use tracing::debug;

/// [`MetricSource`] backed by `sysinfo`.
///
/// Refreshing system information is far too slow to do on every frame, so a
/// background Tokio task polls every `poll_ms` milliseconds and publishes the
/// result; [`snapshot`](MetricSource::snapshot) just reads the latest value.
#[derive(Debug, Clone)]
pub struct SysinfoSource {
    latest: watch::Receiver<WorldSnapshot>,
}

impl SysinfoSource {
    /// Take a first reading, then spawn the polling task. Must be called from
    /// within a Tokio runtime.
    ///
    /// Resolves once a real reading is available, so the very first
    /// [`snapshot`](MetricSource::snapshot) already reflects the system. CPU
    /// usage needs two refreshes, which costs one
    /// [`MINIMUM_CPU_UPDATE_INTERVAL`] up front.
    ///
    /// The task stops automatically once every `SysinfoSource` clone is dropped.
    pub async fn spawn(poll_ms: u64) -> Self {
        let interval = Duration::from_millis(poll_ms.max(1));

        let mut sys      = System::new_all();
        let mut networks = Networks::new_with_refreshed_list();
        time::sleep(MINIMUM_CPU_UPDATE_INTERVAL).await;
        sys.refresh_cpu_usage();
        networks.refresh(false);

        let (tx, rx) = watch::channel(take_snapshot(&sys, &networks));
        debug!("system source primed");

        tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + interval, interval);

            loop {
                ticker.tick().await;
                sys.refresh_all();
                networks.refresh(false); // false = keep existing interfaces list

                if tx.send(take_snapshot(&sys, &networks)).is_err() {
                    debug!("system source dropped; stopping poller");
                    break;
                }
            }
        });

        Self { latest: rx }
    }
}

impl MetricSource for SysinfoSource {
    fn snapshot(&mut self) -> WorldSnapshot {
        *self.latest.borrow()
    }
}

fn take_snapshot(sys: &System, networks: &Networks) -> WorldSnapshot {
    let per_core: Vec<f32> = sys.cpus().iter().map(|c| c.cpu_usage()).collect();

    // Cumulative totals; the stats windows turn them into per-slot deltas.
    let received: u64    = networks.iter().map(|(_, d)| d.total_received()).sum();
    let transmitted: u64 = networks.iter().map(|(_, d)| d.total_transmitted()).sum();

    WorldSnapshot::default()
        .with(MetricId::CpuUsage, f64::from(cpu::average_usage(&per_core)))
        .with(MetricId::MemoryUsed, sys.used_memory() as f64)
        .with(MetricId::SwapUsed, sys.used_swap() as f64)
        .with(MetricId::ProcessCount, sys.processes().len() as f64)
        .with(MetricId::LoadAverage, System::load_average().one)
        .with(MetricId::NetReceived, received as f64)
        .with(MetricId::NetTransmitted, transmitted as f64)
}
