use chrono::{DateTime, Local};
use monitor_aggregator::TierView;
use monitor_core::MetricId;
use monitor_stats::WINDOW;
use monitor_system::units::format_metric;
use serde::Serialize;
use std::fmt::Write as _;
use tokio::sync::mpsc;
use tracing::info;

/// Copies of every tier taken at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub at:    DateTime<Local>,
    pub tiers: Vec<TierView>,
}

impl Report {
    pub fn new(tiers: Vec<TierView>) -> Self {
        Self {
            at: Local::now(),
            tiers,
        }
    }
}

/// One log line describing a tier's newest sample.
pub fn summarize(view: &TierView) -> String {
    let mut line = format!(
        "{}: {}/{WINDOW} samples ({} total)",
        view.tier,
        view.samples.len(),
        view.written
    );

    let Some(newest) = view.newest() else {
        line.push_str(", no data yet");
        return line;
    };

    for id in MetricId::ALL {
        if let Some(slot) = newest.get(id) {
            let _ = write!(
                line,
                "; {} {} [{} – {}]",
                id.name(),
                format_metric(id, slot.avg),
                format_metric(id, slot.min),
                format_metric(id, slot.max),
            );
        }
    }
    line
}

/// Log every report received until the sender is dropped.
pub async fn log_reports(mut rx: mpsc::Receiver<Report>) {
    while let Some(report) = rx.recv().await {
        info!("report at {}", report.at.format("%Y-%m-%d %H:%M:%S"));
        for view in &report.tiers {
            info!("{}", summarize(view));
        }
    }
}
