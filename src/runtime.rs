use crate::report::{self, Report};
use anyhow::Result;
use monitor_aggregator::{Monitor, Scheduler};
use monitor_config::MonitorConfig;
use monitor_system::SysinfoSource;
use std::time::Duration;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Drive the monitor until Ctrl-C.
///
/// One task owns the [`Monitor`] and its [`Scheduler`], so every tier has a
/// single writer. Readers only ever see copied [`Report`]s.
pub async fn run(config: MonitorConfig) -> Result<()> {
    let source        = SysinfoSource::spawn(config.sampler.poll_ms).await;
    let mut monitor   = Monitor::from_config(source, &config.schedule);
    let mut scheduler = Scheduler::from_config(&config.schedule)?;

    let reports = config.report.enabled.then(|| {
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(report::log_reports(rx));
        tx
    });

    // Late frames are skipped rather than bunched up; the sampler backfills
    // the slots they would have covered.
    let mut ticker = time::interval(Duration::from_secs_f64(1.0 / config.sampler.frame_rate));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        frame_rate = config.sampler.frame_rate,
        tiers = ?scheduler,
        "monitor running"
    );

    let mut last = Instant::now();
    let mut since_report = 0.0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                let delta = now.duration_since(last).as_secs_f64();
                last = now;

                scheduler.progress(&mut monitor, delta);

                since_report += delta;
                if since_report >= config.report.period_secs {
                    since_report = 0.0;
                    if let Some(tx) = &reports {
                        if tx.try_send(Report::new(monitor.views())).is_err() {
                            debug!("report channel full; dropping report");
                        }
                    }
                }
            }
            result = &mut shutdown => {
                result?;
                info!("shutting down");
                break;
            }
        }
    }

    if config.report.dump_on_exit {
        println!("{}", serde_json::to_string_pretty(&Report::new(monitor.views()))?);
    }
    Ok(())
}
