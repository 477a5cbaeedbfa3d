use monitor_core::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// Root configuration structure parsed from `monitor.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Frame loop and system polling.
    pub sampler: SamplerConfig,
    /// Cadence and cycle lengths of the reduction stages.
    pub schedule: ScheduleConfig,
    /// Periodic summaries written to the log.
    pub report: ReportConfig,
}

/// Fastest frame loop the driver supports; its period stays a whole number
/// of microseconds.
pub const MAX_FRAME_RATE: f64 = 1000.0;

impl MonitorConfig {
    /// Reject values serde cannot rule out on its own.
    pub fn validate(&self) -> Result<()> {
        positive("sampler.frame_rate", self.sampler.frame_rate)?;
        if self.sampler.frame_rate > MAX_FRAME_RATE {
            return Err(MonitorError::Config(format!(
                "sampler.frame_rate must be at most {MAX_FRAME_RATE}, got {}",
                self.sampler.frame_rate
            )));
        }
        positive("schedule.minute_period_secs", self.schedule.minute_period_secs)?;
        positive("report.period_secs", self.report.period_secs)?;
        if self.sampler.poll_ms == 0 {
            return Err(MonitorError::Config("sampler.poll_ms must be at least 1".into()));
        }
        Ok(())
    }
}

fn positive(key: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MonitorError::Config(format!(
            "{key} must be a positive number, got {value}"
        )))
    }
}

/// Frame loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Frames per second the driver loop aims for.
    pub frame_rate: f64,
    /// How often the system source refreshes its reading (milliseconds).
    pub poll_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            poll_ms:    500,
        }
    }
}

const fn non_zero(n: u32) -> NonZeroU32 {
    match NonZeroU32::new(n) {
        Some(n) => n,
        None => panic!("cadence constants must be non-zero"),
    }
}

/// Ticks of the one-second minute job per coarse update.
const MINUTE_TICKS: NonZeroU32 = non_zero(60);
/// 24 one-minute folds per day sample: 60 samples span one day.
const DAY_INTERVAL: NonZeroU32 = non_zero(24);
/// 168 one-minute folds per week sample: 60 samples span one week.
const WEEK_INTERVAL: NonZeroU32 = non_zero(168);

/// Stage cadence.  Zero rates and intervals fail to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds between seconds → minutes reductions.
    pub minute_period_secs: f64,
    /// Minute ticks between minutes → hours reductions.
    pub hour_rate: NonZeroU32,
    /// Minute ticks between minutes → days aggregations.
    pub day_rate: NonZeroU32,
    /// Minute ticks between hours → weeks aggregations.
    pub week_rate: NonZeroU32,
    /// Aggregations folded into one day sample.
    pub day_interval: NonZeroU32,
    /// Aggregations folded into one week sample.
    pub week_interval: NonZeroU32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            minute_period_secs: 1.0,
            hour_rate:          MINUTE_TICKS,
            day_rate:           MINUTE_TICKS,
            week_rate:          MINUTE_TICKS,
            day_interval:       DAY_INTERVAL,
            week_interval:      WEEK_INTERVAL,
        }
    }
}

/// Log reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Write a summary of every tier to the log.
    pub enabled: bool,
    /// Seconds between summaries.
    pub period_secs: f64,
    /// Print all tier windows as JSON on Ctrl-C.
    pub dump_on_exit: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled:      true,
            period_secs:  60.0,
            dump_on_exit: false,
        }
    }
}
