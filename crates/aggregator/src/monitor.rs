use crate::{
    stages::{self, SampleOutcome},
    tier::{Tier, TierRecord, TierView},
};
use monitor_config::ScheduleConfig;
use monitor_core::MetricSource;
use monitor_stats::TierBuffer;
use std::num::NonZeroU32;

/// The five retention tiers of one monitored process, plus the source that
/// feeds them.
///
/// Each update method is one pipeline stage and writes only its own tier.
/// The owner decides when to call them, usually through a
/// [`Scheduler`](crate::Scheduler).
pub struct Monitor<S> {
    source: S,
    day_interval: NonZeroU32,
    week_interval: NonZeroU32,
    seconds: TierRecord,
    minutes: TierRecord,
    hours: TierRecord,
    days: TierRecord,
    weeks: TierRecord,
}

impl<S: MetricSource> Monitor<S> {
    /// Monitor with the standard 24-step day and 168-step week cycles.
    pub fn new(source: S) -> Self {
        Self::from_config(source, &ScheduleConfig::default())
    }

    pub fn from_config(source: S, config: &ScheduleConfig) -> Self {
        Self {
            source,
            day_interval: config.day_interval,
            week_interval: config.week_interval,
            seconds: TierRecord::new(),
            minutes: TierRecord::new(),
            hours: TierRecord::new(),
            days: TierRecord::new(),
            weeks: TierRecord::new(),
        }
    }

    /// Every frame: record the source into the seconds tier.
    pub fn sample(&mut self, delta_time: f64) -> SampleOutcome {
        let snapshot = self.source.snapshot();
        stages::sample(&mut self.seconds, delta_time, &snapshot)
    }

    /// Every second: seconds → minutes.
    pub fn reduce_minutes(&mut self) -> bool {
        stages::reduce(&mut self.minutes, &self.seconds)
    }

    /// Every minute: minutes → hours.
    pub fn reduce_hours(&mut self) -> bool {
        stages::reduce(&mut self.hours, &self.minutes)
    }

    /// Every minute: minutes → days, `day_interval` folds per sample.
    pub fn aggregate_days(&mut self) -> bool {
        stages::aggregate(&mut self.days, &self.minutes, self.day_interval)
    }

    /// Every minute: hours → weeks, `week_interval` folds per sample.
    pub fn aggregate_weeks(&mut self) -> bool {
        stages::aggregate(&mut self.weeks, &self.hours, self.week_interval)
    }
}

impl<S> Monitor<S> {
    #[must_use]
    pub fn tier(&self, tier: Tier) -> &TierRecord {
        match tier {
            Tier::Seconds => &self.seconds,
            Tier::Minutes => &self.minutes,
            Tier::Hours   => &self.hours,
            Tier::Days    => &self.days,
            Tier::Weeks   => &self.weeks,
        }
    }

    /// Copy of one tier's window.
    #[must_use]
    pub fn view(&self, tier: Tier) -> TierView {
        let buffer = &self.tier(tier).buffer;
        TierView {
            tier,
            written: buffer.written(),
            samples: buffer.view(),
        }
    }

    /// Copies of every tier, finest first.
    #[must_use]
    pub fn views(&self) -> Vec<TierView> {
        Tier::ALL.iter().map(|&t| self.view(t)).collect()
    }
}
