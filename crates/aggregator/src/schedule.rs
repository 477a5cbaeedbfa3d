use crate::{monitor::Monitor, tier::Tier};
use monitor_config::ScheduleConfig;
use monitor_core::{MetricSource, MonitorError, Result};
use std::fmt;
use std::num::NonZeroU32;
use tracing::debug;

/// Timer slack, matching the sampler's slot tolerance.
const TIMER_EPSILON: f64 = 1e-6;

/// Update function run for one tier. Receives the frame's delta time.
pub type Job<S> = fn(&mut Monitor<S>, f64);

/// When a registered job runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Period {
    /// On every call to [`Scheduler::progress`].
    EveryFrame,
    /// Once per this many seconds of accumulated frame time.
    Interval(f64),
    /// Once per `rate` runs of the job registered for `tick_source`.
    Rate { tick_source: Tier, rate: NonZeroU32 },
}

enum Timer {
    Frame,
    Interval { period: f64, elapsed: f64 },
    Rate { source: usize, rate: u32, ticks: u32 },
}

struct Entry<S> {
    tier:  Tier,
    timer: Timer,
    job:   Job<S>,
    /// Whether the job ran during the current frame.
    fired: bool,
}

/// Runs each tier's update job at its own cadence from a stream of frame
/// deltas. Jobs run in registration order, so a job always sees the
/// results of jobs registered before it in the same frame.
pub struct Scheduler<S> {
    entries: Vec<Entry<S>>,
}

impl<S> Default for Scheduler<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S> fmt::Debug for Scheduler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.tier))
            .finish()
    }
}

impl<S: MetricSource> Scheduler<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard pipeline: sample every frame, reduce into minutes every
    /// `minute_period_secs`, and drive hours, days and weeks off the minute
    /// job's ticks.
    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        let mut scheduler = Self::new();
        scheduler.register(Tier::Seconds, Period::EveryFrame, |m, dt| {
            m.sample(dt);
        })?;
        scheduler.register(
            Tier::Minutes,
            Period::Interval(config.minute_period_secs),
            |m, _| {
                m.reduce_minutes();
            },
        )?;
        scheduler.register(
            Tier::Hours,
            Period::Rate { tick_source: Tier::Minutes, rate: config.hour_rate },
            |m, _| {
                m.reduce_hours();
            },
        )?;
        scheduler.register(
            Tier::Days,
            Period::Rate { tick_source: Tier::Minutes, rate: config.day_rate },
            |m, _| {
                m.aggregate_days();
            },
        )?;
        scheduler.register(
            Tier::Weeks,
            Period::Rate { tick_source: Tier::Minutes, rate: config.week_rate },
            |m, _| {
                m.aggregate_weeks();
            },
        )?;
        Ok(scheduler)
    }

    /// Register `job` as the writer of `tier`.
    ///
    /// A rate-driven job's tick source must already be registered, and each
    /// tier may have only one writer.
    pub fn register(&mut self, tier: Tier, period: Period, job: Job<S>) -> Result<()> {
        if self.position(tier).is_some() {
            return Err(MonitorError::Schedule(format!(
                "tier '{tier}' already has a job"
            )));
        }

        let timer = match period {
            Period::EveryFrame => Timer::Frame,
            Period::Interval(period) => {
                if !period.is_finite() || period <= 0.0 {
                    return Err(MonitorError::Schedule(format!(
                        "interval for '{tier}' must be a positive number of seconds, got {period}"
                    )));
                }
                Timer::Interval { period, elapsed: 0.0 }
            }
            Period::Rate { tick_source, rate } => {
                let source = self.position(tick_source).ok_or_else(|| {
                    MonitorError::Schedule(format!(
                        "tick source '{tick_source}' for '{tier}' is not registered"
                    ))
                })?;
                Timer::Rate { source, rate: rate.get(), ticks: 0 }
            }
        };

        debug!(%tier, ?period, "registered tier job");
        self.entries.push(Entry { tier, timer, job, fired: false });
        Ok(())
    }

    /// Advance every timer by `delta_time` and run the jobs that are due.
    pub fn progress(&mut self, monitor: &mut Monitor<S>, delta_time: f64) {
        for i in 0..self.entries.len() {
            let source_fired = match self.entries[i].timer {
                Timer::Rate { source, .. } => self.entries[source].fired,
                _ => false,
            };

            let entry = &mut self.entries[i];
            entry.fired = match &mut entry.timer {
                Timer::Frame => true,
                Timer::Interval { period, elapsed } => {
                    *elapsed += delta_time;
                    if *elapsed + TIMER_EPSILON >= *period {
                        *elapsed -= *period;
                        // A stall longer than one period fires once, not repeatedly.
                        if *elapsed >= *period {
                            *elapsed = 0.0;
                        }
                        true
                    } else {
                        false
                    }
                }
                Timer::Rate { rate, ticks, .. } => {
                    if source_fired {
                        *ticks += 1;
                        if *ticks >= *rate {
                            *ticks = 0;
                            true
                        } else {
                            false
                        }
                    } else {
                        false
                    }
                }
            };

            if entry.fired {
                (entry.job)(monitor, delta_time);
            }
        }
    }

    /// Tiers with a registered job, in run order.
    pub fn tiers(&self) -> impl Iterator<Item = Tier> + '_ {
        self.entries.iter().map(|e| e.tier)
    }

    fn position(&self, tier: Tier) -> Option<usize> {
        self.entries.iter().position(|e| e.tier == tier)
    }
}
