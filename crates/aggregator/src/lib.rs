//! Multi-resolution aggregation of world statistics.
//!
//! A [`Monitor`] owns five retention tiers (seconds, minutes, hours, days,
//! weeks), each a 60-sample window. Data only flows from finer to coarser
//! tiers:
//!
//! - every frame the sampler records the [`MetricSource`](monitor_core::MetricSource)
//!   into the seconds tier at 60 samples per second;
//! - every second the seconds window is reduced into one minutes sample;
//! - every minute the minutes window is reduced into one hours sample, and
//!   aggregated into the days tier over 24-step cycles;
//! - every minute the hours window is aggregated into the weeks tier over
//!   168-step cycles.
//!
//! A [`Scheduler`] turns frame deltas into those cadences.

pub mod monitor;
pub mod schedule;
pub mod stages;
pub mod tier;

pub use monitor::Monitor;
pub use schedule::{Job, Period, Scheduler};
pub use stages::{SampleOutcome, SAMPLES_PER_SECOND};
pub use tier::{Tier, TierRecord, TierView};
