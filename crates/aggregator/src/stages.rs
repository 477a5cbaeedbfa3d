//! The three update primitives every tier is driven by.
//!
//! Each stage writes only to its destination [`TierRecord`] and reads its
//! source through [`TierBuffer`] operations. Callers must serialize all
//! writes to a tier relative to stages reading it.

use crate::tier::TierRecord;
use monitor_stats::{TierBuffer, WINDOW};
use std::num::NonZeroU32;
use tracing::{debug, trace, warn};

/// Seconds-tier resolution.
pub const SAMPLES_PER_SECOND: f64 = 60.0;

/// Slack added before flooring so accumulated `1/60` deltas land on their
/// boundary instead of just below it.
const SLOT_EPSILON: f64 = 1e-6;

fn slot_index(elapsed: f64) -> i64 {
    (elapsed * SAMPLES_PER_SECOND + SLOT_EPSILON).floor() as i64
}

/// What a [`sample`] call did to the seconds tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Still inside the current slot; folded into it as reading `count + 1`.
    Merged { count: u32 },
    /// Crossed exactly one slot boundary.
    Advanced,
    /// Crossed several boundaries; the skipped slots continue the previous sample.
    Backfilled { repeated: u64 },
    /// Reading fell before the first slot boundary.
    Discarded,
    /// `delta_time` was negative or not finite.
    Ignored,
}

/// Advance the seconds tier by `delta_time` and record `snapshot`.
///
/// Keeps exactly one sample per 1/60 s of accumulated time: readings that
/// share a slot are merged, and slots skipped by a stalled caller continue
/// the last sample recorded before the stall. Backfill stops after one full
/// window; older filler would be evicted anyway, so it is only counted.
pub fn sample<B: TierBuffer>(
    tier: &mut TierRecord<B>,
    delta_time: f64,
    snapshot: &B::Snapshot,
) -> SampleOutcome {
    if !delta_time.is_finite() || delta_time < 0.0 {
        warn!(delta_time, "ignoring invalid frame delta");
        return SampleOutcome::Ignored;
    }

    let elapsed = tier.elapsed;
    tier.elapsed += delta_time;

    let t_last = slot_index(elapsed);
    let t_next = slot_index(tier.elapsed);
    let dif = t_last - t_next;

    if dif == 0 {
        if tier.buffer.is_empty() {
            return SampleOutcome::Discarded;
        }
        let last = tier.buffer.copy_last();
        tier.buffer.get(snapshot);
        tier.reduce_count += 1;
        tier.buffer.reduce_last(&last, tier.reduce_count);
        return SampleOutcome::Merged {
            count: tier.reduce_count,
        };
    }

    tier.reduce_count = 0;

    let skipped = dif.unsigned_abs() - 1;
    let repeated = skipped.min(WINDOW as u64);
    if skipped > repeated {
        tier.buffer.skip(skipped - repeated);
    }
    for _ in 0..repeated {
        tier.buffer.repeat_last();
    }
    tier.buffer.get(snapshot);

    if skipped == 0 {
        SampleOutcome::Advanced
    } else {
        debug!(skipped, "sampler stalled; backfilled with last sample");
        SampleOutcome::Backfilled { repeated }
    }
}

/// Fold everything `src` recorded into one new `dst` sample.
///
/// Returns `false` without touching `dst` when `src` has not advanced since
/// the previous reduction, so repeated calls never duplicate data.
pub fn reduce<B: TierBuffer>(dst: &mut TierRecord<B>, src: &TierRecord<B>) -> bool {
    let written = src.buffer.written();
    if written == dst.consumed {
        trace!("source unchanged since last reduction");
        return false;
    }
    dst.buffer.reduce(&src.buffer);
    dst.consumed = written;
    true
}

/// Fold `src` into the sample `dst` is currently building.
///
/// A destination sample is built over `interval` calls: the first call
/// starts it, every later call folds the new reduction into it weighted by
/// the calls already counted, and after `interval` calls the next one
/// starts a fresh sample.
pub fn aggregate<B: TierBuffer>(
    dst: &mut TierRecord<B>,
    src: &TierRecord<B>,
    interval: NonZeroU32,
) -> bool {
    if src.buffer.is_empty() {
        trace!("nothing to aggregate yet");
        return false;
    }

    let last = (dst.reduce_count != 0).then(|| dst.buffer.copy_last());

    dst.buffer.reduce(&src.buffer);

    if let Some(last) = &last {
        dst.buffer.reduce_last(last, dst.reduce_count);
    }

    dst.reduce_count += 1;
    if dst.reduce_count >= interval.get() {
        dst.reduce_count = 0;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::{MetricId, WorldSnapshot};
    use monitor_stats::WorldStats;

    const FRAME: f64 = 1.0 / 60.0;

    fn cpu(value: f64) -> WorldSnapshot {
        WorldSnapshot::default().with(MetricId::CpuUsage, value)
    }

    fn cpu_avgs(tier: &TierRecord) -> Vec<f64> {
        tier.buffer
            .samples()
            .map(|s| s.get(MetricId::CpuUsage).avg)
            .collect()
    }

    fn newest_cpu(tier: &TierRecord) -> monitor_stats::Slot {
        tier.buffer.copy_last().get(MetricId::CpuUsage)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    /// Buffer that only records which operations were called.
    #[derive(Debug, Default)]
    struct Recording {
        calls:   Vec<&'static str>,
        len:     usize,
        written: u64,
    }

    impl TierBuffer for Recording {
        type Snapshot = ();
        type Sample = ();

        fn get(&mut self, _: &()) {
            self.calls.push("get");
            self.len += 1;
            self.written += 1;
        }
        fn copy_last(&self) {}
        fn reduce(&mut self, _: &Self) {
            self.calls.push("reduce");
        }
        fn reduce_last(&mut self, _: &(), _: u32) {
            self.calls.push("reduce_last");
        }
        fn repeat_last(&mut self) {
            self.calls.push("repeat_last");
            self.len += 1;
            self.written += 1;
        }
        fn skip(&mut self, slots: u64) {
            self.calls.push("skip");
            self.written += slots;
        }
        fn len(&self) -> usize {
            self.len
        }
        fn written(&self) -> u64 {
            self.written
        }
    }

    // ── Sampler ──────────────────────────────────────────────────────────────

    #[test]
    fn sixty_frames_fill_one_second() {
        let mut seconds = TierRecord::<WorldStats>::new();
        for i in 1..=60 {
            let outcome = sample(&mut seconds, FRAME, &cpu(f64::from(i)));
            assert_eq!(outcome, SampleOutcome::Advanced);
        }

        let expected: Vec<f64> = (1..=60).map(f64::from).collect();
        assert_eq!(seconds.buffer.len(), 60);
        assert_eq!(cpu_avgs(&seconds), expected);
    }

    #[test]
    fn slot_count_tracks_elapsed_time() {
        let mut seconds = TierRecord::<WorldStats>::new();
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..2_000 {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let delta = (seed >> 40) as f64 / (1u64 << 24) as f64 * 0.1;
            sample(&mut seconds, delta, &cpu(1.0));

            let slots = slot_index(seconds.elapsed) as u64;
            assert_eq!(seconds.buffer.written(), slots);
            assert_eq!(seconds.buffer.len(), (slots as usize).min(WINDOW));
        }
    }

    #[test]
    fn first_reading_inside_slot_zero_is_discarded() {
        let mut seconds = TierRecord::<WorldStats>::new();
        assert_eq!(sample(&mut seconds, 0.001, &cpu(3.0)), SampleOutcome::Discarded);
        assert!(seconds.buffer.is_empty());
        assert_eq!(sample(&mut seconds, FRAME, &cpu(4.0)), SampleOutcome::Advanced);
        assert_eq!(cpu_avgs(&seconds), vec![4.0]);
    }

    #[test]
    fn backfill_repeats_sample_from_before_the_stall() {
        let mut seconds = TierRecord::<WorldStats>::new();
        sample(&mut seconds, FRAME, &cpu(5.0));

        let outcome = sample(&mut seconds, 4.0 * FRAME, &cpu(9.0));
        assert_eq!(outcome, SampleOutcome::Backfilled { repeated: 3 });
        assert_eq!(cpu_avgs(&seconds), vec![5.0, 5.0, 5.0, 5.0, 9.0]);
    }

    #[test]
    fn three_slot_jump_repeats_twice_before_recording() {
        let mut seconds = TierRecord::<Recording>::new();
        let outcome = sample(&mut seconds, 0.05, &());

        assert_eq!(outcome, SampleOutcome::Backfilled { repeated: 2 });
        assert_eq!(seconds.buffer.calls, vec!["repeat_last", "repeat_last", "get"]);
        assert_eq!(seconds.buffer.written(), 3);
    }

    #[test]
    fn long_stall_backfills_one_window_at_most() {
        let mut seconds = TierRecord::<Recording>::new();
        let outcome = sample(&mut seconds, 10.0, &());
        assert_eq!(outcome, SampleOutcome::Backfilled { repeated: WINDOW as u64 });
        assert_eq!(seconds.buffer.calls.first().copied(), Some("skip"));
        assert_eq!(seconds.buffer.written(), 600);
    }

    #[test]
    fn long_stall_keeps_written_in_step_with_time() {
        let mut seconds = TierRecord::<WorldStats>::new();
        sample(&mut seconds, FRAME, &cpu(1.0));
        sample(&mut seconds, 3.5, &cpu(2.0));

        assert_eq!(seconds.buffer.written(), slot_index(seconds.elapsed) as u64);
        assert_eq!(seconds.buffer.written(), 211);
        assert_eq!(seconds.buffer.len(), WINDOW);
        assert_eq!(cpu_avgs(&seconds).last().copied(), Some(2.0));
    }

    #[test]
    fn readings_in_one_slot_are_averaged() {
        let mut seconds = TierRecord::<WorldStats>::new();
        sample(&mut seconds, FRAME, &cpu(4.0));

        assert_eq!(
            sample(&mut seconds, 0.001, &cpu(8.0)),
            SampleOutcome::Merged { count: 1 }
        );
        assert_eq!(seconds.buffer.len(), 1);
        assert_eq!(newest_cpu(&seconds).avg, 6.0);

        assert_eq!(
            sample(&mut seconds, 0.001, &cpu(12.0)),
            SampleOutcome::Merged { count: 2 }
        );
        let slot = newest_cpu(&seconds);
        assert_eq!(seconds.buffer.len(), 1);
        assert_eq!(slot.avg, 8.0);
        assert_eq!(slot.min, 4.0);
        assert_eq!(slot.max, 12.0);
    }

    #[test]
    fn in_slot_count_restarts_on_next_slot() {
        let mut seconds = TierRecord::<WorldStats>::new();
        sample(&mut seconds, FRAME, &cpu(1.0));
        sample(&mut seconds, 0.001, &cpu(1.0));
        sample(&mut seconds, 0.001, &cpu(1.0));
        assert_eq!(seconds.reduce_count, 2);

        sample(&mut seconds, FRAME, &cpu(2.0));
        assert_eq!(seconds.reduce_count, 0);
        assert_eq!(
            sample(&mut seconds, 0.001, &cpu(4.0)),
            SampleOutcome::Merged { count: 1 }
        );
        assert_eq!(newest_cpu(&seconds).avg, 3.0);
    }

    #[test]
    fn invalid_delta_leaves_tier_untouched() {
        let mut seconds = TierRecord::<WorldStats>::new();
        sample(&mut seconds, FRAME, &cpu(1.0));
        let elapsed = seconds.elapsed;

        assert_eq!(sample(&mut seconds, -0.5, &cpu(2.0)), SampleOutcome::Ignored);
        assert_eq!(sample(&mut seconds, f64::NAN, &cpu(2.0)), SampleOutcome::Ignored);
        assert_eq!(seconds.elapsed, elapsed);
        assert_eq!(seconds.buffer.len(), 1);
    }

    // ── Counters ─────────────────────────────────────────────────────────────

    fn net(total: f64) -> WorldSnapshot {
        WorldSnapshot::default().with(MetricId::NetReceived, total)
    }

    fn net_increases(tier: &TierRecord) -> Vec<f64> {
        tier.buffer
            .samples()
            .map(|s| s.get(MetricId::NetReceived).avg)
            .collect()
    }

    fn newest_net(tier: &TierRecord) -> monitor_stats::Slot {
        tier.buffer.copy_last().get(MetricId::NetReceived)
    }

    #[test]
    fn counter_readings_in_one_slot_add_up() {
        let mut seconds = TierRecord::<WorldStats>::new();
        sample(&mut seconds, FRAME, &net(1000.0));
        sample(&mut seconds, FRAME, &net(1100.0));
        sample(&mut seconds, 0.001, &net(1200.0));
        sample(&mut seconds, 0.001, &net(1250.0));

        assert_eq!(net_increases(&seconds), vec![0.0, 250.0]);
        assert_eq!(newest_net(&seconds).value, 1250.0);
    }

    #[test]
    fn counter_backfill_does_not_double_count() {
        let mut seconds = TierRecord::<WorldStats>::new();
        sample(&mut seconds, FRAME, &net(1000.0));
        sample(&mut seconds, FRAME, &net(1100.0));
        sample(&mut seconds, 4.0 * FRAME, &net(1500.0));

        let increases = net_increases(&seconds);
        assert_eq!(increases, vec![0.0, 100.0, 0.0, 0.0, 0.0, 400.0]);
        assert_eq!(increases.iter().sum::<f64>(), 500.0);
    }

    #[test]
    fn zeroed_startup_reading_is_not_counted_as_traffic() {
        let mut seconds = TierRecord::<WorldStats>::new();
        sample(&mut seconds, FRAME, &net(0.0));
        sample(&mut seconds, FRAME, &net(4e10));
        sample(&mut seconds, FRAME, &net(4e10 + 64.0));

        assert_eq!(net_increases(&seconds), vec![0.0, 0.0, 64.0]);
    }

    #[test]
    fn counter_totals_survive_reduce_and_aggregate() {
        // 60 frames, 10 bytes per frame after the first.
        let mut seconds = TierRecord::<WorldStats>::new();
        for i in 0..60 {
            sample(&mut seconds, FRAME, &net(1000.0 + 10.0 * f64::from(i)));
        }
        let mut minutes = TierRecord::<WorldStats>::new();
        assert!(reduce(&mut minutes, &seconds));
        let minute = newest_net(&minutes);
        assert_eq!(minute.avg, 590.0);
        assert_eq!(minute.min, 0.0);
        assert_eq!(minute.max, 10.0);
        assert_eq!(minute.value, 1590.0);

        let interval = NonZeroU32::new(3).unwrap();
        let mut days = TierRecord::<WorldStats>::new();
        for _ in 0..3 {
            aggregate(&mut days, &minutes, interval);
        }
        assert_eq!(days.buffer.len(), 1);
        assert_close(newest_net(&days).avg, 3.0 * 590.0);
        assert_eq!(newest_net(&days).max, 10.0);
    }

    // ── Reduce ───────────────────────────────────────────────────────────────

    #[test]
    fn reduce_skips_unchanged_source() {
        let mut src = TierRecord::<WorldStats>::new();
        for v in [1.0, 2.0, 3.0] {
            src.buffer.get(&cpu(v));
        }
        let mut dst = TierRecord::<WorldStats>::new();

        assert!(reduce(&mut dst, &src));
        assert!(!reduce(&mut dst, &src));
        assert!(!reduce(&mut dst, &src));
        assert_eq!(dst.buffer.len(), 1);
        assert_eq!(newest_cpu(&dst).avg, 2.0);

        src.buffer.get(&cpu(6.0));
        assert!(reduce(&mut dst, &src));
        assert_eq!(dst.buffer.len(), 2);
        assert_eq!(newest_cpu(&dst).avg, 3.0);
    }

    #[test]
    fn reduce_from_empty_source_does_nothing() {
        let src = TierRecord::<WorldStats>::new();
        let mut dst = TierRecord::<WorldStats>::new();
        assert!(!reduce(&mut dst, &src));
        assert!(dst.buffer.is_empty());
        assert_eq!(dst.reduce_count, 0);
    }

    // ── Aggregate ────────────────────────────────────────────────────────────

    #[test]
    fn full_cycle_of_constant_input_matches_input() {
        for n in [1u32, 2, 5, 24, 168] {
            let interval = NonZeroU32::new(n).unwrap();
            let mut src = TierRecord::<WorldStats>::new();
            src.buffer.get(&cpu(7.0));
            let mut dst = TierRecord::<WorldStats>::new();

            for _ in 0..n {
                assert!(aggregate(&mut dst, &src, interval));
            }
            assert_eq!(dst.reduce_count, 0, "interval {n}");
            assert_eq!(dst.buffer.len(), 1, "interval {n}");
            assert_close(newest_cpu(&dst).avg, 7.0);

            aggregate(&mut dst, &src, interval);
            assert_eq!(dst.buffer.len(), 2, "interval {n}");
            assert_eq!(dst.reduce_count, 1 % n, "interval {n}");
        }
    }

    #[test]
    fn day_cycle_accumulates_every_minute() {
        let interval = NonZeroU32::new(24).unwrap();
        let mut days = TierRecord::<WorldStats>::new();

        for m in 1..=24 {
            let mut minutes = TierRecord::<WorldStats>::new();
            minutes.buffer.get(&cpu(f64::from(m)));
            aggregate(&mut days, &minutes, interval);
        }

        let slot = newest_cpu(&days);
        assert_eq!(days.buffer.len(), 1);
        assert_eq!(days.reduce_count, 0);
        assert_close(slot.avg, 12.5);
        assert_eq!(slot.min, 1.0);
        assert_eq!(slot.max, 24.0);

        let mut minutes = TierRecord::<WorldStats>::new();
        minutes.buffer.get(&cpu(100.0));
        aggregate(&mut days, &minutes, interval);
        assert_eq!(days.reduce_count, 1);
        assert_eq!(days.buffer.len(), 2);
        assert_eq!(newest_cpu(&days).avg, 100.0);
        assert_close(cpu_avgs(&days)[0], 12.5);
    }

    #[test]
    fn aggregate_mid_cycle_copies_then_remerges() {
        let interval = NonZeroU32::new(3).unwrap();
        let mut src = TierRecord::<Recording>::new();
        src.buffer.get(&());
        let mut dst = TierRecord::<Recording>::new();

        aggregate(&mut dst, &src, interval);
        aggregate(&mut dst, &src, interval);
        assert_eq!(dst.buffer.calls, vec!["reduce", "reduce", "reduce_last"]);
        assert_eq!(dst.reduce_count, 2);
    }

    #[test]
    fn aggregate_waits_for_source_data() {
        let interval = NonZeroU32::new(24).unwrap();
        let src = TierRecord::<WorldStats>::new();
        let mut dst = TierRecord::<WorldStats>::new();
        assert!(!aggregate(&mut dst, &src, interval));
        assert_eq!(dst.reduce_count, 0);
        assert!(dst.buffer.is_empty());
    }
}
