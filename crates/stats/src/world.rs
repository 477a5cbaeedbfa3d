use crate::{slot::Slot, view::SampleView, StatsSample, TierBuffer, WINDOW};
use monitor_core::{MetricId, MetricKind, WorldSnapshot};

/// Ring of [`WINDOW`] world-statistics samples.
///
/// All storage is allocated once in [`WorldStats::new`]; recording, reducing
/// and merging only overwrite slots in place.
#[derive(Debug, Clone)]
pub struct WorldStats {
    ring:      Box<[StatsSample; WINDOW]>,
    /// Position the next sample is written to.
    cursor:    usize,
    len:       usize,
    written:   u64,
    /// Sample evicted by the most recent push, restored by `retract`.
    displaced: Option<StatsSample>,
}

impl Default for WorldStats {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldStats {
    pub fn new() -> Self {
        Self {
            ring:      Box::new([StatsSample::default(); WINDOW]),
            cursor:    0,
            len:       0,
            written:   0,
            displaced: None,
        }
    }

    fn newest_index(&self) -> usize {
        (self.cursor + WINDOW - 1) % WINDOW
    }

    fn oldest_index(&self) -> usize {
        (self.cursor + WINDOW - self.len) % WINDOW
    }

    /// Newest sample, if any.
    #[must_use]
    pub fn newest(&self) -> Option<StatsSample> {
        (self.len > 0).then(|| self.ring[self.newest_index()])
    }

    /// Samples currently in the window, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = &StatsSample> + '_ {
        let start = self.oldest_index();
        (0..self.len).map(move |i| &self.ring[(start + i) % WINDOW])
    }

    /// Owned copy of the window for readers outside the update path.
    #[must_use]
    pub fn view(&self) -> Vec<SampleView> {
        self.samples().map(SampleView::from).collect()
    }

    fn push(&mut self, sample: StatsSample) {
        if self.len == WINDOW {
            self.displaced = Some(self.ring[self.cursor]);
        } else {
            self.displaced = None;
            self.len += 1;
        }
        self.ring[self.cursor] = sample;
        self.cursor = (self.cursor + 1) % WINDOW;
        self.written += 1;
    }

    /// Undo the most recent push, returning the sample it wrote.
    fn retract(&mut self) -> Option<StatsSample> {
        if self.len == 0 {
            return None;
        }
        let head = self.newest_index();
        let fresh = self.ring[head];
        match self.displaced.take() {
            Some(evicted) => self.ring[head] = evicted,
            None => self.len -= 1,
        }
        self.cursor = head;
        self.written -= 1;
        Some(fresh)
    }
}

impl TierBuffer for WorldStats {
    type Snapshot = WorldSnapshot;
    type Sample = StatsSample;

    fn get(&mut self, snapshot: &WorldSnapshot) {
        let previous = self.newest();
        self.push(StatsSample::from_snapshot(snapshot, previous.as_ref()));
    }

    fn copy_last(&self) -> StatsSample {
        self.newest().unwrap_or_default()
    }

    fn reduce(&mut self, src: &Self) {
        let Some(src_newest) = src.newest() else {
            return;
        };

        let count = src.len as f64;
        let mut reduced = StatsSample::default();
        for id in MetricId::ALL {
            let kind = id.kind();
            let mut sum = 0.0;
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for sample in src.samples() {
                let slot = sample.get(id);
                sum += slot.avg;
                // A counter's extremes are the per-slot increases themselves.
                let (lo, hi) = match kind {
                    MetricKind::Gauge => (slot.min, slot.max),
                    MetricKind::Counter => (slot.avg, slot.avg),
                };
                min = min.min(lo);
                max = max.max(hi);
            }
            let avg = match kind {
                MetricKind::Gauge => sum / count,
                MetricKind::Counter => sum,
            };
            reduced.set(
                id,
                Slot {
                    avg,
                    min,
                    max,
                    value: src_newest.get(id).value,
                },
            );
        }
        self.push(reduced);
    }

    fn reduce_last(&mut self, last: &StatsSample, weight: u32) {
        let Some(fresh) = self.retract() else {
            return;
        };
        let merged = StatsSample::merge_weighted(last, &fresh, weight);
        if self.len == 0 {
            self.push(merged);
        } else {
            let head = self.newest_index();
            self.ring[head] = merged;
        }
    }

    fn repeat_last(&mut self) {
        let filler = self.copy_last().repeated();
        self.push(filler);
    }

    fn skip(&mut self, slots: u64) {
        self.written += slots;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn written(&self) -> u64 {
        self.written
    }
}
