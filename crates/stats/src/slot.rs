use monitor_core::{MetricId, MetricKind, WorldSnapshot};
use serde::Serialize;

/// One metric's statistics for a single time slot.
///
/// For a gauge `avg`, `min` and `max` describe the level over the slot. For a
/// counter `avg` is the total increase over the slot, and `min`/`max` are the
/// smallest and largest increase seen by one finer-grained step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Slot {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    /// Raw total behind a counter's increase; equals `avg` for gauges.
    pub value: f64,
}

impl Slot {
    /// A slot holding a single observation.
    #[must_use]
    pub fn single(level: f64, value: f64) -> Self {
        Self {
            avg: level,
            min: level,
            max: level,
            value,
        }
    }

    /// Merge `last` (counted `weight` times) with `fresh` (counted once).
    #[must_use]
    pub fn merge_weighted(last: &Slot, fresh: &Slot, weight: u32) -> Self {
        let w = f64::from(weight);
        Self {
            avg:   (last.avg * w + fresh.avg) / (w + 1.0),
            min:   last.min.min(fresh.min),
            max:   last.max.max(fresh.max),
            value: fresh.value,
        }
    }

    /// Add the increase counted by `fresh` to the one already in `last`.
    #[must_use]
    pub fn merge_increase(last: &Slot, fresh: &Slot) -> Self {
        Self {
            avg:   last.avg + fresh.avg,
            min:   last.min.min(fresh.min),
            max:   last.max.max(fresh.max),
            value: fresh.value,
        }
    }

    /// Same total, nothing added.
    #[must_use]
    pub fn idle(&self) -> Self {
        Self::single(0.0, self.value)
    }
}

/// Every metric's [`Slot`] at one window position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSample {
    slots: [Slot; MetricId::COUNT],
}

impl StatsSample {
    /// Turn a raw reading into a sample. Counters are recorded as the change
    /// since `previous`. With no previous total to compare against (first
    /// reading, or a previous total of zero) and for a shrinking total the
    /// change is zero.
    #[must_use]
    pub fn from_snapshot(snapshot: &WorldSnapshot, previous: Option<&StatsSample>) -> Self {
        let mut sample = Self::default();
        for (id, reading) in snapshot.iter() {
            let level = match id.kind() {
                MetricKind::Gauge => reading,
                MetricKind::Counter => match previous.map(|p| p.get(id).value) {
                    Some(total) if total > 0.0 => (reading - total).max(0.0),
                    _ => 0.0,
                },
            };
            sample.slots[id.index()] = Slot::single(level, reading);
        }
        sample
    }

    #[must_use]
    pub fn get(&self, id: MetricId) -> Slot {
        self.slots[id.index()]
    }

    pub fn set(&mut self, id: MetricId, slot: Slot) {
        self.slots[id.index()] = slot;
    }

    /// Merge `fresh` into `last`: gauges by weighted mean (`last` counted
    /// `weight` times), counters by adding their increases.
    #[must_use]
    pub fn merge_weighted(last: &StatsSample, fresh: &StatsSample, weight: u32) -> Self {
        let mut merged = Self::default();
        for id in MetricId::ALL {
            let (a, b) = (last.get(id), fresh.get(id));
            let slot = match id.kind() {
                MetricKind::Gauge => Slot::merge_weighted(&a, &b, weight),
                MetricKind::Counter => Slot::merge_increase(&a, &b),
            };
            merged.set(id, slot);
        }
        merged
    }

    /// Filler for a slot nothing was observed in: gauges hold their level,
    /// counters keep their total with no increase.
    #[must_use]
    pub fn repeated(&self) -> Self {
        let mut sample = *self;
        for id in MetricId::ALL {
            if id.kind() == MetricKind::Counter {
                sample.set(id, self.get(id).idle());
            }
        }
        sample
    }
}
