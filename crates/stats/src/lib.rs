//! Fixed-capacity windowed statistics buffers.
//!
//! Every retention tier stores its history in a buffer implementing
//! [`TierBuffer`]. The aggregation stages only ever touch a buffer through
//! these operations, which keeps the merge semantics in one place.

pub mod slot;
pub mod view;
pub mod world;

pub use slot::{Slot, StatsSample};
pub use view::SampleView;
pub use world::WorldStats;

/// Number of samples every tier window holds.
pub const WINDOW: usize = 60;

/// Operations a tier buffer offers to the aggregation stages.
pub trait TierBuffer {
    /// Raw reading recorded by [`get`](TierBuffer::get).
    type Snapshot;
    /// One captured window slot, as returned by [`copy_last`](TierBuffer::copy_last).
    type Sample: Clone + Default;

    /// Record `snapshot` as the new newest sample.
    fn get(&mut self, snapshot: &Self::Snapshot);

    /// Newest sample, or a zeroed sample when nothing has been written yet.
    fn copy_last(&self) -> Self::Sample;

    /// Fold every sample currently in `src`'s window into one new newest
    /// sample. Does nothing when `src` is empty.
    fn reduce(&mut self, src: &Self);

    /// Collapse the newest sample into the one before it.
    ///
    /// The newest sample is removed and the sample now at the head is
    /// replaced by the merge of `last` counted `weight` times and the removed
    /// sample counted once. Averages become `(last * weight + fresh) /
    /// (weight + 1)`, so a head built from `weight` earlier contributions
    /// keeps its true weight. Counter increases are added instead.
    fn reduce_last(&mut self, last: &Self::Sample, weight: u32);

    /// Append a filler sample continuing the newest one (zeroed when empty).
    fn repeat_last(&mut self);

    /// Count `slots` advanced slots without storing them, for gaps longer
    /// than the window holds.
    fn skip(&mut self, slots: u64);

    /// Number of samples currently held, never more than [`WINDOW`].
    fn len(&self) -> usize;

    /// Total number of slots ever advanced, including evicted ones.
    fn written(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
