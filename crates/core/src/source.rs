use crate::state::WorldSnapshot;

/// Anything that can report the current world statistics.
///
/// The sampler calls [`snapshot`](MetricSource::snapshot) on every frame, so
/// implementations must be cheap and must never block; expensive collection
/// belongs in a background task that publishes its latest reading.
pub trait MetricSource {
    fn snapshot(&mut self) -> WorldSnapshot;
}

impl<F> MetricSource for F
where
    F: FnMut() -> WorldSnapshot,
{
    fn snapshot(&mut self) -> WorldSnapshot {
        self()
    }
}
