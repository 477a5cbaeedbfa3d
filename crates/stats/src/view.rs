use crate::{Slot, StatsSample};
use monitor_core::MetricId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Owned, serializable copy of one window sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleView {
    pub metrics: BTreeMap<MetricId, Slot>,
}

impl SampleView {
    #[must_use]
    pub fn get(&self, id: MetricId) -> Option<&Slot> {
        self.metrics.get(&id)
    }
}

impl From<&StatsSample> for SampleView {
    fn from(sample: &StatsSample) -> Self {
        Self {
            metrics: MetricId::ALL.iter().map(|&id| (id, sample.get(id))).collect(),
        }
    }
}
