use monitor_stats::{SampleView, WorldStats};
use serde::Serialize;
use std::fmt;

/// One retention resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Seconds,
        Tier::Minutes,
        Tier::Hours,
        Tier::Days,
        Tier::Weeks,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Tier::Seconds => "seconds",
            Tier::Minutes => "minutes",
            Tier::Hours   => "hours",
            Tier::Days    => "days",
            Tier::Weeks   => "weeks",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State owned by one tier: its window plus the bookkeeping the stage
/// writing into it needs.
#[derive(Debug, Clone, Default)]
pub struct TierRecord<B = WorldStats> {
    /// Time fed into the tier so far (seconds tier only).
    pub elapsed: f64,
    /// Position inside the current merge cycle.
    pub reduce_count: u32,
    /// Source `written()` value at the last reduction into this tier.
    pub consumed: u64,
    pub buffer: B,
}

impl<B: Default> TierRecord<B> {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Owned copy of a tier's window, safe to hand to readers on other tasks.
#[derive(Debug, Clone, Serialize)]
pub struct TierView {
    pub tier: Tier,
    /// Slots advanced since start, including those evicted from the window.
    pub written: u64,
    /// Window contents, oldest first.
    pub samples: Vec<SampleView>,
}

impl TierView {
    #[must_use]
    pub fn newest(&self) -> Option<&SampleView> {
        self.samples.last()
    }
}
