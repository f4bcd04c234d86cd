//! Usage counting domain models.
//!
//! Tracks how many generations an anonymous profile has performed, per
//! category. Authenticated accounts are not capped client-side; the counters
//! only gate anonymous use and feed the transfer-to-account flow.

use serde::{Deserialize, Serialize};

/// The two generation categories, each with its own anonymous quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    Normal,
    Research,
}

impl GenerationKind {
    /// Maximum number of generations allowed for an anonymous profile.
    pub fn anonymous_limit(&self) -> u32 {
        match self {
            GenerationKind::Normal => 5,
            GenerationKind::Research => 2,
        }
    }

    /// Lowercase wire/storage name ("normal" / "research").
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationKind::Normal => "normal",
            GenerationKind::Research => "research",
        }
    }
}

impl std::fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-profile generation counters.
///
/// Counts are monotonically non-decreasing except on an explicit [`reset`],
/// which happens only after a successful transfer to an account.
///
/// [`reset`]: UsageCounters::reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UsageCounters {
    #[serde(default)]
    pub normal_count: u32,
    #[serde(default)]
    pub research_count: u32,
}

impl UsageCounters {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the count for one generation kind.
    pub fn count(&self, kind: GenerationKind) -> u32 {
        match kind {
            GenerationKind::Normal => self.normal_count,
            GenerationKind::Research => self.research_count,
        }
    }

    /// Increments the count for one generation kind.
    pub fn record(&mut self, kind: GenerationKind) {
        match kind {
            GenerationKind::Normal => self.normal_count = self.normal_count.saturating_add(1),
            GenerationKind::Research => {
                self.research_count = self.research_count.saturating_add(1)
            }
        }
    }

    /// Remaining anonymous generations for the kind, never negative.
    pub fn remaining(&self, kind: GenerationKind) -> u32 {
        kind.anonymous_limit().saturating_sub(self.count(kind))
    }

    /// Whether an anonymous profile may still generate in this category.
    pub fn allows(&self, kind: GenerationKind) -> bool {
        self.count(kind) < kind.anonymous_limit()
    }

    /// Total generations across both categories.
    pub fn total(&self) -> u32 {
        self.normal_count.saturating_add(self.research_count)
    }

    /// True when both counters are zero (nothing to transfer).
    pub fn is_empty(&self) -> bool {
        self.normal_count == 0 && self.research_count == 0
    }

    /// Zeroes both counters. Only valid after a successful account transfer.
    pub fn reset(&mut self) {
        self.normal_count = 0;
        self.research_count = 0;
    }
}
