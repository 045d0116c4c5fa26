//! Win Tiers: severity bands for the presentation layer
//!
//! The engine only classifies; picking sounds or effects per tier is left to
//! whoever renders the result.

use serde::{Deserialize, Serialize};

use crate::config::WinTierThresholds;

/// Severity band of a win, by win / bet ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinTier {
    /// Below the notable threshold
    Ordinary,
    Notable,
    Huge,
    Max,
}

impl WinTier {
    /// All tiers, lowest first
    pub const ALL: [WinTier; 4] = [WinTier::Ordinary, WinTier::Notable, WinTier::Huge, WinTier::Max];

    /// Tier for a win ratio; `None` when nothing was won
    pub fn from_ratio(ratio: f64, thresholds: &WinTierThresholds) -> Option<Self> {
        match ratio {
            r if r <= 0.0 => None,
            r if r >= thresholds.max => Some(Self::Max),
            r if r >= thresholds.huge => Some(Self::Huge),
            r if r >= thresholds.notable => Some(Self::Notable),
            _ => Some(Self::Ordinary),
        }
    }

    /// Classify a win amount against the bet it was won with
    pub fn classify(amount: u64, bet: u64, thresholds: &WinTierThresholds) -> Option<Self> {
        Self::from_ratio(win_ratio(amount, bet), thresholds)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ordinary => "Win",
            Self::Notable => "Big Win",
            Self::Huge => "Huge Win",
            Self::Max => "Max Win",
        }
    }

    /// Tier index (for ordering and counters)
    pub fn index(&self) -> usize {
        match self {
            Self::Ordinary => 0,
            Self::Notable => 1,
            Self::Huge => 2,
            Self::Max => 3,
        }
    }
}

/// Win-to-bet ratio, 0 for a zero bet
pub fn win_ratio(amount: u64, bet: u64) -> f64 {
    if bet > 0 {
        amount as f64 / bet as f64
    } else {
        0.0
    }
}
