//! Symbol catalog: spawn weights and payouts

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every symbol that can land on a reel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    Zeki,
    Tehno,
    Zarzin,
    BojcheKoks,
    AcoResen,
    Sigma,
    Tino,
    Cele,
    /// Substitutes for any payable symbol within a run
    Wild,
    Seven,
    /// Scatter; never pays on a line, triggers free spins instead
    #[serde(alias = "paleni_bonus")]
    Bonus,
}

impl Symbol {
    /// All symbols in declaration order
    pub const ALL: [Symbol; 11] = [
        Symbol::Zeki,
        Symbol::Tehno,
        Symbol::Zarzin,
        Symbol::BojcheKoks,
        Symbol::AcoResen,
        Symbol::Sigma,
        Symbol::Tino,
        Symbol::Cele,
        Symbol::Wild,
        Symbol::Seven,
        Symbol::Bonus,
    ];

    /// Identifier used in profile documents and logs
    pub fn id(&self) -> &'static str {
        match self {
            Self::Zeki => "zeki",
            Self::Tehno => "tehno",
            Self::Zarzin => "zarzin",
            Self::BojcheKoks => "bojche_koks",
            Self::AcoResen => "aco_resen",
            Self::Sigma => "sigma",
            Self::Tino => "tino",
            Self::Cele => "cele",
            Self::Wild => "wild",
            Self::Seven => "seven",
            Self::Bonus => "bonus",
        }
    }

    pub fn is_wild(&self) -> bool {
        matches!(self, Self::Wild)
    }

    pub fn is_bonus(&self) -> bool {
        matches!(self, Self::Bonus)
    }

    /// Wild and bonus never act as the target of a line run
    pub fn is_special(&self) -> bool {
        self.is_wild() || self.is_bonus()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Spawn weight of one symbol in the reel pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub symbol: Symbol,
    pub weight: u32,
}

/// Payout multiplier of one symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutEntry {
    pub symbol: Symbol,
    pub payout: u32,
}

/// Ordered symbol catalog of a profile.
///
/// Pool order drives the weighted draw; paytable order is the iteration order
/// used when a leading wild is resolved, so it also decides candidate ties.
/// Both orders are kept exactly as the profile declares them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    pool: Vec<WeightEntry>,
    paytable: Vec<PayoutEntry>,
}

impl SymbolTable {
    /// Build a table without validation; see `RtpProfile` for the checked path
    pub(crate) fn from_parts(pool: Vec<WeightEntry>, paytable: Vec<PayoutEntry>) -> Self {
        Self { pool, paytable }
    }

    /// Spawn weight of a symbol, 0 when it is not in the pool
    pub fn weight_of(&self, symbol: Symbol) -> u32 {
        self.pool
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| e.weight)
            .unwrap_or(0)
    }

    /// Payout multiplier of a symbol, 0 when it is not in the paytable
    pub fn payout_of(&self, symbol: Symbol) -> u32 {
        self.paytable
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| e.payout)
            .unwrap_or(0)
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.pool.iter().any(|e| e.symbol == symbol)
    }

    /// Weighted pool in declaration order
    pub fn pool(&self) -> &[WeightEntry] {
        &self.pool
    }

    /// Paytable in declaration order
    pub fn paytable(&self) -> &[PayoutEntry] {
        &self.paytable
    }

    /// Sum of all pool weights
    pub fn total_weight(&self) -> u64 {
        self.pool.iter().map(|e| e.weight as u64).sum()
    }

    /// Symbols a leading wild may resolve to, in paytable order
    pub fn wild_candidates(&self) -> Vec<Symbol> {
        self.paytable
            .iter()
            .map(|e| e.symbol)
            .filter(|s| !s.is_special())
            .collect()
    }

    /// Probability of drawing `symbol` from the full pool
    pub fn probability(&self, symbol: Symbol) -> f64 {
        let total = self.total_weight();
        if total == 0 {
            return 0.0;
        }
        self.weight_of(symbol) as f64 / total as f64
    }
}
