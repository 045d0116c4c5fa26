//! RTP profiles: the configuration that parameterises draw and payout
//!
//! A profile is parsed from a [`ProfileDocument`] (JSON or YAML), validated
//! once, and then stays immutable for the lifetime of a session.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, ProfileResult};
use crate::symbols::{PayoutEntry, Symbol, SymbolTable, WeightEntry};

/// Multipliers applied by run length (a run of 3 always pays ×1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMultipliers {
    /// Multiplier for 4 of a kind
    pub four: u32,
    /// Multiplier for 5 of a kind
    pub five: u32,
}

impl RunMultipliers {
    /// Multiplier for a run of `length`, `None` when the run is too short to pay
    pub fn for_run(&self, length: u8) -> Option<u32> {
        match length {
            3 => Some(1),
            4 => Some(self.four),
            5 => Some(self.five),
            _ => None,
        }
    }
}

/// Thresholds (win / bet ratios) separating the win tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinTierThresholds {
    /// Minimum ratio for a notable win
    pub notable: f64,
    /// Minimum ratio for a huge win
    pub huge: f64,
    /// Minimum ratio for a max win
    pub max: f64,
}

impl Default for WinTierThresholds {
    fn default() -> Self {
        Self {
            notable: 10.0,
            huge: 30.0,
            max: 100.0,
        }
    }
}

impl WinTierThresholds {
    fn is_valid(&self) -> bool {
        self.notable > 0.0 && self.notable < self.huge && self.huge < self.max
    }
}

fn default_scatter_trigger() -> u8 {
    3
}

fn default_bet() -> u64 {
    5
}

/// Serialized form of a profile, as read from JSON or YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDocument {
    /// Profile key (also the balance persistence key)
    pub name: String,
    /// Display title
    #[serde(default)]
    pub title: Option<String>,
    /// Weighted reel pool, in draw order
    pub pool: Vec<WeightEntry>,
    /// Payout table, in candidate order
    pub paytable: Vec<PayoutEntry>,
    /// Allowed bet amounts
    pub denominations: Vec<u64>,
    /// Run-length multipliers
    pub multipliers: RunMultipliers,
    /// Free spins credited when the bonus triggers
    pub free_spins_award: u64,
    /// Bonus symbols needed anywhere on the grid to trigger
    #[serde(default = "default_scatter_trigger")]
    pub scatter_trigger: u8,
    /// Bet selected when a session starts
    #[serde(default = "default_bet")]
    pub default_bet: u64,
    /// Balance a fresh session starts with
    #[serde(default)]
    pub starting_balance: u64,
    /// Amount credited by a top-up
    #[serde(default)]
    pub top_up_amount: u64,
    #[serde(default)]
    pub win_tiers: WinTierThresholds,
}

/// One row of the value table shown to players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaytableRow {
    pub symbol: Symbol,
    /// Base payout multiplier
    pub payout: u32,
    /// Pay per unit bet for 3, 4 and 5 of a kind
    pub pays: [u64; 3],
}

/// A validated RTP profile
#[derive(Debug, Clone, PartialEq)]
pub struct RtpProfile {
    name: String,
    title: String,
    symbols: SymbolTable,
    denominations: Vec<u64>,
    multipliers: RunMultipliers,
    free_spins_award: u64,
    scatter_trigger: u8,
    default_bet: u64,
    starting_balance: u64,
    top_up_amount: u64,
    win_tiers: WinTierThresholds,
}

impl RtpProfile {
    // ═══════════════════════════════════════════════════════════════════════
    // BUILT-IN PROFILES
    // ═══════════════════════════════════════════════════════════════════════

    /// Names of the built-in profiles
    pub const BUILTIN: [&'static str; 2] = ["rtp90", "rtp98"];

    /// Conservative tuning (~90% RTP)
    pub fn conservative() -> Self {
        let doc = ProfileDocument {
            name: "rtp90".into(),
            title: Some("Štrakanje".into()),
            pool: weights(&[
                (Symbol::Zeki, 20),
                (Symbol::Zarzin, 11),
                (Symbol::Tehno, 20),
                (Symbol::BojcheKoks, 15),
                (Symbol::AcoResen, 15),
                (Symbol::Sigma, 11),
                (Symbol::Tino, 11),
                (Symbol::Cele, 9),
                (Symbol::Wild, 6),
                (Symbol::Seven, 5),
                (Symbol::Bonus, 4),
            ]),
            paytable: payouts(&[
                (Symbol::Zeki, 2),
                (Symbol::Tehno, 3),
                (Symbol::Zarzin, 4),
                (Symbol::BojcheKoks, 5),
                (Symbol::AcoResen, 8),
                (Symbol::Sigma, 12),
                (Symbol::Tino, 18),
                (Symbol::Cele, 25),
                (Symbol::Wild, 50),
                (Symbol::Seven, 80),
                (Symbol::Bonus, 0),
            ]),
            denominations: vec![5, 10, 20, 50, 100, 500, 1000],
            multipliers: RunMultipliers { four: 2, five: 5 },
            free_spins_award: 5,
            scatter_trigger: 3,
            default_bet: 5,
            starting_balance: 0,
            top_up_amount: 100,
            win_tiers: WinTierThresholds::default(),
        };
        Self::builtin(doc)
    }

    /// Generous tuning (~98% RTP)
    pub fn generous() -> Self {
        let doc = ProfileDocument {
            name: "rtp98".into(),
            title: Some("Ultimate Štrakanje".into()),
            pool: weights(&[
                (Symbol::Zeki, 18),
                (Symbol::Tehno, 18),
                (Symbol::BojcheKoks, 16),
                (Symbol::AcoResen, 16),
                (Symbol::Sigma, 14),
                (Symbol::Tino, 14),
                (Symbol::Cele, 12),
                (Symbol::Wild, 10),
                (Symbol::Seven, 8),
                (Symbol::Bonus, 6),
            ]),
            paytable: payouts(&[
                (Symbol::Zeki, 4),
                (Symbol::Tehno, 6),
                (Symbol::BojcheKoks, 10),
                (Symbol::AcoResen, 15),
                (Symbol::Sigma, 20),
                (Symbol::Tino, 30),
                (Symbol::Cele, 40),
                (Symbol::Wild, 80),
                (Symbol::Seven, 120),
                (Symbol::Bonus, 0),
            ]),
            denominations: vec![5, 10, 20, 50, 100],
            multipliers: RunMultipliers { four: 4, five: 10 },
            free_spins_award: 10,
            scatter_trigger: 3,
            default_bet: 5,
            starting_balance: 1000,
            top_up_amount: 1000,
            win_tiers: WinTierThresholds::default(),
        };
        Self::builtin(doc)
    }

    /// Look up a built-in profile by name
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "rtp90" => Some(Self::conservative()),
            "rtp98" => Some(Self::generous()),
            _ => None,
        }
    }

    fn builtin(doc: ProfileDocument) -> Self {
        match Self::from_document(doc) {
            Ok(profile) => profile,
            Err(e) => unreachable!("built-in profile is invalid: {e}"),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // LOADING
    // ═══════════════════════════════════════════════════════════════════════

    /// Parse a JSON profile document
    pub fn from_json(json: &str) -> ProfileResult<Self> {
        let doc: ProfileDocument = serde_json::from_str(json)?;
        Self::from_document(doc)
    }

    /// Parse a YAML profile document
    pub fn from_yaml(yaml: &str) -> ProfileResult<Self> {
        let doc: ProfileDocument = serde_yml::from_str(yaml)?;
        Self::from_document(doc)
    }

    /// Load a profile file, choosing the format by extension
    pub fn from_path(path: impl AsRef<Path>) -> ProfileResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let profile = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text)?,
            Some("yaml") | Some("yml") => Self::from_yaml(&text)?,
            _ => {
                return Err(ProfileError::UnsupportedFormat {
                    path: path.display().to_string(),
                });
            }
        };
        log::info!("Loaded profile '{}' from {}", profile.name, path.display());
        Ok(profile)
    }

    /// Validate a document and build the profile
    pub fn from_document(doc: ProfileDocument) -> ProfileResult<Self> {
        validate(&doc)?;

        Ok(Self {
            title: doc.title.unwrap_or_else(|| doc.name.clone()),
            name: doc.name,
            symbols: SymbolTable::from_parts(doc.pool, doc.paytable),
            denominations: doc.denominations,
            multipliers: doc.multipliers,
            free_spins_award: doc.free_spins_award,
            scatter_trigger: doc.scatter_trigger,
            default_bet: doc.default_bet,
            starting_balance: doc.starting_balance,
            top_up_amount: doc.top_up_amount,
            win_tiers: doc.win_tiers,
        })
    }

    /// Convert back to the serialized form
    pub fn to_document(&self) -> ProfileDocument {
        ProfileDocument {
            name: self.name.clone(),
            title: Some(self.title.clone()),
            pool: self.symbols.pool().to_vec(),
            paytable: self.symbols.paytable().to_vec(),
            denominations: self.denominations.clone(),
            multipliers: self.multipliers,
            free_spins_award: self.free_spins_award,
            scatter_trigger: self.scatter_trigger,
            default_bet: self.default_bet,
            starting_balance: self.starting_balance,
            top_up_amount: self.top_up_amount,
            win_tiers: self.win_tiers,
        }
    }

    /// Pretty JSON export
    pub fn to_json(&self) -> ProfileResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn weight_of(&self, symbol: Symbol) -> u32 {
        self.symbols.weight_of(symbol)
    }

    pub fn payout_of(&self, symbol: Symbol) -> u32 {
        self.symbols.payout_of(symbol)
    }

    pub fn denominations(&self) -> &[u64] {
        &self.denominations
    }

    pub fn is_denomination(&self, amount: u64) -> bool {
        self.denominations.contains(&amount)
    }

    pub fn multipliers(&self) -> RunMultipliers {
        self.multipliers
    }

    pub fn free_spins_award(&self) -> u64 {
        self.free_spins_award
    }

    pub fn scatter_trigger(&self) -> u8 {
        self.scatter_trigger
    }

    pub fn default_bet(&self) -> u64 {
        self.default_bet
    }

    pub fn starting_balance(&self) -> u64 {
        self.starting_balance
    }

    pub fn top_up_amount(&self) -> u64 {
        self.top_up_amount
    }

    pub fn win_tiers(&self) -> WinTierThresholds {
        self.win_tiers
    }

    /// Value table: pay per unit bet for each paytable symbol that pays
    pub fn paytable_rows(&self) -> Vec<PaytableRow> {
        self.symbols
            .paytable()
            .iter()
            .filter(|e| e.payout > 0)
            .map(|e| {
                let base = e.payout as u64;
                PaytableRow {
                    symbol: e.symbol,
                    payout: e.payout,
                    pays: [
                        base,
                        base * self.multipliers.four as u64,
                        base * self.multipliers.five as u64,
                    ],
                }
            })
            .collect()
    }
}

impl Default for RtpProfile {
    fn default() -> Self {
        Self::conservative()
    }
}

fn weights(entries: &[(Symbol, u32)]) -> Vec<WeightEntry> {
    entries
        .iter()
        .map(|&(symbol, weight)| WeightEntry { symbol, weight })
        .collect()
}

fn payouts(entries: &[(Symbol, u32)]) -> Vec<PayoutEntry> {
    entries
        .iter()
        .map(|&(symbol, payout)| PayoutEntry { symbol, payout })
        .collect()
}

fn validate(doc: &ProfileDocument) -> ProfileResult<()> {
    let mut pooled = HashSet::new();
    for entry in &doc.pool {
        if !pooled.insert(entry.symbol) {
            return Err(ProfileError::DuplicateSymbol {
                symbol: entry.symbol,
                table: "pool",
            });
        }
    }

    let mut paid = HashSet::new();
    for entry in &doc.paytable {
        if !paid.insert(entry.symbol) {
            return Err(ProfileError::DuplicateSymbol {
                symbol: entry.symbol,
                table: "paytable",
            });
        }
    }

    if let Some(entry) = doc.pool.iter().find(|e| !paid.contains(&e.symbol)) {
        return Err(ProfileError::MissingPayout { symbol: entry.symbol });
    }
    if let Some(entry) = doc.paytable.iter().find(|e| !pooled.contains(&e.symbol)) {
        return Err(ProfileError::MissingWeight { symbol: entry.symbol });
    }

    if doc.pool.iter().all(|e| e.weight == 0) {
        return Err(ProfileError::EmptyPool);
    }
    if doc.pool.iter().filter(|e| !e.symbol.is_wild()).all(|e| e.weight == 0) {
        return Err(ProfileError::EmptyEdgePool);
    }

    if doc.denominations.is_empty() {
        return Err(ProfileError::NoDenominations);
    }
    if let Some(&zero) = doc.denominations.iter().find(|&&d| d == 0) {
        return Err(ProfileError::InvalidDenomination(zero));
    }
    if !doc.denominations.contains(&doc.default_bet) {
        return Err(ProfileError::DefaultBetNotDenomination(doc.default_bet));
    }

    if doc.multipliers.four == 0 {
        return Err(ProfileError::InvalidMultiplier {
            run: 4,
            value: doc.multipliers.four,
        });
    }
    if doc.multipliers.five == 0 {
        return Err(ProfileError::InvalidMultiplier {
            run: 5,
            value: doc.multipliers.five,
        });
    }

    if doc.scatter_trigger == 0 {
        return Err(ProfileError::InvalidScatterTrigger);
    }
    if !doc.win_tiers.is_valid() {
        return Err(ProfileError::InvalidWinTiers);
    }

    Ok(())
}
