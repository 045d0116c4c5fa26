//! Error types for profiles, sessions and balance storage

use thiserror::Error;

use crate::symbols::Symbol;

/// Fatal configuration problems, raised while a profile is built
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Symbol '{symbol}' has a spawn weight but no payout entry")]
    MissingPayout { symbol: Symbol },

    #[error("Symbol '{symbol}' has a payout entry but no spawn weight")]
    MissingWeight { symbol: Symbol },

    #[error("Symbol '{symbol}' appears more than once in the {table}")]
    DuplicateSymbol { symbol: Symbol, table: &'static str },

    #[error("Reel pool has no symbol with a positive weight")]
    EmptyPool,

    #[error("Edge reels have nothing to draw once wild is excluded")]
    EmptyEdgePool,

    #[error("Profile defines no denominations")]
    NoDenominations,

    #[error("Invalid denomination: {0}")]
    InvalidDenomination(u64),

    #[error("Default bet {0} is not one of the denominations")]
    DefaultBetNotDenomination(u64),

    #[error("Run multiplier for {run} of a kind must be at least 1, got {value}")]
    InvalidMultiplier { run: u8, value: u32 },

    #[error("Scatter trigger count must be at least 1")]
    InvalidScatterTrigger,

    #[error("Win tier thresholds must be positive and ascending")]
    InvalidWinTiers,

    #[error("Unsupported profile format: {path}")]
    UnsupportedFormat { path: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a bet change was refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetRejection {
    #[error("not an allowed denomination")]
    NotADenomination,

    #[error("exceeds the balance")]
    ExceedsBalance,

    #[error("a spin is in progress")]
    SpinInProgress,
}

/// Recoverable session errors; a failed request leaves the session untouched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Insufficient funds: balance {balance} does not cover bet {bet}")]
    InsufficientFunds { balance: u64, bet: u64 },

    #[error("Invalid bet {amount}: {reason}")]
    InvalidBet { amount: u64, reason: BetRejection },

    #[error("A spin is already in progress")]
    SpinInProgress,
}

/// Balance persistence errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type ProfileResult<T> = Result<T, ProfileError>;
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_bet_message_names_reason() {
        let err = SessionError::InvalidBet {
            amount: 50,
            reason: BetRejection::ExceedsBalance,
        };
        assert_eq!(err.to_string(), "Invalid bet 50: exceeds the balance");
        assert_eq!(BetRejection::NotADenomination.to_string(), "not an allowed denomination");
    }
}
