//! Spin result

use serde::{Deserialize, Serialize};

use crate::config::WinTierThresholds;
use crate::grid::Grid;
use crate::paytable::SpinEvaluation;
use crate::symbols::Symbol;
use crate::win_tiers::{WinTier, win_ratio};

/// Complete outcome of one settled spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    /// Sequence number within the session, starting at 1
    pub spin_id: u64,
    /// Final grid
    pub grid: Grid,
    /// Bet the spin was played at
    pub bet: u64,
    /// Paid with a free spin instead of the balance
    pub free_spin: bool,
    /// Amount credited by the winning line (0 on a loss)
    pub amount: u64,
    /// Catalog index of the winning payline
    pub payline: Option<usize>,
    pub payline_name: Option<String>,
    /// Grid positions of the winning run
    pub winning_indices: Vec<usize>,
    pub winning_symbol: Option<Symbol>,
    pub run_length: u8,
    /// Balance after settlement
    pub balance: u64,
    /// Free-spin credit after settlement
    pub free_spins: u64,
    pub bonus_count: u8,
    pub bonus_triggered: bool,
    /// Free spins credited by this spin's bonus
    pub free_spins_awarded: u64,
    /// Win-to-bet ratio
    pub win_ratio: f64,
    /// Win tier (None on a loss)
    pub win_tier: Option<WinTier>,
}

impl SpinResult {
    /// Build a result from a scored grid. Balance and free-spin fields are
    /// filled in by the session once it has credited the win.
    pub(crate) fn from_evaluation(
        spin_id: u64,
        grid: Grid,
        bet: u64,
        free_spin: bool,
        eval: SpinEvaluation,
        thresholds: &WinTierThresholds,
    ) -> Self {
        let amount = eval.amount();
        let (payline, payline_name, line) = match eval.best {
            Some(best) => (Some(best.payline), Some(best.name), best.line),
            None => (None, None, Default::default()),
        };

        Self {
            spin_id,
            grid,
            bet,
            free_spin,
            amount,
            payline,
            payline_name,
            winning_indices: line.indices,
            winning_symbol: line.symbol,
            run_length: line.run_length,
            balance: 0,
            free_spins: 0,
            bonus_count: eval.bonus_count,
            bonus_triggered: eval.bonus_triggered,
            free_spins_awarded: 0,
            win_ratio: win_ratio(amount, bet),
            win_tier: WinTier::classify(amount, bet, thresholds),
        }
    }

    pub fn is_win(&self) -> bool {
        self.amount > 0
    }

    /// Net change to the balance caused by this spin
    pub fn net(&self) -> i64 {
        let stake = if self.free_spin { 0 } else { self.bet as i64 };
        self.amount as i64 - stake
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        match (&self.payline_name, self.winning_symbol) {
            (Some(line), Some(symbol)) => format!(
                "#{} won {} on {} ({}x {}), balance {}",
                self.spin_id, self.amount, line, self.run_length, symbol, self.balance
            ),
            _ => format!("#{} no win, balance {}", self.spin_id, self.balance),
        }
    }
}
