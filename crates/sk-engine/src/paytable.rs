//! Line and spin evaluation

use serde::{Deserialize, Serialize};

use crate::config::{RtpProfile, RunMultipliers};
use crate::grid::{Grid, REELS};
use crate::paylines::{PAYLINES, Payline};
use crate::symbols::{Symbol, SymbolTable};

/// Best-paying run found on a single line
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineWin {
    /// Win amount (bet × payout × run multiplier), 0 when the line pays nothing
    pub amount: u64,
    /// Grid positions of the winning run
    pub indices: Vec<usize>,
    /// Symbol the run pays as (a leading wild resolves to a concrete symbol)
    pub symbol: Option<Symbol>,
    /// Length of the winning run
    pub run_length: u8,
}

impl LineWin {
    pub fn is_win(&self) -> bool {
        self.amount > 0
    }
}

/// Scores one payline.
///
/// Runs are anchored at reel 1 and contiguous: counting stops at the first
/// symbol that is neither the candidate nor wild. A leading wild is resolved by
/// trying every payable non-special symbol in paytable order; the first
/// candidate reaching the highest amount wins.
#[derive(Debug, Clone)]
pub struct LineEvaluator {
    symbols: SymbolTable,
    multipliers: RunMultipliers,
    wild_candidates: Vec<Symbol>,
}

impl LineEvaluator {
    pub fn new(profile: &RtpProfile) -> Self {
        Self {
            symbols: profile.symbols().clone(),
            multipliers: profile.multipliers(),
            wild_candidates: profile.symbols().wild_candidates(),
        }
    }

    /// Evaluate the symbols of one line at the given grid positions
    pub fn evaluate(&self, line: &[Symbol; REELS], cells: &[usize; REELS], bet: u64) -> LineWin {
        let first = line[0];
        if first.is_bonus() {
            return LineWin::default();
        }

        let single = [first];
        let candidates: &[Symbol] = if first.is_wild() {
            &self.wild_candidates
        } else {
            &single
        };

        let mut best = LineWin::default();
        for &candidate in candidates {
            let run = line
                .iter()
                .take_while(|&&s| s == candidate || s.is_wild())
                .count();

            let payout = self.symbols.payout_of(candidate) as u64;
            let Some(multiplier) = self.multipliers.for_run(run as u8) else {
                continue;
            };
            if payout == 0 {
                continue;
            }

            let amount = bet.saturating_mul(payout).saturating_mul(multiplier as u64);
            if amount > best.amount {
                best = LineWin {
                    amount,
                    indices: cells[..run].to_vec(),
                    symbol: Some(candidate),
                    run_length: run as u8,
                };
            }
        }
        best
    }

    /// Evaluate a catalog payline against a grid
    pub fn evaluate_payline(&self, grid: &Grid, payline: &Payline, bet: u64) -> LineWin {
        self.evaluate(&grid.pick(payline.cells), &payline.cells, bet)
    }
}

/// The winning payline of a spin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaylineWin {
    /// Catalog index of the payline
    pub payline: usize,
    /// Display name of the payline
    pub name: String,
    #[serde(flatten)]
    pub line: LineWin,
}

/// Outcome of scoring a whole grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinEvaluation {
    /// The single best line, if any line pays
    pub best: Option<PaylineWin>,
    /// Bonus symbols anywhere on the grid
    pub bonus_count: u8,
    /// Whether the bonus count reached the scatter trigger
    pub bonus_triggered: bool,
}

impl SpinEvaluation {
    /// Amount paid by the spin (0 without a winning line)
    pub fn amount(&self) -> u64 {
        self.best.as_ref().map(|w| w.line.amount).unwrap_or(0)
    }

    /// Winning positions (empty without a winning line)
    pub fn indices(&self) -> &[usize] {
        self.best
            .as_ref()
            .map(|w| w.line.indices.as_slice())
            .unwrap_or(&[])
    }

    pub fn payline_name(&self) -> Option<&str> {
        self.best.as_ref().map(|w| w.name.as_str())
    }

    pub fn is_win(&self) -> bool {
        self.amount() > 0
    }
}

/// Scores every payline and keeps only the best one.
///
/// Line wins are never summed: a spin pays its single best line. A later line
/// replaces the current best only with a strictly greater amount, so ties keep
/// the earlier payline in catalog order. The bonus scatter is counted over the
/// whole grid independently of the lines.
#[derive(Debug, Clone)]
pub struct SpinEvaluator {
    lines: LineEvaluator,
    scatter_trigger: u8,
}

impl SpinEvaluator {
    pub fn new(profile: &RtpProfile) -> Self {
        Self {
            lines: LineEvaluator::new(profile),
            scatter_trigger: profile.scatter_trigger(),
        }
    }

    pub fn line_evaluator(&self) -> &LineEvaluator {
        &self.lines
    }

    pub fn evaluate(&self, grid: &Grid, bet: u64) -> SpinEvaluation {
        let mut best: Option<PaylineWin> = None;

        for payline in &PAYLINES {
            let win = self.lines.evaluate_payline(grid, payline, bet);
            let current = best.as_ref().map(|b| b.line.amount).unwrap_or(0);
            if win.amount > current {
                best = Some(PaylineWin {
                    payline: payline.index,
                    name: payline.name.to_string(),
                    line: win,
                });
            }
        }

        let bonus_count = grid.count(Symbol::Bonus) as u8;

        SpinEvaluation {
            best,
            bonus_count,
            bonus_triggered: bonus_count >= self.scatter_trigger,
        }
    }
}
