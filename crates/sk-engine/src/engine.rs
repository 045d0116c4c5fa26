//! Session Engine: the spin transaction and the balance it owns
//!
//! ```text
//!            request_spin
//!   Idle ───────────────────> Spinning ──(reels drawn)──> Settling
//!    ^                                                        │
//!    └─────────────────(win + free spins credited)────────────┘
//! ```
//!
//! Only one transaction runs at a time. A request that arrives while a spin is
//! in flight (from another thread or from an observer hook) is rejected and
//! changes nothing; requests are never queued.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::RtpProfile;
use crate::error::{BetRejection, ProfileResult, SessionError, SessionResult};
use crate::grid::Grid;
use crate::paytable::SpinEvaluator;
use crate::reels::ReelGenerator;
use crate::spin::SpinResult;
use crate::win_tiers::WinTier;

/// Phase of the spin transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Ready to accept a spin or a bet change
    Idle,
    /// Stake debited, reels being drawn
    Spinning,
    /// Grid drawn, win being evaluated and credited
    Settling,
}

/// Hooks for a presentation layer following a spin.
///
/// Hooks run outside the session lock, so they may query the session. Any
/// `request_spin` or `set_bet` made from a hook is rejected, since the
/// transaction it interrupts is still in flight.
pub trait SpinObserver {
    /// Stake taken, phase is `Spinning`
    fn on_spin_started(&self, _bet: u64, _free_spin: bool) {}

    /// Grid drawn, phase is `Settling`
    fn on_reels_stopped(&self, _grid: &Grid) {}

    /// Transaction complete, phase is back to `Idle`
    fn on_settled(&self, _result: &SpinResult) {}
}

/// Observer that ignores every hook
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SpinObserver for NoopObserver {}

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub paid_spins: u64,
    pub free_spins_played: u64,
    /// Sum of stakes taken from the balance
    pub total_wagered: u64,
    pub total_won: u64,
    pub wins: u64,
    pub losses: u64,
    pub notable_wins: u64,
    pub huge_wins: u64,
    pub max_wins: u64,
    pub bonus_triggers: u64,
    pub free_spins_awarded: u64,
    pub max_win_ratio: f64,
}

impl SessionStats {
    /// Return to player, in percent of the amount wagered
    pub fn rtp(&self) -> f64 {
        if self.total_wagered > 0 {
            (self.total_won as f64 / self.total_wagered as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Percentage of spins that paid anything
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.wins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }

    fn record(&mut self, result: &SpinResult) {
        self.total_spins += 1;
        if result.free_spin {
            self.free_spins_played += 1;
        } else {
            self.paid_spins += 1;
            self.total_wagered += result.bet;
        }

        self.total_won += result.amount;
        if result.is_win() {
            self.wins += 1;
        } else {
            self.losses += 1;
        }

        match result.win_tier {
            Some(WinTier::Notable) => self.notable_wins += 1,
            Some(WinTier::Huge) => self.huge_wins += 1,
            Some(WinTier::Max) => self.max_wins += 1,
            _ => {}
        }

        if result.bonus_triggered {
            self.bonus_triggers += 1;
            self.free_spins_awarded += result.free_spins_awarded;
        }

        self.max_win_ratio = self.max_win_ratio.max(result.win_ratio);
    }
}

/// Serializable view of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub profile: String,
    pub balance: u64,
    pub bet: u64,
    pub free_spins: u64,
    pub phase: SessionPhase,
    pub spin_count: u64,
}

#[derive(Debug, Clone)]
struct SessionState {
    balance: u64,
    bet: u64,
    free_spins: u64,
    phase: SessionPhase,
    spin_count: u64,
    stats: SessionStats,
}

/// Stake taken for a spin that has not settled yet
#[derive(Debug, Clone, Copy)]
struct SpinTicket {
    spin_id: u64,
    bet: u64,
    free_spin: bool,
}

/// A debited spin on its way to settlement.
///
/// Dropping it unsettled (an observer hook panicked) still settles the spin,
/// drawing the grid if none was drawn yet, so the stake is never lost and
/// the session returns to `Idle`.
struct PendingSpin<'a, R: Rng> {
    engine: &'a SessionEngine<R>,
    ticket: Option<SpinTicket>,
    grid: Option<Grid>,
}

impl<R: Rng> PendingSpin<'_, R> {
    fn settle(mut self) -> SpinResult {
        self.finish()
            .unwrap_or_else(|| unreachable!("pending spin settled twice"))
    }

    fn finish(&mut self) -> Option<SpinResult> {
        let ticket = self.ticket.take()?;
        let grid = match self.grid.take() {
            Some(grid) => grid,
            None => self.engine.draw_grid(),
        };
        Some(self.engine.settle(ticket, grid))
    }
}

impl<R: Rng> Drop for PendingSpin<'_, R> {
    fn drop(&mut self) {
        if let Some(result) = self.finish() {
            log::warn!("Spin #{} settled after an observer hook unwound", result.spin_id);
        }
    }
}

/// One player session against one RTP profile.
///
/// The session owns the balance, bet and free-spin credit. Every method takes
/// `&self`; state sits behind a `parking_lot::Mutex`, so a session can be
/// shared between threads. The random source is injected: use [`seeded`] for
/// reproducible play.
///
/// [`seeded`]: SessionEngine::seeded
pub struct SessionEngine<R = ChaCha8Rng> {
    profile: Arc<RtpProfile>,
    reels: ReelGenerator,
    evaluator: SpinEvaluator,
    state: Mutex<SessionState>,
    rng: Mutex<R>,
}

impl SessionEngine<ChaCha8Rng> {
    /// Session seeded from the operating system
    pub fn new(profile: impl Into<Arc<RtpProfile>>) -> ProfileResult<Self> {
        Self::with_rng(profile, ChaCha8Rng::from_os_rng())
    }

    /// Session with a fixed seed; identical seeds replay identical grids
    pub fn seeded(profile: impl Into<Arc<RtpProfile>>, seed: u64) -> ProfileResult<Self> {
        Self::with_rng(profile, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> SessionEngine<R> {
    /// Session drawing from the given random source
    pub fn with_rng(profile: impl Into<Arc<RtpProfile>>, rng: R) -> ProfileResult<Self> {
        let profile = profile.into();
        let reels = ReelGenerator::new(&profile)?;
        let evaluator = SpinEvaluator::new(&profile);
        let state = SessionState {
            balance: profile.starting_balance(),
            bet: profile.default_bet(),
            free_spins: 0,
            phase: SessionPhase::Idle,
            spin_count: 0,
            stats: SessionStats::default(),
        };

        Ok(Self {
            profile,
            reels,
            evaluator,
            state: Mutex::new(state),
            rng: Mutex::new(rng),
        })
    }

    /// Replace the starting balance (e.g. with a persisted one)
    pub fn with_balance(mut self, balance: u64) -> Self {
        self.state.get_mut().balance = balance;
        self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPIN TRANSACTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Play one spin
    pub fn request_spin(&self) -> SessionResult<SpinResult> {
        self.run_spin(None, &NoopObserver)
    }

    /// Play one spin, reporting each phase to `observer`
    pub fn request_spin_with(&self, observer: &dyn SpinObserver) -> SessionResult<SpinResult> {
        self.run_spin(None, observer)
    }

    /// Play one spin on a supplied grid instead of a drawn one.
    ///
    /// Stake, settlement and bonus handling are identical to a normal spin.
    /// The grid is taken as given, so it may hold placements a draw never
    /// produces.
    pub fn request_spin_forced(&self, grid: Grid) -> SessionResult<SpinResult> {
        self.run_spin(Some(grid), &NoopObserver)
    }

    /// Forced spin reporting each phase to `observer`
    pub fn request_spin_forced_with(
        &self,
        grid: Grid,
        observer: &dyn SpinObserver,
    ) -> SessionResult<SpinResult> {
        self.run_spin(Some(grid), observer)
    }

    fn run_spin(&self, forced: Option<Grid>, observer: &dyn SpinObserver) -> SessionResult<SpinResult> {
        let ticket = self.begin_spin()?;
        // Settles on drop if a hook unwinds before settlement
        let mut pending = PendingSpin {
            engine: self,
            ticket: Some(ticket),
            grid: None,
        };
        observer.on_spin_started(ticket.bet, ticket.free_spin);

        let grid = match forced {
            Some(grid) => grid,
            None => self.draw_grid(),
        };
        pending.grid = Some(grid);
        self.state.lock().phase = SessionPhase::Settling;
        observer.on_reels_stopped(&grid);

        let result = pending.settle();
        observer.on_settled(&result);
        Ok(result)
    }

    fn draw_grid(&self) -> Grid {
        let mut rng = self.rng.lock();
        self.reels.draw(&mut *rng)
    }

    /// Check the gate and take the stake; nothing changes on error
    fn begin_spin(&self) -> SessionResult<SpinTicket> {
        let mut state = self.state.lock();
        if state.phase != SessionPhase::Idle {
            return Err(SessionError::SpinInProgress);
        }

        let bet = state.bet;
        let free_spin = state.free_spins > 0;
        if free_spin {
            state.free_spins -= 1;
        } else if state.balance < bet {
            return Err(SessionError::InsufficientFunds {
                balance: state.balance,
                bet,
            });
        } else {
            state.balance -= bet;
        }

        state.phase = SessionPhase::Spinning;
        state.spin_count += 1;
        Ok(SpinTicket {
            spin_id: state.spin_count,
            bet,
            free_spin,
        })
    }

    fn settle(&self, ticket: SpinTicket, grid: Grid) -> SpinResult {
        let eval = self.evaluator.evaluate(&grid, ticket.bet);
        let mut result = SpinResult::from_evaluation(
            ticket.spin_id,
            grid,
            ticket.bet,
            ticket.free_spin,
            eval,
            &self.profile.win_tiers(),
        );

        let mut state = self.state.lock();
        state.balance = state.balance.saturating_add(result.amount);

        if result.bonus_triggered {
            let award = self.profile.free_spins_award();
            state.free_spins = state.free_spins.saturating_add(award);
            result.free_spins_awarded = award;
            log::info!(
                "Bonus triggered on spin #{} ({} bonus symbols): +{} free spins",
                result.spin_id,
                result.bonus_count,
                award
            );
        }

        result.balance = state.balance;
        result.free_spins = state.free_spins;
        state.stats.record(&result);
        state.phase = SessionPhase::Idle;

        log::debug!("Spin settled: {}", result.summary());
        result
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BET & FUNDS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Select a bet: a profile denomination the balance covers, or any
    /// denomination while free spins remain
    pub fn set_bet(&self, amount: u64) -> SessionResult<()> {
        let mut state = self.state.lock();
        if state.phase != SessionPhase::Idle {
            return Err(SessionError::InvalidBet {
                amount,
                reason: BetRejection::SpinInProgress,
            });
        }
        if !self.profile.is_denomination(amount) {
            return Err(SessionError::InvalidBet {
                amount,
                reason: BetRejection::NotADenomination,
            });
        }
        if state.free_spins == 0 && amount > state.balance {
            return Err(SessionError::InvalidBet {
                amount,
                reason: BetRejection::ExceedsBalance,
            });
        }
        state.bet = amount;
        Ok(())
    }

    /// Credit the balance; returns the new balance
    pub fn add_funds(&self, amount: u64) -> u64 {
        let mut state = self.state.lock();
        state.balance = state.balance.saturating_add(amount);
        state.balance
    }

    /// Credit the profile's top-up amount; returns the new balance
    pub fn top_up(&self) -> u64 {
        self.add_funds(self.profile.top_up_amount())
    }

    /// Denominations the current balance can cover
    pub fn affordable_denominations(&self) -> Vec<u64> {
        let balance = self.balance();
        self.profile
            .denominations()
            .iter()
            .copied()
            .filter(|&d| d <= balance)
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn profile(&self) -> &RtpProfile {
        &self.profile
    }

    /// Shared handle to the profile
    pub fn shared_profile(&self) -> Arc<RtpProfile> {
        Arc::clone(&self.profile)
    }

    pub fn balance(&self) -> u64 {
        self.state.lock().balance
    }

    pub fn bet(&self) -> u64 {
        self.state.lock().bet
    }

    /// Remaining free-spin credit
    pub fn free_spins(&self) -> u64 {
        self.state.lock().free_spins
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    pub fn stats(&self) -> SessionStats {
        self.state.lock().stats.clone()
    }

    /// Reset session stats
    pub fn reset_stats(&self) {
        self.state.lock().stats = SessionStats::default();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock();
        SessionSnapshot {
            profile: self.profile.name().to_string(),
            balance: state.balance,
            bet: state.bet,
            free_spins: state.free_spins,
            phase: state.phase,
            spin_count: state.spin_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Symbol::*;
    use std::cell::RefCell;

    fn funded(balance: u64) -> SessionEngine {
        SessionEngine::seeded(RtpProfile::conservative(), 11)
            .unwrap()
            .with_balance(balance)
    }

    fn losing_grid() -> Grid {
        Grid::from_rows([
            [Zeki, Tehno, Sigma, Tino, Cele],
            [Tehno, Cele, Zeki, Sigma, Tino],
            [Sigma, Zeki, Tino, Cele, Tehno],
        ])
    }

    fn bonus_grid() -> Grid {
        Grid::from_rows([
            [Bonus, Zeki, Zarzin, Sigma, Tino],
            [Cele, Tehno, Zeki, Bonus, Zarzin],
            [Tehno, Bonus, Sigma, Zeki, AcoResen],
        ])
    }

    #[test]
    fn test_engine_creation() {
        let engine = SessionEngine::new(RtpProfile::generous()).unwrap();
        assert_eq!(engine.balance(), 1000);
        assert_eq!(engine.bet(), 5);
        assert_eq!(engine.free_spins(), 0);
        assert_eq!(engine.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_sessions_share_one_profile() {
        let profile = Arc::new(RtpProfile::conservative());
        let a = SessionEngine::seeded(Arc::clone(&profile), 1).unwrap();
        let b = SessionEngine::seeded(Arc::clone(&profile), 2).unwrap();
        assert!(Arc::ptr_eq(&a.shared_profile(), &b.shared_profile()));
        assert_eq!(b.profile().name(), "rtp90");
    }

    #[test]
    fn test_paid_spin_debits_and_credits() {
        let engine = funded(100);
        engine.set_bet(10).unwrap();

        let grid = Grid::from_rows([
            [Zeki, Zeki, Zeki, Tehno, Sigma],
            [Tehno, Cele, Sigma, Tino, Zeki],
            [Sigma, Tehno, Tino, Cele, Tehno],
        ]);
        let result = engine.request_spin_forced(grid).unwrap();

        assert_eq!(result.amount, 20);
        assert_eq!(result.balance, 100 - 10 + 20);
        assert_eq!(engine.balance(), 110);
        assert_eq!(result.spin_id, 1);
        assert!(!result.free_spin);
        assert_eq!(engine.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_insufficient_funds_changes_nothing() {
        let engine = funded(4);
        let before = engine.snapshot();

        assert_eq!(
            engine.request_spin(),
            Err(SessionError::InsufficientFunds { balance: 4, bet: 5 })
        );
        assert_eq!(engine.snapshot(), before);
        assert_eq!(engine.stats().total_spins, 0);
    }

    #[test]
    fn test_set_bet_validates_denomination() {
        let engine = funded(1000);
        assert!(engine.set_bet(500).is_ok());
        assert_eq!(engine.bet(), 500);

        assert_eq!(
            engine.set_bet(7),
            Err(SessionError::InvalidBet {
                amount: 7,
                reason: BetRejection::NotADenomination
            })
        );
        assert_eq!(engine.bet(), 500);
    }

    #[test]
    fn test_set_bet_must_fit_balance() {
        let engine = funded(50);
        assert!(engine.set_bet(50).is_ok());
        assert_eq!(
            engine.set_bet(100),
            Err(SessionError::InvalidBet {
                amount: 100,
                reason: BetRejection::ExceedsBalance
            })
        );
        assert_eq!(engine.bet(), 50);

        engine.add_funds(50);
        assert!(engine.set_bet(100).is_ok());
    }

    #[test]
    fn test_set_bet_above_balance_allowed_during_free_spins() {
        let engine = funded(5);
        engine.request_spin_forced(bonus_grid()).unwrap();
        assert_eq!(engine.balance(), 0);
        assert_eq!(engine.free_spins(), 5);

        assert!(engine.set_bet(1000).is_ok());
        let free = engine.request_spin_forced(losing_grid()).unwrap();
        assert!(free.free_spin);
        assert_eq!(free.bet, 1000);
        assert_eq!(free.balance, 0);
    }

    #[test]
    fn test_bonus_on_free_spin_stacks_award() {
        let engine = funded(5);
        engine.request_spin_forced(bonus_grid()).unwrap();
        assert_eq!(engine.free_spins(), 5);

        let again = engine.request_spin_forced(bonus_grid()).unwrap();
        assert!(again.free_spin);
        assert!(again.bonus_triggered);
        assert_eq!(again.free_spins_awarded, 5);
        assert_eq!(again.free_spins, 5 - 1 + 5);
        assert_eq!(engine.balance(), 0);
        assert_eq!(engine.stats().free_spins_awarded, 10);
    }

    struct PanicOnStop;

    impl SpinObserver for PanicOnStop {
        fn on_reels_stopped(&self, _grid: &Grid) {
            panic!("presentation layer failed");
        }
    }

    struct PanicOnStart;

    impl SpinObserver for PanicOnStart {
        fn on_spin_started(&self, _bet: u64, _free_spin: bool) {
            panic!("presentation layer failed");
        }
    }

    #[test]
    fn test_unwinding_hook_still_settles_spin() {
        let engine = funded(100);
        let grid = Grid::from_rows([
            [Zeki, Zeki, Zeki, Tehno, Sigma],
            [Tehno, Cele, Sigma, Tino, Zeki],
            [Sigma, Tehno, Tino, Cele, Tehno],
        ]);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            engine.request_spin_forced_with(grid, &PanicOnStop)
        }));
        assert!(outcome.is_err());

        assert_eq!(engine.phase(), SessionPhase::Idle);
        assert_eq!(engine.balance(), 100 - 5 + 10);
        assert_eq!(engine.stats().total_spins, 1);
        assert!(engine.request_spin().is_ok());
    }

    #[test]
    fn test_unwinding_before_draw_still_settles_spin() {
        let engine = funded(100);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            engine.request_spin_with(&PanicOnStart)
        }));
        assert!(outcome.is_err());

        let stats = engine.stats();
        assert_eq!(engine.phase(), SessionPhase::Idle);
        assert_eq!(stats.total_spins, 1);
        assert_eq!(engine.balance(), 100 - 5 + stats.total_won);
        assert_eq!(engine.request_spin().map(|r| r.spin_id), Ok(2));
    }

    #[test]
    fn test_bonus_awards_free_spins_then_consumes_them() {
        let engine = funded(5);

        let result = engine.request_spin_forced(bonus_grid()).unwrap();
        assert!(result.bonus_triggered);
        assert_eq!(result.free_spins_awarded, 5);
        assert_eq!(engine.free_spins(), 5);
        assert_eq!(engine.balance(), 0);

        // Free spins play without touching the empty balance
        let free = engine.request_spin_forced(losing_grid()).unwrap();
        assert!(free.free_spin);
        assert_eq!(free.balance, 0);
        assert_eq!(engine.free_spins(), 4);
    }

    #[test]
    fn test_funds_and_top_up() {
        let engine = funded(0);
        assert!(engine.affordable_denominations().is_empty());
        assert_eq!(engine.add_funds(30), 30);
        assert_eq!(engine.affordable_denominations(), vec![5, 10, 20]);
        assert_eq!(engine.top_up(), 130);
        assert_eq!(engine.add_funds(u64::MAX), u64::MAX);
    }

    struct PhaseRecorder<'a> {
        engine: &'a SessionEngine,
        seen: RefCell<Vec<SessionPhase>>,
    }

    impl SpinObserver for PhaseRecorder<'_> {
        fn on_spin_started(&self, _bet: u64, _free_spin: bool) {
            self.seen.borrow_mut().push(self.engine.phase());
        }

        fn on_reels_stopped(&self, _grid: &Grid) {
            self.seen.borrow_mut().push(self.engine.phase());
        }

        fn on_settled(&self, _result: &SpinResult) {
            self.seen.borrow_mut().push(self.engine.phase());
        }
    }

    #[test]
    fn test_observer_sees_each_phase() {
        let engine = funded(50);
        let recorder = PhaseRecorder {
            engine: &engine,
            seen: RefCell::new(Vec::new()),
        };
        engine.request_spin_with(&recorder).unwrap();
        assert_eq!(
            recorder.seen.into_inner(),
            vec![SessionPhase::Spinning, SessionPhase::Settling, SessionPhase::Idle]
        );
    }

    #[test]
    fn test_session_stats() {
        let engine = funded(10_000);
        for _ in 0..200 {
            engine.request_spin().unwrap();
        }
        let stats = engine.stats();
        assert_eq!(stats.total_spins, 200);
        assert_eq!(stats.wins + stats.losses, 200);
        assert_eq!(stats.paid_spins + stats.free_spins_played, 200);
        assert_eq!(stats.total_wagered, stats.paid_spins * 5);
        assert!(stats.rtp() >= 0.0);

        engine.reset_stats();
        assert_eq!(engine.stats(), SessionStats::default());
    }
}
