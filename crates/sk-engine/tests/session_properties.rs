//! Session-level properties of the outcome engine
//!
//! - Balance conservation over long seeded runs
//! - Single-winner and anchored-run invariants on drawn grids
//! - Rejection of overlapping requests (re-entrant and cross-thread)
//! - Free spins and persistence through the public API

use std::sync::Barrier;

use sk_engine::{
    BalanceStore, BetRejection, Grid, JsonFileBalanceStore, LineEvaluator, PAYLINES, RtpProfile,
    SessionEngine, SessionError, SessionPhase, SpinObserver, SpinResult, Symbol,
};

fn funded(profile: RtpProfile, seed: u64, balance: u64) -> SessionEngine {
    SessionEngine::seeded(profile, seed)
        .unwrap()
        .with_balance(balance)
}

fn play(engine: &SessionEngine, spins: usize) -> Vec<SpinResult> {
    (0..spins)
        .map(|_| {
            if engine.free_spins() == 0 && engine.balance() < engine.bet() {
                engine.top_up();
            }
            engine.request_spin().unwrap()
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACCOUNTING
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_balance_conservation() {
    let engine = funded(RtpProfile::conservative(), 5, 0);
    engine.top_up();
    engine.set_bet(10).unwrap();

    let mut expected = engine.profile().top_up_amount();
    for _ in 0..3_000 {
        if engine.free_spins() == 0 && engine.balance() < engine.bet() {
            expected += engine.profile().top_up_amount();
            engine.top_up();
        }
        let result = engine.request_spin().unwrap();
        if !result.free_spin {
            expected -= result.bet;
        }
        expected += result.amount;
        assert_eq!(result.balance, expected, "spin #{}", result.spin_id);
    }

    let stats = engine.stats();
    assert_eq!(stats.total_spins, 3_000);
    assert_eq!(engine.balance(), expected);
}

#[test]
fn test_free_spins_never_debit() {
    let engine = funded(RtpProfile::generous(), 77, 1_000);
    let mut previous_balance = engine.balance();

    for result in play(&engine, 5_000) {
        if result.free_spin {
            assert_eq!(result.balance, previous_balance + result.amount);
        }
        previous_balance = result.balance;
    }

    let stats = engine.stats();
    assert_eq!(stats.free_spins_played + stats.paid_spins, 5_000);
    assert_eq!(stats.total_wagered, stats.paid_spins * 5);
    assert!(stats.bonus_triggers > 0);
    assert_eq!(stats.free_spins_awarded, stats.bonus_triggers * 10);
}

#[test]
fn test_bonus_pays_award_through_forced_grid() {
    let engine = funded(RtpProfile::conservative(), 1, 20);
    let grid = Grid::from_rows([
        [Symbol::Bonus, Symbol::Zeki, Symbol::Zarzin, Symbol::Sigma, Symbol::Tino],
        [Symbol::Cele, Symbol::Tehno, Symbol::Zeki, Symbol::Bonus, Symbol::Zarzin],
        [Symbol::Tehno, Symbol::Bonus, Symbol::Sigma, Symbol::Zeki, Symbol::AcoResen],
    ]);

    let result = engine.request_spin_forced(grid).unwrap();
    assert_eq!(result.bonus_count, 3);
    assert_eq!(result.free_spins_awarded, 5);
    assert_eq!(result.free_spins, 5);
    assert_eq!(result.amount, 0);
    assert_eq!(engine.balance(), 15);
}

#[test]
fn test_bonus_awarded_alongside_line_win() {
    let engine = funded(RtpProfile::conservative(), 1, 20);
    let grid = Grid::from_rows([
        [Symbol::Zeki, Symbol::Zeki, Symbol::Zeki, Symbol::Tehno, Symbol::Bonus],
        [Symbol::Tehno, Symbol::Cele, Symbol::Bonus, Symbol::Tino, Symbol::Sigma],
        [Symbol::Sigma, Symbol::Bonus, Symbol::Tino, Symbol::Cele, Symbol::Tehno],
    ]);

    let paid = engine.request_spin_forced(grid).unwrap();
    assert!(!paid.free_spin);
    assert_eq!(paid.payline, Some(0));
    assert_eq!(paid.winning_symbol, Some(Symbol::Zeki));
    assert_eq!(paid.amount, 10);
    assert_eq!(paid.bonus_count, 3);
    assert_eq!(paid.free_spins_awarded, 5);
    assert_eq!(paid.free_spins, 5);
    assert_eq!(paid.balance, 20 - 5 + 10);

    let free = engine.request_spin_forced(grid).unwrap();
    assert!(free.free_spin);
    assert_eq!(free.amount, 10);
    assert_eq!(free.free_spins_awarded, 5);
    assert_eq!(free.free_spins, 5 - 1 + 5);
    assert_eq!(free.balance, 25 + 10);

    let stats = engine.stats();
    assert_eq!(stats.bonus_triggers, 2);
    assert_eq!(stats.free_spins_awarded, 10);
    assert_eq!(stats.total_wagered, 5);
}

#[test]
fn test_bet_above_balance_is_rejected() {
    let engine = funded(RtpProfile::conservative(), 4, 40);
    let before = engine.snapshot();
    assert_eq!(
        engine.set_bet(50),
        Err(SessionError::InvalidBet {
            amount: 50,
            reason: BetRejection::ExceedsBalance
        })
    );
    assert_eq!(engine.snapshot(), before);
    assert!(engine.set_bet(20).is_ok());
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVALUATION INVARIANTS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_single_winner_invariant() {
    let profile = RtpProfile::conservative();
    let lines = LineEvaluator::new(&profile);
    let engine = funded(profile, 31, 0);

    for result in play(&engine, 4_000) {
        let amounts: Vec<u64> = PAYLINES
            .iter()
            .map(|p| lines.evaluate_payline(&result.grid, p, result.bet).amount)
            .collect();
        let max = amounts.iter().copied().max().unwrap_or(0);

        assert_eq!(result.amount, max);
        if max > 0 {
            let first = amounts.iter().position(|&a| a == max);
            assert_eq!(result.payline, first);
        } else {
            assert_eq!(result.payline, None);
            assert!(result.winning_indices.is_empty());
        }
    }
}

#[test]
fn test_anchored_run_invariant() {
    let engine = funded(RtpProfile::generous(), 8, 1_000);

    let mut checked = 0;
    for result in play(&engine, 4_000) {
        let Some(index) = result.payline else {
            continue;
        };
        let Some(symbol) = result.winning_symbol else {
            panic!("winning line without a symbol");
        };
        let cells = PAYLINES[index].cells;
        let run = result.run_length as usize;

        assert!((3..=5).contains(&run));
        assert_eq!(result.winning_indices, cells[..run].to_vec());
        for &cell in &cells[..run] {
            let s = result.grid.get(cell).unwrap();
            assert!(s == symbol || s.is_wild(), "{s} inside a {symbol} run");
        }
        if run < 5 {
            let next = result.grid.get(cells[run]).unwrap();
            assert!(next != symbol && !next.is_wild());
        }
        checked += 1;
    }
    assert!(checked > 100);
}

#[test]
fn test_seeded_sessions_replay() {
    let a = funded(RtpProfile::conservative(), 1234, 500);
    let b = funded(RtpProfile::conservative(), 1234, 500);
    assert_eq!(play(&a, 300), play(&b, 300));
    assert_eq!(a.snapshot(), b.snapshot());
}

// ═══════════════════════════════════════════════════════════════════════════════
// REJECTION
// ═══════════════════════════════════════════════════════════════════════════════

struct Reentrant<'a> {
    engine: &'a SessionEngine,
}

impl SpinObserver for Reentrant<'_> {
    fn on_spin_started(&self, _bet: u64, _free_spin: bool) {
        let before = self.engine.snapshot();
        assert_eq!(self.engine.request_spin(), Err(SessionError::SpinInProgress));
        assert_eq!(self.engine.snapshot(), before);
    }

    fn on_reels_stopped(&self, _grid: &Grid) {
        let before = self.engine.snapshot();
        assert_eq!(before.phase, SessionPhase::Settling);
        assert_eq!(
            self.engine.set_bet(10),
            Err(SessionError::InvalidBet {
                amount: 10,
                reason: BetRejection::SpinInProgress
            })
        );
        assert_eq!(
            self.engine.request_spin_forced(Grid::filled(Symbol::Seven)),
            Err(SessionError::SpinInProgress)
        );
        assert_eq!(self.engine.snapshot(), before);
    }
}

#[test]
fn test_reentrant_requests_are_rejected() {
    let engine = funded(RtpProfile::conservative(), 3, 100);
    let result = engine.request_spin_with(&Reentrant { engine: &engine }).unwrap();

    assert_eq!(result.spin_id, 1);
    assert_eq!(engine.bet(), 5);
    assert_eq!(engine.stats().total_spins, 1);
    assert_eq!(engine.phase(), SessionPhase::Idle);
}

struct Hold<'a> {
    started: &'a Barrier,
    release: &'a Barrier,
}

impl SpinObserver for Hold<'_> {
    fn on_spin_started(&self, _bet: u64, _free_spin: bool) {
        self.started.wait();
        self.release.wait();
    }
}

#[test]
fn test_overlapping_spin_from_another_thread_is_rejected() {
    let engine = funded(RtpProfile::generous(), 9, 1_000);
    let started = Barrier::new(2);
    let release = Barrier::new(2);

    std::thread::scope(|s| {
        let spinner = s.spawn(|| {
            engine.request_spin_with(&Hold {
                started: &started,
                release: &release,
            })
        });

        started.wait();
        let before = engine.snapshot();
        assert_eq!(before.phase, SessionPhase::Spinning);
        assert_eq!(engine.request_spin(), Err(SessionError::SpinInProgress));
        assert!(engine.set_bet(20).is_err());
        assert_eq!(engine.snapshot(), before);
        release.wait();

        assert!(spinner.join().unwrap().is_ok());
    });

    assert_eq!(engine.stats().total_spins, 1);
    assert_eq!(engine.phase(), SessionPhase::Idle);
}

#[test]
fn test_insufficient_funds_is_idempotent() {
    let engine = funded(RtpProfile::conservative(), 2, 1000);
    engine.set_bet(1000).unwrap();
    let lost = engine
        .request_spin_forced(Grid::from_rows([
            [Symbol::Zeki, Symbol::Tehno, Symbol::Sigma, Symbol::Tino, Symbol::Cele],
            [Symbol::Tehno, Symbol::Cele, Symbol::Zeki, Symbol::Sigma, Symbol::Tino],
            [Symbol::Sigma, Symbol::Zeki, Symbol::Tino, Symbol::Cele, Symbol::Tehno],
        ]))
        .unwrap();
    assert_eq!(lost.balance, 0);
    engine.add_funds(999);

    let before = engine.snapshot();
    for _ in 0..3 {
        assert_eq!(
            engine.request_spin(),
            Err(SessionError::InsufficientFunds { balance: 999, bet: 1000 })
        );
    }
    assert_eq!(engine.snapshot(), before);
    assert_eq!(engine.affordable_denominations(), vec![5, 10, 20, 50, 100, 500]);
}

// ═══════════════════════════════════════════════════════════════════════════════
// PERSISTENCE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_balance_survives_sessions() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = JsonFileBalanceStore::new(dir.path().join("balances.json"));
    let profile = RtpProfile::generous();

    let start = store.load_or_start(&profile).unwrap();
    assert_eq!(start, 1000);

    let engine = funded(profile.clone(), 4, start);
    play(&engine, 50);
    store.save(profile.name(), engine.balance()).unwrap();

    let restored = store.load_or_start(&profile).unwrap();
    let next = funded(profile, 5, restored);
    assert_eq!(next.balance(), engine.balance());
    assert_eq!(store.load("rtp90").unwrap(), None);
}
