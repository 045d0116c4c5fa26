//! Štrakanje terminal front end
//!
//! Usage:
//!   strakanje spin              - Play spins and print each outcome
//!   strakanje simulate          - Measure a profile's return over a long run
//!   strakanje paytable          - Print the value table and paylines
//!   strakanje profiles          - List built-in profiles

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use sk_engine::{
    BalanceStore, JsonFileBalanceStore, PAYLINES, RtpProfile, SessionEngine, SessionError,
    SimulationConfig, SpinResult, simulate,
};

#[derive(Parser)]
#[command(name = "strakanje", about = "Štrakanje 5x3 slot", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play spins
    Spin {
        /// Built-in profile name or path to a .json/.yaml profile
        #[arg(short, long, default_value = "rtp90")]
        profile: String,
        /// Number of spins
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u64,
        /// Bet (must be one of the profile's denominations)
        #[arg(short, long)]
        bet: Option<u64>,
        /// Seed for reproducible play
        #[arg(short, long)]
        seed: Option<u64>,
        /// JSON file the balance is loaded from and saved to
        #[arg(long)]
        balance_file: Option<PathBuf>,
        /// Credit the profile's top-up amount before playing
        #[arg(long)]
        top_up: bool,
        /// Print results as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Simulate a long run and report the measured RTP
    Simulate {
        #[arg(short, long, default_value = "rtp90")]
        profile: String,
        #[arg(short = 'n', long, default_value_t = 100_000)]
        spins: u64,
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
        #[arg(short, long)]
        bet: Option<u64>,
        #[arg(long)]
        json: bool,
    },
    /// Print the value table and payline catalog
    Paytable {
        #[arg(short, long, default_value = "rtp90")]
        profile: String,
    },
    /// List built-in profiles
    Profiles,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Spin {
            profile,
            count,
            bet,
            seed,
            balance_file,
            top_up,
            json,
        } => run_spins(&profile, count, bet, seed, balance_file, top_up, json),
        Commands::Simulate {
            profile,
            spins,
            seed,
            bet,
            json,
        } => run_simulation(&profile, spins, seed, bet, json),
        Commands::Paytable { profile } => print_paytable(&profile),
        Commands::Profiles => list_profiles(),
    }
}

/// Built-in name first, then a profile file
fn resolve_profile(name_or_path: &str) -> Result<RtpProfile> {
    if let Some(profile) = RtpProfile::by_name(name_or_path) {
        return Ok(profile);
    }
    let path = PathBuf::from(name_or_path);
    if !path.exists() {
        bail!(
            "Unknown profile '{}' (built-in: {})",
            name_or_path,
            RtpProfile::BUILTIN.join(", ")
        );
    }
    RtpProfile::from_path(&path)
        .with_context(|| format!("Failed to load profile {}", path.display()))
}

fn run_spins(
    profile: &str,
    count: u64,
    bet: Option<u64>,
    seed: Option<u64>,
    balance_file: Option<PathBuf>,
    top_up: bool,
    json: bool,
) -> Result<()> {
    let profile = resolve_profile(profile)?;
    let store = balance_file.map(JsonFileBalanceStore::new);

    let balance = match &store {
        Some(store) => store
            .load_or_start(&profile)
            .with_context(|| format!("Failed to read {}", store.path().display()))?,
        None => profile.starting_balance(),
    };

    let engine = match seed {
        Some(seed) => SessionEngine::seeded(profile, seed),
        None => SessionEngine::new(profile),
    }
    .context("Invalid profile")?
    .with_balance(balance);

    if top_up {
        engine.top_up();
    }
    if let Some(bet) = bet {
        engine.set_bet(bet)?;
    }

    if !json {
        println!(
            "🎰 {} | balance {} | bet {}\n",
            engine.profile().title(),
            engine.balance(),
            engine.bet()
        );
    }

    for _ in 0..count {
        match engine.request_spin() {
            Ok(result) if json => println!("{}", serde_json::to_string(&result)?),
            Ok(result) => print_result(&result),
            Err(SessionError::InsufficientFunds { balance, bet }) => {
                println!("⚠️  Balance {} does not cover bet {}", balance, bet);
                let affordable = engine.affordable_denominations();
                if !affordable.is_empty() {
                    println!("   Affordable bets: {:?}", affordable);
                }
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(store) = &store {
        store
            .save(engine.profile().name(), engine.balance())
            .with_context(|| format!("Failed to write {}", store.path().display()))?;
    }

    if !json {
        let stats = engine.stats();
        println!(
            "\n✅ {} spins | won {} | wagered {} | balance {} | free spins {}",
            stats.total_spins,
            stats.total_won,
            stats.total_wagered,
            engine.balance(),
            engine.free_spins()
        );
    }
    Ok(())
}

fn print_result(result: &SpinResult) {
    let stake = if result.free_spin { "free spin" } else { "paid" };
    println!("Spin #{} ({}, bet {})", result.spin_id, stake, result.bet);
    print!("{}", result.grid);

    match (&result.payline_name, result.winning_symbol, result.win_tier) {
        (Some(line), Some(symbol), Some(tier)) => println!(
            "  💰 {} {}: {} x{} on {} (positions {:?})",
            tier.display_name(),
            result.amount,
            result.run_length,
            symbol,
            line,
            result.winning_indices
        ),
        _ => println!("  No win"),
    }
    if result.bonus_triggered {
        println!(
            "  🎁 {} bonus symbols: +{} free spins",
            result.bonus_count, result.free_spins_awarded
        );
    }
    println!("  Balance {} | free spins {}\n", result.balance, result.free_spins);
}

fn run_simulation(profile: &str, spins: u64, seed: u64, bet: Option<u64>, json: bool) -> Result<()> {
    let profile = resolve_profile(profile)?;
    let name = profile.name().to_string();
    let config = SimulationConfig { spins, seed, bet };

    let report = simulate(profile, &config).with_context(|| format!("Simulation of '{}' failed", name))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let stats = &report.stats;
    println!("📊 {} | {} spins | seed {} | bet {}", report.profile, stats.total_spins, report.seed, report.bet);
    println!("  RTP:            {:.2}%", report.rtp);
    println!("  Hit rate:       {:.2}%", report.hit_rate);
    println!("  Wagered / won:  {} / {}", stats.total_wagered, stats.total_won);
    println!("  Free spins:     {} played, {} awarded", stats.free_spins_played, stats.free_spins_awarded);
    println!("  Bonus triggers: {}", stats.bonus_triggers);
    println!(
        "  Big / huge / max wins: {} / {} / {}",
        stats.notable_wins, stats.huge_wins, stats.max_wins
    );
    println!("  Max win ratio:  {:.1}x", stats.max_win_ratio);
    println!("  Funds added:    {}", report.funds_added);
    Ok(())
}

fn print_paytable(profile: &str) -> Result<()> {
    let profile = resolve_profile(profile)?;
    let m = profile.multipliers();

    println!("🎰 {} ({})", profile.title(), profile.name());
    println!("  Multipliers: 3 → x1, 4 → x{}, 5 → x{}", m.four, m.five);
    println!("  Bonus: {}+ anywhere → {} free spins\n", profile.scatter_trigger(), profile.free_spins_award());

    println!("  {:<12} {:>7} {:>7} {:>7}", "Symbol", "3x", "4x", "5x");
    for row in profile.paytable_rows() {
        println!(
            "  {:<12} {:>7} {:>7} {:>7}",
            row.symbol.id(),
            row.pays[0],
            row.pays[1],
            row.pays[2]
        );
    }

    println!("\n  Paylines:");
    for line in &PAYLINES {
        println!("  {:>2}. {:<18} {:?}", line.index + 1, line.name, line.cells);
    }
    println!("\n  Bets: {:?}", profile.denominations());
    Ok(())
}

fn list_profiles() -> Result<()> {
    for name in RtpProfile::BUILTIN {
        let Some(profile) = RtpProfile::by_name(name) else {
            continue;
        };
        println!(
            "  {:<6} {:<20} start {:>5} | top-up {:>5} | {} free spins",
            profile.name(),
            profile.title(),
            profile.starting_balance(),
            profile.top_up_amount(),
            profile.free_spins_award()
        );
    }
    Ok(())
}
