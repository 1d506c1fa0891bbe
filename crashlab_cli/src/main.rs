use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crashlab_core::{
    calculate_profit, generate_series, run_session, simulate_until_win, Provider, Registry,
    SeedPair, SeriesAnalysis, SessionStore, SimulationParams, UntilWinParams,
    DEFAULT_STARTING_BALANCE,
};

#[derive(Parser)]
#[command(name = "crashlab-cli", about = "Provably-fair crash game sessions and simulations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Session state file
    #[arg(long, env = "CRASHLAB_SESSION", default_value = "crashlab-session.json")]
    session: PathBuf,
    /// Crypto provider: bch, bustadice or stake
    #[arg(long, env = "CRASHLAB_PROVIDER", default_value = "bch")]
    provider: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a session with fresh seeds and a starting balance
    Init {
        #[arg(default_value_t = DEFAULT_STARTING_BALANCE)]
        starting_balance: f64,
    },
    /// Continue the session with a martingale run
    Run {
        target_multiplier: f64,
        initial_bet: f64,
        bet_multiplier: f64,
        number_of_bets: u32,
        /// Keep betting through net-positive wins until the bet count runs out
        #[arg(long)]
        no_stop_on_net_win: bool,
    },
    /// One-shot simulation with fresh seeds: escalate geometrically until a win
    UntilWin {
        target_multiplier: f64,
        bet_multiplier: f64,
        initial_bet: f64,
        #[arg(default_value_t = DEFAULT_STARTING_BALANCE)]
        starting_balance: f64,
    },
    /// Closed-form martingale profit for a win on bet w
    Profit {
        w: u32,
        target_multiplier: f64,
        bet_multiplier: f64,
        initial_bet: f64,
    },
    /// Show the current session state and history
    View,
    /// Delete the session state
    Reset,
    /// Generate an outcome series, analyze it and export CSV
    Generate {
        rounds: u32,
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long)]
        client_seed: Option<String>,
        #[arg(long)]
        server_seed: Option<String>,
        /// CSV output path; defaults to a timestamped file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Compare all providers over the same seeds
    Compare {
        rounds: u32,
        #[arg(long)]
        client_seed: Option<String>,
        #[arg(long)]
        server_seed: Option<String>,
    },
}

fn resolve_seeds(
    client: Option<String>,
    server: Option<String>,
    provider: Provider,
) -> anyhow::Result<SeedPair> {
    Ok(match (client, server) {
        (Some(c), Some(s)) => SeedPair::new(c, s)?,
        (None, None) => SeedPair::generate(provider),
        _ => anyhow::bail!("supply both --client-seed and --server-seed, or neither"),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let provider: Provider = cli.provider.parse()?;
    let registry = Registry::new(provider);
    let store = SessionStore::new(&cli.session);

    match cli.command {
        Commands::Init { starting_balance } => {
            anyhow::ensure!(
                starting_balance >= 0.0,
                "starting balance must be non-negative"
            );
            let state = store.init(starting_balance, provider)?;
            println!("Game session initialized successfully!");
            println!("Client Seed: {}", state.client_seed);
            println!("Server Seed: {}", state.server_seed);
            println!("Initial Nonce: {}", state.nonce);
            println!("Starting Balance: {}", state.starting_balance);
            println!("Game state saved to: {}", store.path().display());
        }
        Commands::Run {
            target_multiplier,
            initial_bet,
            bet_multiplier,
            number_of_bets,
            no_stop_on_net_win,
        } => {
            let mut state = store.load()?;
            let mut params =
                SimulationParams::new(target_multiplier, initial_bet, bet_multiplier, number_of_bets);
            params.stop_on_net_win = !no_stop_on_net_win;

            let record = run_session(&mut state, &registry, &params)?;
            store.save(&state)?;

            println!("Simulation completed ({:?})", record.stop_reason);
            println!("Rounds Played: {}", record.outcomes.len());
            println!("Wins: {}", record.wins);
            println!("Losses: {}", record.losses);
            println!("Starting Balance: {:.2}", record.starting_balance);
            println!("Final Balance: {:.2}", record.final_balance);
            println!("Total Profit: {:.2}", record.total_profit);
            println!("Cumulative Profit: {:.2}", record.cumulative_profit);
            println!("Final Nonce: {}", record.final_nonce);
        }
        Commands::UntilWin {
            target_multiplier,
            bet_multiplier,
            initial_bet,
            starting_balance,
        } => {
            let seeds = SeedPair::generate(provider);
            let params = UntilWinParams {
                target_multiplier,
                bet_multiplier,
                initial_bet,
                starting_balance,
            };
            let outcome = simulate_until_win(&registry, &seeds, &params)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Profit {
            w,
            target_multiplier,
            bet_multiplier,
            initial_bet,
        } => {
            let breakdown = calculate_profit(w, target_multiplier, bet_multiplier, initial_bet);
            println!("{}", serde_json::to_string_pretty(&breakdown)?);
        }
        Commands::View => {
            let state = store.load()?;
            println!("Client Seed: {}", state.client_seed);
            println!("Server Seed: {}", state.server_seed);
            println!("Created At: {}", state.created_at.to_rfc3339());
            println!("Current Nonce: {}", state.nonce);
            println!("Balance: {:.2}", state.balance);
            println!("Starting Balance: {:.2}", state.starting_balance);
            println!("Cumulative Profit: {:.2}", state.cumulative_profit);
            println!("Simulations Run: {}", state.history.len());
            for (i, record) in state.history.iter().enumerate() {
                println!(
                    "#{:>3} {} target={}x bets={} rounds={} profit={:.2} balance={:.2}",
                    i + 1,
                    record.timestamp.to_rfc3339(),
                    record.params.target_multiplier,
                    record.params.number_of_bets,
                    record.outcomes.len(),
                    record.total_profit,
                    record.final_balance
                );
            }
        }
        Commands::Reset => {
            store.reset()?;
            println!("Session state removed: {}", store.path().display());
        }
        Commands::Generate {
            rounds,
            threshold,
            client_seed,
            server_seed,
            csv,
        } => {
            anyhow::ensure!(rounds > 0, "rounds must be a positive integer");
            let seeds = resolve_seeds(client_seed, server_seed, provider)?;

            println!("Using crypto provider: {}", registry.current());
            println!("Generating outcomes for {rounds} rounds");
            println!("Client Seed: {}", seeds.client);
            println!("Server Seed: {}", seeds.server);

            let series = generate_series(&registry, &seeds, rounds)?;
            for point in &series {
                println!("Round {}: {}x", point.round, point.multiplier);
            }

            let path = csv.unwrap_or_else(|| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S");
                PathBuf::from(format!("outcomes-{ts}.csv"))
            });
            let mut wtr = csv::Writer::from_path(&path)?;
            wtr.write_record(["Round", "Multiplier"])?;
            for point in &series {
                wtr.write_record([point.round.to_string(), point.multiplier.to_string()])?;
            }
            wtr.flush()?;
            println!("\nOutcomes saved to {}", path.display());

            let analysis = SeriesAnalysis::analyze(&series, threshold);
            if let Some(highest) = analysis.highest {
                println!(
                    "\nHighest outcome: Round {} with {}x",
                    highest.round, highest.multiplier
                );
            }
            println!("\nTop {} highest outcomes:", analysis.top.len());
            for point in &analysis.top {
                println!("Round {}: {}x", point.round, point.multiplier);
            }
            if let (Some(t), Some(runs)) = (threshold, analysis.run_lengths) {
                println!("\nRun lengths below {t}:");
                for (i, run) in runs.iter().enumerate() {
                    if *run == -1 {
                        println!("Run {}: X", i + 1);
                    } else {
                        println!("Run {}: {} rounds", i + 1, run);
                    }
                }
            }
        }
        Commands::Compare {
            rounds,
            client_seed,
            server_seed,
        } => {
            anyhow::ensure!(rounds > 0, "rounds must be a positive integer");
            // audited providers need the underscore seed format
            let seeds = resolve_seeds(client_seed, server_seed, Provider::Bustadice)?;
            println!(
                "Generating {rounds} outcomes for client seed: {}, server seed: {}\n",
                seeds.client, seeds.server
            );

            println!("| Round | Bch | Bustadice | Stake |");
            println!("|-------|-----|-----------|-------|");
            let mut totals = [0.0f64; 3];
            let mut highest = [0.0f64; 3];
            let mut wins = [0u32; 3];
            for nonce in 0..rounds as u64 {
                let mut row = Vec::with_capacity(3);
                for (i, provider) in crashlab_core::ALL_PROVIDERS.into_iter().enumerate() {
                    let m = provider.multiplier(&seeds, nonce, None)?;
                    totals[i] += m;
                    if m > highest[i] {
                        highest[i] = m;
                    }
                    if m >= 2.0 {
                        wins[i] += 1;
                    }
                    row.push(format!("{m:.2}x"));
                }
                println!("| {} | {} | {} | {} |", nonce + 1, row[0], row[1], row[2]);
            }

            println!("\nComparison Summary:");
            println!("====================");
            for (i, provider) in crashlab_core::ALL_PROVIDERS.into_iter().enumerate() {
                println!(
                    "{} - Avg: {:.2}x, Highest: {:.2}x, Wins (>=2x): {}/{}",
                    provider,
                    totals[i] / rounds as f64,
                    highest[i],
                    wins[i],
                    rounds
                );
            }
        }
    }

    Ok(())
}
