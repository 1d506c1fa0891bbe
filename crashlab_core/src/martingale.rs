use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::provider::Registry;
use crate::seeds::SeedPair;
use crate::session::{
    RoundOutcome, SessionState, SimulationParams, SimulationRecord, StopReason,
};

/// Hard cap on the one-shot geometric search; bounds an otherwise
/// unbounded loop.
pub const MAX_UNTIL_WIN_ROUNDS: u32 = 10_000;

/// Round to 2 decimals, the resolution of every recorded monetary value.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Source of crash multipliers for a simulation. The registry is the real
/// implementation; tests script outcomes through this seam.
pub trait MultiplierSource {
    fn multiplier(&self, seeds: &SeedPair, nonce: u64) -> CoreResult<f64>;
}

impl MultiplierSource for Registry {
    fn multiplier(&self, seeds: &SeedPair, nonce: u64) -> CoreResult<f64> {
        Registry::multiplier(self, seeds, nonce, None)
    }
}

/// Run a bounded martingale sequence against a loaded session. The bet
/// doubles (or scales by `bet_multiplier`) after each loss and resets after
/// a win; running out of balance is a terminal state, not an error. The
/// record is appended to the session history and the nonce cursor advances
/// by exactly the rounds actually played. Caller persists the state.
pub fn run_session<S: MultiplierSource>(
    state: &mut SessionState,
    source: &S,
    params: &SimulationParams,
) -> CoreResult<SimulationRecord> {
    let seeds = state.seed_pair();
    let previous_cumulative: f64 = state.history.iter().map(|r| r.total_profit).sum();

    let start_nonce = state.nonce;
    let starting_balance = state.balance;
    let mut outcomes = Vec::new();
    let mut current_bet = params.initial_bet;
    let mut total_profit = 0.0;
    let mut wins = 0;
    let mut losses = 0;
    let mut stop_reason = StopReason::Completed;

    for round in 1..=params.number_of_bets {
        let bet_amount = current_bet;
        if state.balance < bet_amount {
            stop_reason = StopReason::InsufficientBalance;
            break;
        }

        let multiplier = source.multiplier(&seeds, state.nonce)?;
        let won = multiplier >= params.target_multiplier;

        let payout = if won { bet_amount * multiplier } else { 0.0 };
        let profit = if won { payout - bet_amount } else { -bet_amount };
        if won {
            current_bet = params.initial_bet;
            wins += 1;
        } else {
            current_bet *= params.bet_multiplier;
            losses += 1;
        }

        state.balance += profit;
        outcomes.push(RoundOutcome {
            round,
            nonce: state.nonce,
            bet_amount: round2(bet_amount),
            multiplier: round2(multiplier),
            target_multiplier: round2(params.target_multiplier),
            won,
            payout: round2(payout),
            profit: round2(profit),
            balance: round2(state.balance),
        });
        state.nonce += 1;
        total_profit += profit;

        if params.stop_on_net_win && won && total_profit > 0.0 {
            stop_reason = StopReason::NetWin;
            break;
        }
    }

    let cumulative_profit = round2(previous_cumulative + total_profit);
    let record = SimulationRecord {
        params: params.clone(),
        outcomes,
        start_nonce,
        final_nonce: state.nonce,
        total_profit: round2(total_profit),
        wins,
        losses,
        starting_balance: round2(starting_balance),
        final_balance: round2(state.balance),
        cumulative_profit,
        stop_reason,
        timestamp: Utc::now(),
    };

    state.cumulative_profit = cumulative_profit;
    state.history.push(record.clone());
    Ok(record)
}

/// Parameters of the one-shot geometric search: bet a, then a*x, a*x^2, ...
/// until the multiplier reaches the target.
#[derive(Debug, Clone, PartialEq)]
pub struct UntilWinParams {
    pub target_multiplier: f64,
    pub bet_multiplier: f64,
    pub initial_bet: f64,
    pub starting_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UntilWinOutcome {
    pub won: bool,
    pub rounds_played: u32,
    pub total_wagered: f64,
    pub win_bet_amount: f64,
    pub payout: f64,
    pub profit: f64,
    pub final_balance: f64,
    /// Multiplier of the final round played, winning or not.
    pub last_multiplier: f64,
    /// True when the game ended because the balance ran out.
    pub game_over: bool,
    pub client_seed: String,
    pub server_seed: String,
}

/// Loop with geometrically growing bets until the crash multiplier reaches
/// the target, the next bet cannot be covered, or the hard round cap hits.
pub fn simulate_until_win<S: MultiplierSource>(
    source: &S,
    seeds: &SeedPair,
    params: &UntilWinParams,
) -> CoreResult<UntilWinOutcome> {
    let mut balance = params.starting_balance;
    let mut total_wagered = 0.0;
    let mut rounds_played = 0;
    let mut last_bet = 0.0;
    let mut last_multiplier = 0.0;
    let mut won = false;

    let mut round: u32 = 1;
    loop {
        let bet_amount = params.initial_bet * params.bet_multiplier.powi(round as i32 - 1);
        if balance - bet_amount <= 0.0 {
            break;
        }

        let multiplier = source.multiplier(seeds, round as u64)?;
        balance -= bet_amount;
        total_wagered += bet_amount;
        last_bet = bet_amount;
        last_multiplier = multiplier;
        rounds_played += 1;

        if multiplier >= params.target_multiplier {
            balance += bet_amount * multiplier;
            won = true;
            break;
        }

        round += 1;
        if round >= MAX_UNTIL_WIN_ROUNDS || balance <= 0.0 {
            break;
        }
    }

    Ok(UntilWinOutcome {
        won,
        rounds_played,
        total_wagered: round2(total_wagered),
        win_bet_amount: round2(last_bet),
        payout: round2(last_bet * last_multiplier),
        profit: round2(balance - params.starting_balance),
        final_balance: round2(balance),
        last_multiplier,
        game_over: balance <= 0.0,
        client_seed: seeds.client.clone(),
        server_seed: seeds.server.clone(),
    })
}

/// Closed-form profit of a martingale run that wins on bet `w`: totals of
/// the geometric series a + ax + ... + ax^(w-1), the winning bet itself,
/// its payout at multiplier `m`, and the net profit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitBreakdown {
    pub total_bets: f64,
    pub win_bet_amount: f64,
    pub payout: f64,
    pub profit: f64,
}

pub fn calculate_profit(w: u32, m: f64, x: f64, a: f64) -> ProfitBreakdown {
    let total_bets = if (x - 1.0).abs() < f64::EPSILON {
        a * w as f64
    } else {
        a * (1.0 - x.powi(w as i32)) / (1.0 - x)
    };
    let win_bet_amount = a * x.powi(w as i32 - 1);
    let payout = win_bet_amount * m;
    ProfitBreakdown {
        total_bets: round2(total_bets),
        win_bet_amount: round2(win_bet_amount),
        payout: round2(payout),
        profit: round2(payout - total_bets),
    }
}
