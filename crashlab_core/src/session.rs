use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::provider::Provider;
use crate::seeds::SeedPair;

pub const DEFAULT_STARTING_BALANCE: f64 = 1000.0;

/// Parameters of one martingale simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub target_multiplier: f64,
    pub initial_bet: f64,
    pub bet_multiplier: f64,
    pub number_of_bets: u32,
    /// Stop as soon as a winning round turns the running profit positive.
    #[serde(default = "default_stop_on_net_win")]
    pub stop_on_net_win: bool,
}

fn default_stop_on_net_win() -> bool {
    true
}

impl SimulationParams {
    pub fn new(target_multiplier: f64, initial_bet: f64, bet_multiplier: f64, number_of_bets: u32) -> Self {
        Self {
            target_multiplier,
            initial_bet,
            bet_multiplier,
            number_of_bets,
            stop_on_net_win: true,
        }
    }
}

/// One settled round. All monetary fields are rounded to 2 decimals at the
/// moment of recording; historical records are frozen snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub round: u32,
    pub nonce: u64,
    pub bet_amount: f64,
    pub multiplier: f64,
    pub target_multiplier: f64,
    pub won: bool,
    pub payout: f64,
    pub profit: f64,
    pub balance: f64,
}

/// Why a simulation run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// All requested bets were placed.
    Completed,
    /// The next bet could not be covered; a normal terminal state.
    InsufficientBalance,
    /// A win turned the running profit positive.
    NetWin,
}

/// Immutable record of one completed simulation, appended to session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub params: SimulationParams,
    pub outcomes: Vec<RoundOutcome>,
    pub start_nonce: u64,
    pub final_nonce: u64,
    pub total_profit: f64,
    pub wins: u32,
    pub losses: u32,
    pub starting_balance: f64,
    pub final_balance: f64,
    pub cumulative_profit: f64,
    pub stop_reason: StopReason,
    pub timestamp: DateTime<Utc>,
}

/// Persisted game session: fixed seeds, nonce cursor, balance and history.
/// Single-writer; mutation is always load -> mutate -> save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub client_seed: String,
    pub server_seed: String,
    pub nonce: u64,
    pub balance: f64,
    pub starting_balance: f64,
    pub created_at: DateTime<Utc>,
    pub cumulative_profit: f64,
    pub history: Vec<SimulationRecord>,
}

impl SessionState {
    pub fn seed_pair(&self) -> SeedPair {
        SeedPair {
            client: self.client_seed.clone(),
            server: self.server_seed.clone(),
        }
    }
}

/// File-backed session store. The on-disk shape is pretty-printed JSON;
/// no other system reads it, so the format is an implementation detail.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a fresh session with newly generated seeds and persist it.
    pub fn init(&self, starting_balance: f64, provider: Provider) -> CoreResult<SessionState> {
        let seeds = SeedPair::generate(provider);
        let state = SessionState {
            client_seed: seeds.client,
            server_seed: seeds.server,
            nonce: 0,
            balance: starting_balance,
            starting_balance,
            created_at: Utc::now(),
            cumulative_profit: 0.0,
            history: Vec::new(),
        };
        self.save(&state)?;
        Ok(state)
    }

    pub fn load(&self) -> CoreResult<SessionState> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::SessionNotFound(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, state: &SessionState) -> CoreResult<()> {
        let data = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    /// Delete the persisted session. Idempotent.
    pub fn reset(&self) -> CoreResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        (dir, store)
    }

    #[test]
    fn init_then_load_round_trips() {
        let (_dir, store) = temp_store();
        let state = store.init(500.0, Provider::Bch).unwrap();
        assert_eq!(state.nonce, 0);
        assert_eq!(state.balance, 500.0);
        assert!(state.history.is_empty());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn load_before_init_fails_clearly() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            store.load(),
            Err(CoreError::SessionNotFound(_))
        ));
    }

    #[test]
    fn reset_is_idempotent() {
        let (_dir, store) = temp_store();
        store.init(100.0, Provider::Bch).unwrap();
        store.reset().unwrap();
        store.reset().unwrap();
        assert!(store.load().is_err());
    }

    #[test]
    fn init_for_audited_provider_writes_splittable_seed() {
        let (_dir, store) = temp_store();
        let state = store.init(100.0, Provider::Stake).unwrap();
        assert!(state.server_seed.contains('_'));
    }
}
