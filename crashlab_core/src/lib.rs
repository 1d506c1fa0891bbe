pub mod error;
pub mod martingale;
pub mod outcome;
pub mod provider;
pub mod seeds;
pub mod series;
pub mod session;

pub use crate::error::{CoreError, CoreResult};
pub use crate::martingale::{
    calculate_profit, run_session, simulate_until_win, MultiplierSource, ProfitBreakdown,
    UntilWinOutcome, UntilWinParams, MAX_UNTIL_WIN_ROUNDS,
};
pub use crate::outcome::{Outcome, SeedReveal, DEFAULT_HOUSE_EDGE};
pub use crate::provider::{Provider, Registry, ALL_PROVIDERS};
pub use crate::seeds::{random_string, AuditedSeeds, SeedPair};
pub use crate::series::{generate_series, run_lengths, SeriesAnalysis, SeriesPoint};
pub use crate::session::{
    RoundOutcome, SessionState, SessionStore, SimulationParams, SimulationRecord, StopReason,
    DEFAULT_STARTING_BALANCE,
};
