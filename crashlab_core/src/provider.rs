use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::outcome::{
    audited_multiplier, audited_reveal, stream_multiplier, stream_reveal, Outcome, SeedReveal,
    AUDITED_MIN_MULTIPLIER, DEFAULT_HOUSE_EDGE, STREAM_MIN_MULTIPLIER,
};
use crate::seeds::SeedPair;

/// The registered outcome algorithms. `Bustadice` and `Stake` share the
/// audited two-stage algorithm and differ only in seed-generation defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Bch,
    Bustadice,
    Stake,
}

pub const ALL_PROVIDERS: [Provider; 3] = [Provider::Bch, Provider::Bustadice, Provider::Stake];

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::Bch => "bch",
            Provider::Bustadice => "bustadice",
            Provider::Stake => "stake",
        }
    }

    /// Whether this provider runs the audited two-stage algorithm and thus
    /// needs an `audit_game` server seed.
    pub fn is_audited(self) -> bool {
        !matches!(self, Provider::Bch)
    }

    /// Only the HMAC-stream variant consumes a house edge; the audited
    /// variants bake their margin into the 99/(1-X) curve.
    pub fn uses_house_edge(self) -> bool {
        matches!(self, Provider::Bch)
    }

    pub fn min_multiplier(self) -> f64 {
        if self.is_audited() {
            AUDITED_MIN_MULTIPLIER
        } else {
            STREAM_MIN_MULTIPLIER
        }
    }

    /// Compute the crash multiplier for one round. `house_edge` is ignored
    /// by the audited variants, matching the historical provider contract.
    pub fn multiplier(
        self,
        seeds: &SeedPair,
        nonce: u64,
        house_edge: Option<f64>,
    ) -> CoreResult<f64> {
        match self {
            Provider::Bch => {
                stream_multiplier(seeds, nonce, house_edge.unwrap_or(DEFAULT_HOUSE_EDGE))
            }
            Provider::Bustadice | Provider::Stake => audited_multiplier(seeds, nonce),
        }
    }

    /// Disclose the resolved seed material for external verification.
    pub fn reveal(self, seeds: &SeedPair, nonce: i64) -> CoreResult<SeedReveal> {
        match self {
            Provider::Bch => stream_reveal(seeds),
            Provider::Bustadice | Provider::Stake => audited_reveal(seeds, nonce),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Provider {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_PROVIDERS
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| CoreError::UnknownProvider {
                name: s.to_string(),
                available: ALL_PROVIDERS.map(|p| p.name()).join(", "),
            })
    }
}

/// Explicit provider selection. Held by the caller instead of living in
/// process-wide mutable state; a binary that wants one global selection
/// keeps a single registry instance.
#[derive(Debug, Clone)]
pub struct Registry {
    current: Provider,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(Provider::Bch)
    }
}

impl Registry {
    pub fn new(provider: Provider) -> Self {
        Self { current: provider }
    }

    pub fn set_provider(&mut self, name: &str) -> CoreResult<()> {
        self.current = name.parse()?;
        Ok(())
    }

    pub fn current(&self) -> Provider {
        self.current
    }

    pub fn multiplier(&self, seeds: &SeedPair, nonce: u64, house_edge: Option<f64>) -> CoreResult<f64> {
        self.current.multiplier(seeds, nonce, house_edge)
    }

    /// Signed-nonce entry point preserving the historical contract: a
    /// negative nonce is the introspection signal and yields the resolved
    /// seed material instead of a multiplier. Seeds are resolved explicitly
    /// per call; nothing is cached.
    pub fn outcome(
        &self,
        client_seed: &str,
        server_seed: &str,
        nonce: i64,
        house_edge: Option<f64>,
    ) -> CoreResult<Outcome> {
        let seeds = SeedPair::resolve_or_generate(client_seed, server_seed, self.current)?;
        if nonce < 0 {
            Ok(Outcome::Reveal(self.current.reveal(&seeds, nonce)?))
        } else {
            Ok(Outcome::Multiplier(self.multiplier(
                &seeds,
                nonce as u64,
                house_edge,
            )?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_is_rejected() {
        let mut registry = Registry::default();
        let err = registry.set_provider("dicebot").unwrap_err();
        match err {
            CoreError::UnknownProvider { name, available } => {
                assert_eq!(name, "dicebot");
                assert_eq!(available, "bch, bustadice, stake");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(registry.current(), Provider::Bch);
    }

    #[test]
    fn provider_names_round_trip() {
        for provider in ALL_PROVIDERS {
            assert_eq!(provider.name().parse::<Provider>().unwrap(), provider);
        }
    }

    #[test]
    fn switching_providers_is_isolated() {
        let seeds = SeedPair::new("client-seed", "audit_game").unwrap();
        let mut registry = Registry::default();

        let bch: Vec<f64> = (0..10)
            .map(|n| registry.multiplier(&seeds, n, None).unwrap())
            .collect();

        registry.set_provider("bustadice").unwrap();
        let bustadice: Vec<f64> = (0..10)
            .map(|n| registry.multiplier(&seeds, n, None).unwrap())
            .collect();

        // switching back reproduces the earlier values exactly
        registry.set_provider("bch").unwrap();
        let bch_again: Vec<f64> = (0..10)
            .map(|n| registry.multiplier(&seeds, n, None).unwrap())
            .collect();

        assert_eq!(bch, bch_again);
        assert_ne!(bch, bustadice);
    }

    #[test]
    fn bustadice_and_stake_share_the_algorithm() {
        let seeds = SeedPair::new("client-seed", "audit_game").unwrap();
        for nonce in 0..10 {
            assert_eq!(
                Provider::Bustadice.multiplier(&seeds, nonce, None).unwrap(),
                Provider::Stake.multiplier(&seeds, nonce, None).unwrap()
            );
        }
    }

    #[test]
    fn audited_variants_ignore_house_edge() {
        let seeds = SeedPair::new("client-seed", "audit_game").unwrap();
        for nonce in 0..10 {
            assert_eq!(
                Provider::Stake.multiplier(&seeds, nonce, Some(0.5)).unwrap(),
                Provider::Stake.multiplier(&seeds, nonce, None).unwrap()
            );
        }
    }

    #[test]
    fn negative_nonce_reveals_seed_material() {
        let registry = Registry::new(Provider::Stake);
        let outcome = registry
            .outcome("client-seed", "audit_game", -1, None)
            .unwrap();
        let reveal = match outcome {
            Outcome::Reveal(reveal) => reveal,
            Outcome::Multiplier(m) => panic!("expected reveal, got multiplier {m}"),
        };

        // the disclosed seeds reproduce the real round outcomes
        let seeds = SeedPair::new(reveal.client_seed, reveal.server_seed).unwrap();
        let direct = Provider::Stake.multiplier(&seeds, 5, None).unwrap();
        let via_outcome = registry
            .outcome(&seeds.client, &seeds.server, 5, None)
            .unwrap();
        assert_eq!(via_outcome, Outcome::Multiplier(direct));
    }
}
