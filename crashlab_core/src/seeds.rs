use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::provider::Provider;

/// Length of generated seed strings, matching the alphanumeric seeds the
/// verification tooling expects.
pub const SEED_LEN: usize = 32;

/// A fixed (client, server) seed pair. Immutable for a session's lifetime;
/// the server seed is the HMAC key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedPair {
    pub client: String,
    pub server: String,
}

impl SeedPair {
    pub fn new(client: impl Into<String>, server: impl Into<String>) -> CoreResult<Self> {
        let pair = Self {
            client: client.into(),
            server: server.into(),
        };
        pair.validate()?;
        Ok(pair)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.client.is_empty() {
            return Err(CoreError::InvalidSeed("client seed is empty".into()));
        }
        if self.server.is_empty() {
            return Err(CoreError::InvalidSeed("server seed is empty".into()));
        }
        Ok(())
    }

    /// Generate a fresh random pair in the format the given provider expects.
    /// Audited providers require an `audit_game` server seed.
    pub fn generate(provider: Provider) -> Self {
        let server = if provider.is_audited() {
            format!("{}_{}", random_string(SEED_LEN / 2), random_string(SEED_LEN / 2))
        } else {
            random_string(SEED_LEN)
        };
        Self {
            client: random_string(SEED_LEN),
            server,
        }
    }

    /// Explicit seed resolution: use the supplied seeds when both are given,
    /// generate a fresh pair when both are absent. A half-supplied pair is
    /// rejected rather than silently completed.
    pub fn resolve_or_generate(client: &str, server: &str, provider: Provider) -> CoreResult<Self> {
        if client.is_empty() && server.is_empty() {
            return Ok(Self::generate(provider));
        }
        Self::new(client, server)
    }
}

/// The audit/game split required by the audited two-stage providers.
/// The server seed must carry a `_` separator with non-empty halves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditedSeeds {
    pub audit: String,
    pub game: String,
}

impl AuditedSeeds {
    pub fn parse(server_seed: &str) -> CoreResult<Self> {
        let mut parts = server_seed.split('_').filter(|p| !p.is_empty());
        match (parts.next(), parts.next()) {
            (Some(audit), Some(game)) => Ok(Self {
                audit: audit.to_string(),
                game: game.to_string(),
            }),
            _ => Err(CoreError::InvalidSeed(format!(
                "audited providers need a server seed in audit_game format, got {server_seed:?}"
            ))),
        }
    }
}

pub fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
