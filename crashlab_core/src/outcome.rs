use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::CoreResult;
use crate::seeds::{AuditedSeeds, SeedPair};

// Deterministic provably-fair crash point derivation.
// server_seed (secret) + client_seed + nonce -> HMAC-SHA256 -> multiplier.

pub type HmacSha256 = Hmac<Sha256>;

/// House edge applied by the HMAC-stream variant when none is given.
pub const DEFAULT_HOUSE_EDGE: f64 = 0.02;

/// Floor of the HMAC-stream multiplier.
pub const STREAM_MIN_MULTIPLIER: f64 = 1.0;

/// Floor of the audited two-stage multiplier.
pub const AUDITED_MIN_MULTIPLIER: f64 = 1.01;

fn hmac_hex(key: &str, message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC key");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Unbounded deterministic byte stream: HMAC-SHA256 digests of
/// `client:nonce:round` for round = 0, 1, 2, ... concatenated.
pub struct HmacByteStream<'a> {
    seeds: &'a SeedPair,
    nonce: u64,
    round: u64,
    buffer: [u8; 32],
    cursor: usize,
}

impl<'a> HmacByteStream<'a> {
    pub fn new(seeds: &'a SeedPair, nonce: u64) -> Self {
        let mut stream = Self {
            seeds,
            nonce,
            round: 0,
            buffer: [0u8; 32],
            cursor: 0,
        };
        stream.refill();
        stream
    }

    fn refill(&mut self) {
        let mut mac = HmacSha256::new_from_slice(self.seeds.server.as_bytes()).expect("HMAC key");
        let msg = format!("{}:{}:{}", self.seeds.client, self.nonce, self.round);
        mac.update(msg.as_bytes());
        self.buffer.copy_from_slice(&mac.finalize().into_bytes());
        self.cursor = 0;
        self.round += 1;
    }

    pub fn next_byte(&mut self) -> u8 {
        if self.cursor == self.buffer.len() {
            self.refill();
        }
        let b = self.buffer[self.cursor];
        self.cursor += 1;
        b
    }

    /// Fold the next 4 bytes into a fraction in [0, 1):
    /// sum of byte[i] / 256^(i+1), big-endian weighting.
    pub fn next_float(&mut self) -> f64 {
        let mut float = 0.0;
        let mut divider = 1.0;
        for _ in 0..4 {
            divider *= 256.0;
            float += self.next_byte() as f64 / divider;
        }
        float
    }
}

/// HMAC-stream crash point. Multiplier is floored to 2 decimals and never
/// drops below 1.00.
pub fn stream_multiplier(seeds: &SeedPair, nonce: u64, house_edge: f64) -> CoreResult<f64> {
    seeds.validate()?;
    let float = HmacByteStream::new(seeds, nonce).next_float();

    let m = 100_000_000.0;
    let n = (float * m).floor() + 1.0;
    let crash_point = ((m / n) * (1.0 - house_edge)).max(STREAM_MIN_MULTIPLIER);
    Ok((crash_point * 100.0).floor() / 100.0)
}

fn audited_hashes(seeds: &SeedPair, audited: &AuditedSeeds, nonce: i64) -> (String, String) {
    let wager_hash = hmac_hex(&audited.audit, &nonce.to_string());
    let key = format!("{}|{}|{}", audited.game, seeds.client, nonce);
    let hash = hmac_hex(&key, &wager_hash);
    (wager_hash, hash)
}

/// Audited two-stage crash point: a wager hash keyed by the audit seed feeds
/// a second HMAC keyed by game seed, client seed and nonce. The first 13 hex
/// characters map to X in [0, 1) and the multiplier is floor(99/(1-X))/100,
/// floored at 1.01. Requires an `audit_game` server seed.
pub fn audited_multiplier(seeds: &SeedPair, nonce: u64) -> CoreResult<f64> {
    seeds.validate()?;
    let audited = AuditedSeeds::parse(&seeds.server)?;
    let (_, hash) = audited_hashes(seeds, &audited, nonce as i64);

    // 13 hex chars = 52 bits, exact in an f64 mantissa
    let v = u64::from_str_radix(&hash[..13], 16).expect("13 hex chars");
    let x = v as f64 / 2f64.powi(52);
    let multiplier = (99.0 / (1.0 - x)).floor() / 100.0;
    Ok(if multiplier <= 1.0 {
        AUDITED_MIN_MULTIPLIER
    } else {
        multiplier
    })
}

/// Resolved seed material disclosed for third-party verification. The
/// audit/game split and intermediate hashes are only present for the audited
/// variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedReveal {
    pub client_seed: String,
    pub server_seed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_seed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_seed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wager_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

pub fn stream_reveal(seeds: &SeedPair) -> CoreResult<SeedReveal> {
    seeds.validate()?;
    Ok(SeedReveal {
        client_seed: seeds.client.clone(),
        server_seed: seeds.server.clone(),
        audit_seed: None,
        game_seed: None,
        wager_hash: None,
        hash: None,
    })
}

pub fn audited_reveal(seeds: &SeedPair, nonce: i64) -> CoreResult<SeedReveal> {
    seeds.validate()?;
    let audited = AuditedSeeds::parse(&seeds.server)?;
    let (wager_hash, hash) = audited_hashes(seeds, &audited, nonce);
    Ok(SeedReveal {
        client_seed: seeds.client.clone(),
        server_seed: seeds.server.clone(),
        audit_seed: Some(audited.audit),
        game_seed: Some(audited.game),
        wager_hash: Some(wager_hash),
        hash: Some(hash),
    })
}

/// Result of the signed-nonce entry point: a real round yields a multiplier,
/// a negative nonce yields the seed material instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Multiplier(f64),
    Reveal(SeedReveal),
}
