use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlayRequest {
    pub client_seed: String,
    pub server_seed: String,
    pub nonce: u64,
    pub bet_amount: f64,
    pub target_multiplier: f64,
    /// Provider name; the server default applies when absent.
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlayResponse {
    pub multiplier: f64,
    pub won: bool,
    pub profit: f64,
    pub client_seed: String,
    pub server_seed: String,
    pub nonce: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SeedsRequest {
    pub client_seed: String,
    pub server_seed: String,
    pub nonce: i64,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Disclosed seed material; audit fields are present only for the audited
/// providers.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SeedInfo {
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

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SeedsResponse {
    pub seed_info: SeedInfo,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerifyRequest {
    pub client_seed: String,
    pub server_seed: String,
    pub nonce: u64,
    pub expected_multiplier: f64,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerifyResponse {
    pub is_valid: bool,
    pub calculated_multiplier: f64,
    pub expected_multiplier: f64,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("internal server error")]
    Internal,
}

pub type ApiResult<T> = Result<T, ApiError>;
