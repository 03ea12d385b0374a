use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DepositRequest {
    pub amount: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpinRequest {
    pub bet: f64,
    pub lines: u32,
    /// Replaces the client seed from this spin onwards.
    #[serde(default)]
    pub client_seed: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LineWinEntry {
    pub line: u32,
    pub symbol: u8,
    pub payout: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpinResponse {
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
    pub reels: Vec<Vec<u8>>, // row-major indices of symbols
    pub line_wins: Vec<LineWinEntry>,
    pub total_bet: f64,
    pub winnings: f64,
    pub balance: f64,
    pub terminal: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionView {
    pub balance: f64,
    pub lines: u32,
    pub bet: f64,
    pub busy: bool,
    pub terminal: bool,
    pub spins: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerifyResponse {
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RotateSeedRequest {
    pub new_seed: String,
}

/// The retired seed is revealed so past spins can be checked against its hash.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RotateSeedResponse {
    pub previous_server_seed: String,
    pub previous_nonce: u64,
    pub server_seed_hash: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("insufficient balance: need {needed}, have {balance}")]
    InsufficientFunds { needed: f64, balance: f64 },
    #[error("a spin is already in progress")]
    Busy,
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
