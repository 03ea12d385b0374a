//! Slot machine engine: weighted symbol pools, per-reel sampling without replacement,
//! horizontal payline evaluation and single-session balance accounting.

pub mod engine;
pub mod paytable;
pub mod rng;
pub mod session;
pub mod symbols;

pub use crate::engine::{
    evaluate, evaluate_lines, generate_grid, sample_without_replacement, spin_once, spin_with_seeds,
    transpose, verify_grid, ConfigError, EngineParams, Grid, LineWin, SpinDraw, COLS, ROWS,
};
pub use crate::paytable::{Paytable, PaytableEntry};
pub use crate::rng::{
    derive_floats, derive_hash_hex, random_server_seed, EntropySource, FairStream, ProvablyFairRng,
    RandomSource, ScriptedSource,
};
pub use crate::session::{GameSession, PendingSpin, Phase, SessionError, SpinOutcome};
pub use crate::symbols::{build_pool, FrequencyTable, Symbol, SymbolPool, SymbolWeight};
