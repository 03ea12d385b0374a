use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    engine::{evaluate_lines, generate_grid, ConfigError, EngineParams, Grid, LineWin},
    rng::RandomSource,
    symbols::SymbolPool,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("invalid deposit amount")]
    InvalidDeposit,
    #[error("invalid lines (1-{max})")]
    InvalidLines { max: usize },
    #[error("invalid bet amount")]
    InvalidBet,
    #[error("insufficient balance, need {needed}")]
    InsufficientFunds { needed: f64, balance: f64 },
    #[error("a spin is already in progress")]
    SpinInProgress,
    #[error("no spin in progress matches this result")]
    NoPendingSpin,
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    /// Wager debited, outcome known but not yet credited.
    Spinning { spin_id: u64 },
}

/// A spin whose wager has been taken and whose grid is already drawn. Hand it back to
/// [`GameSession::resolve`] once the presentation is done with it.
#[derive(Debug)]
#[must_use = "the winnings are only credited by GameSession::resolve"]
pub struct PendingSpin {
    session_id: u64,
    spin_id: u64,
    bet: f64,
    lines: usize,
    total_bet: f64,
    grid: Grid,
    line_wins: Vec<LineWin>,
    winnings: f64,
}

impl PendingSpin {
    pub fn spin_id(&self) -> u64 {
        self.spin_id
    }

    pub fn bet(&self) -> f64 {
        self.bet
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn total_bet(&self) -> f64 {
        self.total_bet
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn line_wins(&self) -> &[LineWin] {
        &self.line_wins
    }

    pub fn winnings(&self) -> f64 {
        self.winnings
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinOutcome {
    pub spin_id: u64,
    pub grid: Grid,
    pub line_wins: Vec<LineWin>,
    pub total_bet: f64,
    pub winnings: f64,
    pub balance: f64,
    /// Balance is exhausted; nothing more can be wagered until the next deposit.
    pub terminal: bool,
}

impl SpinOutcome {
    pub fn is_win(&self) -> bool {
        self.winnings > 0.0
    }
}

/// Not `Clone`: a pending spin is only ever redeemable against the session that issued it.
#[derive(Debug)]
pub struct GameSession {
    id: u64,
    params: EngineParams,
    pool: SymbolPool,
    balance: f64,
    lines: usize,
    bet: f64,
    phase: Phase,
    spins: u64,
}

impl Default for GameSession {
    fn default() -> Self {
        let params = EngineParams::default_3x3();
        Self::with_params(params)
    }
}

impl GameSession {
    pub fn new(params: EngineParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self::with_params(params))
    }

    fn with_params(params: EngineParams) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            pool: params.pool(),
            params,
            balance: 0.0,
            lines: 1,
            bet: 0.0,
            phase: Phase::Idle,
            spins: 0,
        }
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn bet(&self) -> f64 {
        self.bet
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Spinning { .. })
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_busy() && self.balance <= 0.0
    }

    pub fn spins(&self) -> u64 {
        self.spins
    }

    pub fn deposit(&mut self, amount: f64) -> Result<f64, SessionError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(SessionError::InvalidDeposit);
        }
        self.balance += amount;
        debug!(amount, balance = self.balance, "deposit");
        Ok(self.balance)
    }

    /// Validates the wager, debits it and draws the grid. The session stays busy until
    /// the returned spin is resolved.
    pub fn begin_spin<R: RandomSource + ?Sized>(
        &mut self,
        rng: &mut R,
        bet: f64,
        lines: usize,
    ) -> Result<PendingSpin, SessionError> {
        if self.is_busy() {
            return Err(SessionError::SpinInProgress);
        }
        if lines < 1 || lines > self.params.rows {
            return Err(SessionError::InvalidLines {
                max: self.params.rows,
            });
        }
        if !bet.is_finite() || bet <= 0.0 {
            return Err(SessionError::InvalidBet);
        }
        let total_bet = bet * lines as f64;
        if total_bet > self.balance {
            return Err(SessionError::InsufficientFunds {
                needed: total_bet,
                balance: self.balance,
            });
        }

        self.balance -= total_bet;
        self.bet = bet;
        self.lines = lines;
        self.spins += 1;
        let spin_id = self.spins;
        self.phase = Phase::Spinning { spin_id };
        debug!(spin_id, total_bet, balance = self.balance, "wager debited");

        let grid = generate_grid(&self.pool, self.params.rows, self.params.cols, rng);
        let line_wins = evaluate_lines(&grid.rows(), bet, lines, &self.params.paytable);
        let winnings = line_wins.iter().map(|w| w.payout).sum();

        Ok(PendingSpin {
            session_id: self.id,
            spin_id,
            bet,
            lines,
            total_bet,
            grid,
            line_wins,
            winnings,
        })
    }

    /// Credits a pending spin's winnings and returns the session to idle.
    pub fn resolve(&mut self, pending: PendingSpin) -> Result<SpinOutcome, SessionError> {
        if pending.session_id != self.id
            || self.phase != (Phase::Spinning { spin_id: pending.spin_id })
        {
            return Err(SessionError::NoPendingSpin);
        }
        self.balance += pending.winnings;
        self.phase = Phase::Idle;
        let terminal = self.balance <= 0.0;
        debug!(
            spin_id = pending.spin_id,
            winnings = pending.winnings,
            balance = self.balance,
            terminal,
            "spin resolved"
        );
        Ok(SpinOutcome {
            spin_id: pending.spin_id,
            grid: pending.grid,
            line_wins: pending.line_wins,
            total_bet: pending.total_bet,
            winnings: pending.winnings,
            balance: self.balance,
            terminal,
        })
    }

    pub fn spin<R: RandomSource + ?Sized>(
        &mut self,
        rng: &mut R,
        bet: f64,
        lines: usize,
    ) -> Result<SpinOutcome, SessionError> {
        let pending = self.begin_spin(rng, bet, lines)?;
        self.resolve(pending)
    }
}
