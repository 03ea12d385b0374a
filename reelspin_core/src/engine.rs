use serde::{Deserialize, Serialize};

use crate::{
    paytable::Paytable,
    rng::{ProvablyFairRng, RandomSource},
    symbols::{build_pool, FrequencyTable, Symbol, SymbolPool},
};

pub const ROWS: usize = 3;
pub const COLS: usize = 3;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("grid must have at least one row and one column (got {rows}x{cols})")]
    EmptyGrid { rows: usize, cols: usize },
    #[error("symbol {0} has a zero count")]
    ZeroCount(Symbol),
    #[error("pool holds {pool} symbols but each reel draws {rows}")]
    PoolTooSmall { pool: usize, rows: usize },
    #[error("no paytable entry for symbol {0}")]
    MissingPayout(Symbol),
    #[error("payout multiplier for {0} must be positive and finite")]
    BadMultiplier(Symbol),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineParams {
    pub rows: usize,
    pub cols: usize,
    pub frequencies: FrequencyTable,
    pub paytable: Paytable,
}

impl EngineParams {
    pub fn default_3x3() -> Self {
        Self {
            rows: ROWS,
            cols: COLS,
            frequencies: FrequencyTable::simple_default(),
            paytable: Paytable::simple_default(),
        }
    }

    /// Checks the startup preconditions the generator and evaluator rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        for weight in &self.frequencies.0 {
            if weight.count == 0 {
                return Err(ConfigError::ZeroCount(weight.symbol));
            }
            match self.paytable.multiplier(weight.symbol) {
                None => return Err(ConfigError::MissingPayout(weight.symbol)),
                Some(m) if !m.is_finite() || m <= 0.0 => {
                    return Err(ConfigError::BadMultiplier(weight.symbol))
                }
                Some(_) => {}
            }
        }
        let pool = self.frequencies.total() as usize;
        if pool < self.rows {
            return Err(ConfigError::PoolTooSmall {
                pool,
                rows: self.rows,
            });
        }
        Ok(())
    }

    pub fn pool(&self) -> SymbolPool {
        build_pool(&self.frequencies)
    }
}

/// Spin result stored column-major: `columns[c][r]` is reel `c`, row `r`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    columns: Vec<Vec<Symbol>>,
}

impl Grid {
    pub fn from_columns(columns: Vec<Vec<Symbol>>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Vec<Symbol>] {
        &self.columns
    }

    /// Row-major view, derived on demand.
    pub fn rows(&self) -> Vec<Vec<Symbol>> {
        transpose(&self.columns)
    }

    /// Row-major symbol indices, the shape used on the wire.
    pub fn to_indices(&self) -> Vec<Vec<u8>> {
        self.rows()
            .iter()
            .map(|row| row.iter().map(|s| s.to_index()).collect())
            .collect()
    }
}

/// Rows past the end of the shortest column are dropped.
pub fn transpose(columns: &[Vec<Symbol>]) -> Vec<Vec<Symbol>> {
    let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
    (0..rows)
        .map(|r| columns.iter().map(|col| col[r]).collect())
        .collect()
}

/// Draws `draws` symbols from an owned copy of `pool`; drawn entries are removed so
/// they cannot come up again in the same call.
pub fn sample_without_replacement<R: RandomSource + ?Sized>(
    pool: &SymbolPool,
    draws: usize,
    rng: &mut R,
) -> Vec<Symbol> {
    let mut remaining = pool.fresh_copy();
    let mut out = Vec::with_capacity(draws);
    for _ in 0..draws {
        if remaining.is_empty() {
            break;
        }
        let idx = ((rng.next_f64() * remaining.len() as f64).floor() as usize)
            .min(remaining.len() - 1);
        out.push(remaining.remove(idx));
    }
    out
}

pub fn generate_grid<R: RandomSource + ?Sized>(
    pool: &SymbolPool,
    rows: usize,
    cols: usize,
    rng: &mut R,
) -> Grid {
    let columns = (0..cols)
        .map(|_| sample_without_replacement(pool, rows, rng))
        .collect();
    Grid::from_columns(columns)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineWin {
    /// Zero-based row index, top to bottom.
    pub line: usize,
    pub symbol: Symbol,
    pub payout: f64,
}

/// Paying lines among the first `lines` rows. A line pays only when every symbol in it matches.
pub fn evaluate_lines(
    rows: &[Vec<Symbol>],
    bet: f64,
    lines: usize,
    paytable: &Paytable,
) -> Vec<LineWin> {
    let mut wins = Vec::new();
    for (line, row) in rows.iter().enumerate().take(lines) {
        let Some(&first) = row.first() else {
            continue;
        };
        if !row.iter().all(|s| *s == first) {
            continue;
        }
        if let Some(multiplier) = paytable.multiplier(first) {
            wins.push(LineWin {
                line,
                symbol: first,
                payout: multiplier * bet,
            });
        }
    }
    wins
}

pub fn evaluate(rows: &[Vec<Symbol>], bet: f64, lines: usize, paytable: &Paytable) -> f64 {
    evaluate_lines(rows, bet, lines, paytable)
        .iter()
        .map(|w| w.payout)
        .sum()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpinDraw {
    pub grid: Grid,
    pub line_wins: Vec<LineWin>,
    pub payout: f64,
}

pub fn spin_once<R: RandomSource + ?Sized>(
    rng: &mut R,
    params: &EngineParams,
    bet: f64,
    lines: usize,
) -> SpinDraw {
    let grid = generate_grid(&params.pool(), params.rows, params.cols, rng);
    let line_wins = evaluate_lines(&grid.rows(), bet, lines, &params.paytable);
    let payout = line_wins.iter().map(|w| w.payout).sum();
    SpinDraw {
        grid,
        line_wins,
        payout,
    }
}

/// Convenience: perform a spin creating the RNG from seeds.
pub fn spin_with_seeds(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    params: &EngineParams,
    bet: f64,
    lines: usize,
) -> SpinDraw {
    let mut stream = ProvablyFairRng::new(server_seed, client_seed, nonce).stream();
    spin_once(&mut stream, params, bet, lines)
}

/// Verify that a given row-major grid matches what the RNG would produce for the seeds.
pub fn verify_grid(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    params: &EngineParams,
    expected_indices: &[Vec<u8>],
) -> bool {
    let mut stream = ProvablyFairRng::new(server_seed, client_seed, nonce).stream();
    let grid = generate_grid(&params.pool(), params.rows, params.cols, &mut stream);
    grid.to_indices() == expected_indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSource;
    use crate::symbols::SymbolWeight;
    use crate::symbols::Symbol::*;

    #[test]
    fn test_spin_deterministic() {
        let params = EngineParams::default_3x3();
        let out1 = spin_with_seeds("server", "client", 1, &params, 1.0, 3);
        let out2 = spin_with_seeds("server", "client", 1, &params, 1.0, 3);
        assert_eq!(out1, out2);
    }

    #[test]
    fn first_draw_index_from_float() {
        // pool is AABBBBCCCCCCDDDDDDDD; 0.0 -> A, 0.99 -> last D
        let pool = build_pool(&FrequencyTable::simple_default());
        let mut rng = ScriptedSource::new(vec![0.0, 0.99, 0.5]);
        let column = sample_without_replacement(&pool, 3, &mut rng);
        // third draw: 18 left (A B B B B C*6 D*7), floor(0.5 * 18) = 9 -> C
        assert_eq!(column, vec![A, D, C]);
    }

    #[test]
    fn drawn_entries_are_removed() {
        // always take index 0: the two A's go first, then B
        let pool = build_pool(&FrequencyTable::simple_default());
        let mut rng = ScriptedSource::new(vec![0.0]);
        assert_eq!(sample_without_replacement(&pool, 3, &mut rng), vec![A, A, B]);
    }

    #[test]
    fn each_column_gets_a_fresh_pool() {
        let pool = build_pool(&FrequencyTable::simple_default());
        let mut rng = ScriptedSource::new(vec![0.0]);
        let grid = generate_grid(&pool, 3, 3, &mut rng);
        for column in grid.columns() {
            assert_eq!(column, &vec![A, A, B]);
        }
        assert_eq!(grid.rows(), vec![vec![A, A, A], vec![A, A, A], vec![B, B, B]]);
    }

    #[test]
    fn column_never_exceeds_frequency() {
        let params = EngineParams::default_3x3();
        let pool = params.pool();
        for nonce in 0..500u64 {
            let mut stream = ProvablyFairRng::new("s", "c", nonce).stream();
            let grid = generate_grid(&pool, ROWS, COLS, &mut stream);
            for column in grid.columns() {
                assert_eq!(column.len(), ROWS);
                // A has count 2: never three A's in one column
                assert!(column.iter().filter(|s| **s == A).count() <= 2);
            }
        }
    }

    #[test]
    fn transpose_swaps_axes() {
        let cols = vec![vec![A, B, C], vec![D, A, B], vec![C, D, A]];
        let rows = transpose(&cols);
        assert_eq!(rows[0], vec![A, D, C]);
        assert_eq!(rows[2], vec![C, B, A]);
        assert_eq!(transpose(&rows), cols);
    }

    #[test]
    fn ragged_grid_keeps_complete_rows() {
        let grid = Grid::from_columns(vec![vec![A, B, C], vec![D], vec![C, D]]);
        assert_eq!(grid.rows(), vec![vec![A, D, C]]);
        assert_eq!(grid.to_indices(), vec![vec![0, 3, 2]]);
        assert!(transpose(&[]).is_empty());
    }

    #[test]
    fn top_row_of_a_pays_fifty() {
        let rows = vec![vec![A, A, A], vec![B, C, D], vec![D, C, B]];
        assert_eq!(evaluate(&rows, 10.0, 1, &Paytable::simple_default()), 50.0);
    }

    #[test]
    fn rows_past_lines_are_ignored() {
        let rows = vec![vec![A, A, A], vec![B, B, B], vec![C, C, C]];
        let table = Paytable::simple_default();
        assert_eq!(evaluate(&rows, 10.0, 1, &table), 50.0);
        assert_eq!(evaluate(&rows, 10.0, 2, &table), 90.0);
        assert_eq!(evaluate(&rows, 10.0, 3, &table), 120.0);
    }

    #[test]
    fn partial_match_pays_nothing() {
        let rows = vec![vec![A, A, B], vec![C, C, D], vec![D, D, C]];
        assert_eq!(evaluate(&rows, 10.0, 3, &Paytable::simple_default()), 0.0);
        assert_eq!(evaluate(&rows, 10.0, 0, &Paytable::simple_default()), 0.0);
    }

    #[test]
    fn line_wins_report_row_and_symbol() {
        let rows = vec![vec![C, B, C], vec![D, D, D]];
        let wins = evaluate_lines(&rows, 2.0, 2, &Paytable::simple_default());
        assert_eq!(
            wins,
            vec![LineWin {
                line: 1,
                symbol: D,
                payout: 4.0
            }]
        );
    }

    #[test]
    fn default_params_validate() {
        assert_eq!(EngineParams::default_3x3().validate(), Ok(()));
    }

    #[test]
    fn small_pool_rejected() {
        let mut params = EngineParams::default_3x3();
        params.frequencies = FrequencyTable(vec![SymbolWeight { symbol: A, count: 2 }]);
        assert_eq!(
            params.validate(),
            Err(ConfigError::PoolTooSmall { pool: 2, rows: 3 })
        );
    }

    #[test]
    fn missing_payout_rejected() {
        let mut params = EngineParams::default_3x3();
        params.paytable.0.retain(|e| e.symbol != C);
        assert_eq!(params.validate(), Err(ConfigError::MissingPayout(C)));
    }

    #[test]
    fn verify_accepts_own_grid_only() {
        let params = EngineParams::default_3x3();
        let draw = spin_with_seeds("server", "client", 4, &params, 1.0, 1);
        let indices = draw.grid.to_indices();
        assert!(verify_grid("server", "client", 4, &params, &indices));
        assert!(!verify_grid("server", "client", 4, &params, &[vec![9, 9, 9]]));
    }
}
