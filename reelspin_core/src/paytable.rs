use crate::symbols::Symbol;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaytableEntry {
    pub symbol: Symbol,
    pub payout_multiplier: f64,
}

/// Per-symbol multiplier paid for a full row of that symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paytable(pub Vec<PaytableEntry>);

impl Paytable {
    pub fn simple_default() -> Self {
        Self(vec![
            PaytableEntry {
                symbol: Symbol::A,
                payout_multiplier: 5.0,
            },
            PaytableEntry {
                symbol: Symbol::B,
                payout_multiplier: 4.0,
            },
            PaytableEntry {
                symbol: Symbol::C,
                payout_multiplier: 3.0,
            },
            PaytableEntry {
                symbol: Symbol::D,
                payout_multiplier: 2.0,
            },
        ])
    }

    pub fn multiplier(&self, symbol: Symbol) -> Option<f64> {
        self.0
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| e.payout_multiplier)
    }
}
