use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    A,
    B,
    C,
    D,
}

impl Symbol {
    pub const ALL: [Symbol; 4] = [Symbol::A, Symbol::B, Symbol::C, Symbol::D];

    pub fn from_index(i: u8) -> Option<Self> {
        match i {
            0 => Some(Symbol::A),
            1 => Some(Symbol::B),
            2 => Some(Symbol::C),
            3 => Some(Symbol::D),
            _ => None,
        }
    }

    pub fn to_index(self) -> u8 {
        match self {
            Symbol::A => 0,
            Symbol::B => 1,
            Symbol::C => 2,
            Symbol::D => 3,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Symbol::A => "A",
            Symbol::B => "B",
            Symbol::C => "C",
            Symbol::D => "D",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SymbolWeight {
    pub symbol: Symbol,
    pub count: u32,
}

/// Relative abundance of each symbol on a reel. Rarer symbols get lower counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrequencyTable(pub Vec<SymbolWeight>);

impl FrequencyTable {
    pub fn simple_default() -> Self {
        Self(vec![
            SymbolWeight {
                symbol: Symbol::A,
                count: 2,
            },
            SymbolWeight {
                symbol: Symbol::B,
                count: 4,
            },
            SymbolWeight {
                symbol: Symbol::C,
                count: 6,
            },
            SymbolWeight {
                symbol: Symbol::D,
                count: 8,
            },
        ])
    }

    pub fn total(&self) -> u32 {
        self.0.iter().map(|w| w.count).sum()
    }

    pub fn count_of(&self, symbol: Symbol) -> u32 {
        self.0
            .iter()
            .filter(|w| w.symbol == symbol)
            .map(|w| w.count)
            .sum()
    }
}

/// Flat multiset of symbols, one entry per unit of frequency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolPool(Vec<Symbol>);

impl SymbolPool {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.0
    }

    pub fn count_of(&self, symbol: Symbol) -> usize {
        self.0.iter().filter(|s| **s == symbol).count()
    }

    /// Owned copy for one reel to consume.
    pub fn fresh_copy(&self) -> Vec<Symbol> {
        self.0.clone()
    }
}

pub fn build_pool(table: &FrequencyTable) -> SymbolPool {
    let mut symbols = Vec::with_capacity(table.total() as usize);
    for weight in &table.0 {
        for _ in 0..weight.count {
            symbols.push(weight.symbol);
        }
    }
    SymbolPool(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_matches_frequencies() {
        let table = FrequencyTable::simple_default();
        let pool = build_pool(&table);
        assert_eq!(pool.len(), 20);
        for symbol in Symbol::ALL {
            assert_eq!(pool.count_of(symbol), table.count_of(symbol) as usize);
        }
    }

    #[test]
    fn pool_is_grouped_in_table_order() {
        let pool = build_pool(&FrequencyTable::simple_default());
        assert_eq!(&pool.as_slice()[..3], &[Symbol::A, Symbol::A, Symbol::B]);
        assert_eq!(pool.as_slice()[19], Symbol::D);
    }

    #[test]
    fn build_twice_same_content() {
        let table = FrequencyTable::simple_default();
        assert_eq!(build_pool(&table), build_pool(&table));
    }

    #[test]
    fn empty_table_gives_empty_pool() {
        let pool = build_pool(&FrequencyTable(vec![]));
        assert!(pool.is_empty());
    }

    #[test]
    fn index_roundtrip() {
        for symbol in Symbol::ALL {
            assert_eq!(Symbol::from_index(symbol.to_index()), Some(symbol));
        }
        assert_eq!(Symbol::from_index(4), None);
    }
}
