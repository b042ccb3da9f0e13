use std::collections::{HashMap, HashSet};

use crate::models::Direction;

/// Per-symbol dedup gate over (direction, candle close time).
///
/// A symbol enters the tracker the first time it shows up in the ranked
/// set; after that, downstream processing runs only when the evaluated
/// pair differs from the stored one. Symbols that drop out of the ranked
/// set are garbage collected at the end of the cycle.
#[derive(Debug, Default)]
pub struct SymbolTracker {
    seen: HashMap<String, (Direction, i64)>,
}

impl SymbolTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when this (direction, timestamp) pair has not been acted on for
    /// the symbol yet. Recording happens here, so at most one caller action
    /// per unique (symbol, direction, timestamp) triple.
    pub fn should_process(&mut self, symbol: &str, direction: Direction, timestamp: i64) -> bool {
        match self.seen.get(symbol) {
            Some(&(last_direction, last_timestamp))
                if last_direction == direction && last_timestamp == timestamp =>
            {
                false
            }
            _ => {
                self.seen.insert(symbol.to_string(), (direction, timestamp));
                true
            }
        }
    }

    /// Drop state for symbols no longer in the ranked set.
    pub fn retain_symbols(&mut self, active: &HashSet<String>) {
        self.seen.retain(|symbol, _| active.contains(symbol));
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.seen.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
