// Signal classification module
pub mod cross;
pub mod signal;
pub mod tracker;

pub use cross::MacdCross;
pub use signal::{evaluate_signal, MAX_STOP_DISTANCE_PCT};
pub use tracker::SymbolTracker;
