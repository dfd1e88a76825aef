//! Domain types for EqScreen: the priced universe, fundamentals, and price history.

pub mod candidate;
pub mod fundamentals;
pub mod history;

pub use candidate::{CandidateSet, PricedTicker};
pub use fundamentals::{FundamentalsRecord, FundamentalsSnapshot};
pub use history::{HistoryError, PriceHistory, TRADING_DAYS_PER_MONTH};
