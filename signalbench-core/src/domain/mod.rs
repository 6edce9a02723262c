//! Domain types: bars, signals, trades and per-run risk rules.

pub mod bar;
pub mod risk;
pub mod signal;
pub mod trade;

pub use bar::{first_index_after, Bar};
pub use risk::RiskConfig;
pub use signal::{Direction, Signal};
pub use trade::{ExitReason, Trade};
