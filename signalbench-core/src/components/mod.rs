//! Strategy components.
//!
//! - Indicator trait for precomputed numeric series
//! - Signal generators (one per strategy) plus the ML-validated wrapper
//! - Latch state machine shared by the threshold strategies
//! - Parameter schema and the strategy registry that builds generators by id

pub mod indicator;
pub mod latch;
pub mod params;
pub mod registry;
pub mod signal;

pub use indicator::Indicator;
pub use latch::{Latch, LatchInput};
pub use params::{Overrides, ParamKind, ParamSchema, ParamSpec, ParamValue, Params};
pub use registry::{Constructor, RegistryError, StrategyInfo, StrategyRegistry};
pub use signal::{
    SignalGenerator, ValidatedSignalGenerator, ValidationConfig, ValidationStats,
};
