//! SignalBench Core — domain types, indicators, strategies, registry and the
//! trade simulator.
//!
//! This crate contains the pure part of the pipeline:
//! - Domain types (bars, signals, trades, risk config)
//! - Indicators (SMA, Wilder RSI, Bollinger, anchored VWAP)
//! - Signal generators and the ML-validated wrapper
//! - Confidence predictors (inference only)
//! - Strategy registry with parameter schemas
//! - Trade simulator with compounding capital
//!
//! Nothing here touches the filesystem except `LinearPredictor::load`.

pub mod components;
pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod predictor;

pub use error::ConfigurationError;
