//! Backtesting engine — turns signals plus bars into simulated trades.

pub mod simulator;

pub use simulator::{
    apply_slippage, find_exit, net_return, simulate, stop_and_target, ExitFill, Simulation,
};
