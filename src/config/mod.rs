pub mod backtest_config;

pub use backtest_config::{BacktestConfiguration, SignalParams};
