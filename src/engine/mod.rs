pub mod backtest;
pub mod enhanced;
pub mod risk;
pub mod trade;

pub use backtest::{BacktestConfig, BacktestResult, Backtester};
pub use enhanced::EnhancedBacktester;
pub use risk::{RiskConfig, RiskConfigError, RiskOverlay, RiskStats, StopReason};
pub use trade::Trade;
