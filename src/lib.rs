//a Rust-based momentum signal and backtesting engine for equities

pub mod config;
pub mod data;
pub mod engine;
pub mod execution;
pub mod metrics;
pub mod optimize;
pub mod portfolio;
pub mod signals;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{BacktestConfiguration, SignalParams};
    pub use crate::data::{load_csv, PriceBar};
    pub use crate::engine::{
        BacktestConfig, BacktestResult, Backtester, EnhancedBacktester, RiskConfig, RiskOverlay,
        RiskStats, Trade,
    };
    pub use crate::execution::{ExecutionReport, MockBroker, OrderStatus};
    pub use crate::metrics::{calculate_equity_curve, BacktestMetrics, EquityPoint};
    pub use crate::optimize::{OptimizationResult, ParameterOptimizer, ParameterSet};
    pub use crate::portfolio::{
        BacktestAccount, Position, PositionAllocator, PositionPlan, RiskBudget,
    };
    pub use crate::signals::{MomentumSignalModel, SignalDecision, TradeAction};
}
