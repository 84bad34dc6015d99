pub mod summary;
pub mod timeseries;

pub use summary::{BacktestMetrics, MetricsError};
pub use timeseries::{calculate_equity_curve, calculate_returns, max_drawdown, EquityPoint};
