use crate::data::PriceBar;
use crate::engine::{BacktestConfig, EnhancedBacktester, RiskConfig};
use crate::portfolio::{PositionAllocator, RiskBudget};
use crate::signals::{MomentumSignalModel, TradeAction};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

//one point of the parameter grid
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParameterSet {
    pub short_window: usize,
    pub long_window: usize,
    pub threshold: f64,
    pub max_trades_per_week: usize,
    pub stop_loss_pct: f64,
    pub trailing_stop_pct: f64,
    pub max_position_pct: f64,
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SW={}, LW={}, TH={:.2}, TPW={}, SL={:.0}%, TS={:.0}%",
            self.short_window,
            self.long_window,
            self.threshold,
            self.max_trades_per_week,
            self.stop_loss_pct * 100.0,
            self.trailing_stop_pct * 100.0
        )
    }
}

//backtest outcome for one parameter set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub params: ParameterSet,
    pub total_return: f64,
    pub annual_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub total_trades: usize,
}

//exhaustive grid search over strategy and risk parameters
//each combination runs the full signal -> allocation -> backtest pipeline
pub struct ParameterOptimizer {
    symbol: String,
    bars: Vec<PriceBar>,
    initial_cash: f64,
}

impl ParameterOptimizer {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>, initial_cash: f64) -> Self {
        ParameterOptimizer {
            symbol: symbol.into(),
            bars,
            initial_cash,
        }
    }

    //evaluates the cartesian product of the supplied parameter lists in
    //parallel; invalid combinations (short >= long) are skipped
    //results come back sorted by sharpe ratio, best first
    #[allow(clippy::too_many_arguments)]
    pub fn grid_search(
        &self,
        short_windows: &[usize],
        long_windows: &[usize],
        thresholds: &[f64],
        max_trades_per_week: &[usize],
        stop_loss_pcts: &[f64],
        trailing_stop_pcts: &[f64],
        max_position_pcts: &[f64],
    ) -> Vec<OptimizationResult> {
        let mut grid = Vec::new();
        for &short_window in short_windows {
            for &long_window in long_windows {
                if short_window >= long_window {
                    continue;
                }
                for &threshold in thresholds {
                    for &trades_per_week in max_trades_per_week {
                        for &stop_loss_pct in stop_loss_pcts {
                            for &trailing_stop_pct in trailing_stop_pcts {
                                for &max_position_pct in max_position_pcts {
                                    grid.push(ParameterSet {
                                        short_window,
                                        long_window,
                                        threshold,
                                        max_trades_per_week: trades_per_week,
                                        stop_loss_pct,
                                        trailing_stop_pct,
                                        max_position_pct,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }

        log::info!("grid search over {} parameter sets", grid.len());

        let mut results: Vec<OptimizationResult> = grid
            .par_iter()
            .filter_map(|&params| self.evaluate(params))
            .collect();

        results.sort_by(|a, b| {
            b.sharpe_ratio
                .partial_cmp(&a.sharpe_ratio)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results
    }

    //runs one parameter set end to end; combinations that fail to
    //configure or produce no equity data are dropped
    fn evaluate(&self, params: ParameterSet) -> Option<OptimizationResult> {
        let model =
            MomentumSignalModel::new(params.short_window, params.long_window, params.threshold)
                .ok()?;
        let decisions = model.generate(&self.bars);
        let filtered = model.filter_trading_slots(decisions, params.max_trades_per_week);

        let allocator =
            PositionAllocator::new(self.symbol.clone(), RiskBudget::new(self.initial_cash));

        let mut signals = Vec::new();
        for decision in &filtered {
            if decision.action == TradeAction::Hold {
                continue;
            }
            let plan = allocator.propose(decision, None).ok()??;
            signals.push((decision.bar.date, decision.action, plan.quantity));
        }

        let risk_config = RiskConfig {
            stop_loss_pct: Some(params.stop_loss_pct),
            trailing_stop_pct: Some(params.trailing_stop_pct),
            max_portfolio_drawdown: None,
            max_position_pct: params.max_position_pct,
        };
        let config = BacktestConfig {
            initial_cash: self.initial_cash,
            ..BacktestConfig::default()
        };

        let mut backtester = EnhancedBacktester::new(config, risk_config).ok()?;
        let result = backtester.run(&self.symbol, &self.bars, &signals).ok()?;

        Some(OptimizationResult {
            params,
            total_return: result.metrics.total_return,
            annual_return: result.metrics.annual_return,
            sharpe_ratio: result.metrics.sharpe_ratio,
            max_drawdown: result.metrics.max_drawdown,
            win_rate: result.metrics.win_rate,
            total_trades: result.metrics.total_trades,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn sample_bars() -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        (0..60)
            .map(|i| {
                //gentle uptrend with a wobble
                let close = 100.0 + i as f64 * 0.5 + (i % 5) as f64;
                PriceBar::new_unchecked(
                    start + Duration::days(i as i64),
                    close,
                    close,
                    close,
                    close,
                    1_000.0,
                )
            })
            .collect()
    }

    #[test]
    fn invalid_window_combinations_are_skipped() {
        let optimizer = ParameterOptimizer::new("TSLA", sample_bars(), 100_000.0);
        let results = optimizer.grid_search(
            &[5, 10],
            &[5, 10],
            &[0.01],
            &[2],
            &[0.1],
            &[0.1],
            &[0.5],
        );

        //only (5, 10) is valid
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].params.short_window, 5);
        assert_eq!(results[0].params.long_window, 10);
    }

    #[test]
    fn results_are_sorted_by_sharpe_descending() {
        let optimizer = ParameterOptimizer::new("TSLA", sample_bars(), 100_000.0);
        let results = optimizer.grid_search(
            &[2, 3],
            &[6, 8],
            &[0.0, 0.01],
            &[2],
            &[0.1],
            &[0.15],
            &[0.5],
        );

        assert!(!results.is_empty());
        for pair in results.windows(2) {
            assert!(pair[0].sharpe_ratio >= pair[1].sharpe_ratio);
        }
    }
}
