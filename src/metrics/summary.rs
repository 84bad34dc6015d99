use crate::engine::trade::Trade;
use crate::metrics::timeseries::{calculate_returns, max_drawdown, EquityPoint};
use crate::signals::TradeAction;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("equity curve is empty, nothing to report")]
    EmptyEquityCurve,
}

//read-only performance snapshot computed once at the end of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestMetrics {
    pub total_return: f64,
    pub annual_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub total_trades: usize,
    pub profit_trades: usize,
    pub loss_trades: usize,
    pub avg_profit: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
}

impl BacktestMetrics {
    //calculate metrics from the equity curve and trade log
    pub fn from_backtest(
        equity_curve: &[EquityPoint],
        trades: &[Trade],
        initial_cash: f64,
        risk_free_rate: f64,
    ) -> Result<Self, MetricsError> {
        if equity_curve.is_empty() {
            return Err(MetricsError::EmptyEquityCurve);
        }

        let final_equity = equity_curve.last().map(|p| p.equity).unwrap_or(initial_cash);
        let total_return = (final_equity - initial_cash) / initial_cash;

        //annualized return over the simulated span
        let first_date = equity_curve.first().map(|p| p.date).unwrap_or_default();
        let last_date = equity_curve.last().map(|p| p.date).unwrap_or_default();
        let days = (last_date - first_date).num_days() as f64;
        let years = days / 365.25;
        let annual_return = if years > 0.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        //sharpe from daily returns; zero when there is nothing to measure
        let equity_values: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let daily_returns = calculate_returns(&equity_values);
        let sharpe_ratio = calculate_sharpe_ratio(&daily_returns, risk_free_rate);

        let max_dd = max_drawdown(equity_curve);

        let trade_stats = calculate_trade_statistics(trades);

        Ok(BacktestMetrics {
            total_return,
            annual_return,
            sharpe_ratio,
            max_drawdown: max_dd,
            win_rate: trade_stats.win_rate,
            total_trades: trade_stats.total_trades,
            profit_trades: trade_stats.profit_trades,
            loss_trades: trade_stats.loss_trades,
            avg_profit: trade_stats.avg_profit,
            avg_loss: trade_stats.avg_loss,
            profit_factor: trade_stats.profit_factor,
        })
    }

    //prints metrics in a formatted table
    pub fn pretty_print_table(&self) {
        let mut table = Table::new();

        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));

        table.add_row(Row::new(vec![
            Cell::new("Total Return"),
            Cell::new(&format!("{:.2}%", self.total_return * 100.0)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Annual Return"),
            Cell::new(&format!("{:.2}%", self.annual_return * 100.0)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Sharpe Ratio"),
            Cell::new(&format!("{:.2}", self.sharpe_ratio)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Max Drawdown"),
            Cell::new(&format!("{:.2}%", self.max_drawdown * 100.0)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Win Rate"),
            Cell::new(&format!("{:.2}%", self.win_rate * 100.0)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Total Trades"),
            Cell::new(&format!("{}", self.total_trades)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Profit Trades"),
            Cell::new(&format!("{}", self.profit_trades)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Loss Trades"),
            Cell::new(&format!("{}", self.loss_trades)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Avg Profit"),
            Cell::new(&format!("${:.2}", self.avg_profit)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Avg Loss"),
            Cell::new(&format!("${:.2}", self.avg_loss)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Profit Factor"),
            Cell::new(&format!("{:.2}", self.profit_factor)),
        ]));

        table.printstd();
    }
}

fn calculate_sharpe_ratio(daily_returns: &[f64], risk_free_rate: f64) -> f64 {
    if daily_returns.len() < 2 {
        return 0.0;
    }

    let std_dev = daily_returns.std_dev();
    if !(std_dev > 0.0) {
        return 0.0;
    }

    let daily_risk_free = risk_free_rate / 252.0;
    let excess_mean = daily_returns.iter().map(|r| r - daily_risk_free).mean();

    //annualize assuming daily samples
    (252.0_f64).sqrt() * excess_mean / std_dev
}

struct TradeStats {
    total_trades: usize,
    profit_trades: usize,
    loss_trades: usize,
    win_rate: f64,
    avg_profit: f64,
    avg_loss: f64,
    profit_factor: f64,
}

//pairs each sell with the most recent prior buy in the log
//deliberately not fifo lot accounting: with several buys before a partial
//sell the pnl is attributed to the last buy only
fn calculate_trade_statistics(trades: &[Trade]) -> TradeStats {
    let mut trade_pnls = Vec::new();

    for (i, trade) in trades.iter().enumerate() {
        if trade.action != TradeAction::Sell || i == 0 {
            continue;
        }

        for buy in trades[..i].iter().rev() {
            if buy.action == TradeAction::Buy {
                let pnl = (trade.price - buy.price) * trade.quantity as f64
                    - trade.commission
                    - buy.commission;
                trade_pnls.push(pnl);
                break;
            }
        }
    }

    if trade_pnls.is_empty() {
        return TradeStats {
            total_trades: 0,
            profit_trades: 0,
            loss_trades: 0,
            win_rate: 0.0,
            avg_profit: 0.0,
            avg_loss: 0.0,
            profit_factor: 0.0,
        };
    }

    let profits: Vec<f64> = trade_pnls.iter().filter(|&&pnl| pnl > 0.0).copied().collect();
    let losses: Vec<f64> = trade_pnls
        .iter()
        .filter(|&&pnl| pnl < 0.0)
        .map(|pnl| pnl.abs())
        .collect();

    let profit_trades = profits.len();
    let loss_trades = losses.len();
    let win_rate = profit_trades as f64 / trade_pnls.len() as f64;

    let avg_profit = if profit_trades > 0 {
        profits.iter().sum::<f64>() / profit_trades as f64
    } else {
        0.0
    };

    let avg_loss = if loss_trades > 0 {
        losses.iter().sum::<f64>() / loss_trades as f64
    } else {
        0.0
    };

    let total_profit: f64 = profits.iter().sum();
    let total_loss: f64 = losses.iter().sum();
    let profit_factor = if total_loss > 0.0 {
        total_profit / total_loss
    } else {
        0.0
    };

    TradeStats {
        total_trades: trade_pnls.len(),
        profit_trades,
        loss_trades,
        win_rate,
        avg_profit,
        avg_loss,
        profit_factor,
    }
}
