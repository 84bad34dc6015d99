use crate::data::PriceBar;
use crate::engine::trade::Trade;
use crate::metrics::{calculate_equity_curve, BacktestMetrics, EquityPoint, MetricsError};
use crate::portfolio::BacktestAccount;
use crate::signals::TradeAction;
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::collections::HashMap;

//a dated trade instruction produced by the signal/allocation layer
pub type SignalEntry = (NaiveDate, TradeAction, u32);

//result of a backtest
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub metrics: BacktestMetrics,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
}

//configuration for a backtest
#[derive(Debug, Clone, Copy)]
pub struct BacktestConfig {
    pub initial_cash: f64,
    pub commission_rate: f64,
    //annualized risk-free rate used in the sharpe calculation
    pub risk_free_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_cash: 100_000.0,
            commission_rate: 0.001,
            risk_free_rate: 0.02,
        }
    }
}

//replays bars against signals, maintaining a cash+position ledger
//single-threaded and strictly sequential; one instance owns its account
pub struct Backtester {
    config: BacktestConfig,
    account: BacktestAccount,
}

impl Backtester {
    pub fn new(config: BacktestConfig) -> Self {
        let account = BacktestAccount::new(config.initial_cash, config.commission_rate);
        Backtester { config, account }
    }

    //runs the backtest for one symbol over the given bars and signals
    //equity is recorded once per bar regardless of trade outcome
    pub fn run(
        &mut self,
        symbol: &str,
        bars: &[PriceBar],
        signals: &[SignalEntry],
    ) -> Result<BacktestResult, MetricsError> {
        let signal_map = build_signal_map(signals);

        let mut bars = bars.to_vec();
        bars.sort_by(|a, b| a.date.cmp(&b.date));

        for bar in &bars {
            let current_price = bar.close;

            //apply the day's signal, if any
            if let Some(&(action, quantity)) = signal_map.get(&bar.date) {
                if action != TradeAction::Hold {
                    let trade = Trade::new(bar.date, action, symbol, quantity, current_price);
                    self.account.execute_trade(trade);
                }
            }

            //record daily equity
            let mut prices = HashMap::new();
            prices.insert(symbol.to_string(), current_price);
            let equity = self.account.total_equity(&prices);
            self.account.record_equity(bar.date, equity);
        }

        self.build_result()
    }

    fn build_result(&self) -> Result<BacktestResult, MetricsError> {
        let dates: Vec<_> = self.account.equity_curve.iter().map(|(d, _)| *d).collect();
        let equity_values: Vec<_> = self.account.equity_curve.iter().map(|(_, e)| *e).collect();

        let equity_curve =
            calculate_equity_curve(&dates, &equity_values, self.config.initial_cash);

        let trades = self.account.trade_log.clone();

        let metrics = BacktestMetrics::from_backtest(
            &equity_curve,
            &trades,
            self.config.initial_cash,
            self.config.risk_free_rate,
        )?;

        Ok(BacktestResult {
            metrics,
            equity_curve,
            trades,
        })
    }

    //returns a reference to the account
    pub fn account(&self) -> &BacktestAccount {
        &self.account
    }
}

//later signals for the same date replace earlier ones
pub(crate) fn build_signal_map(signals: &[SignalEntry]) -> IndexMap<NaiveDate, (TradeAction, u32)> {
    let mut map = IndexMap::with_capacity(signals.len());
    for &(date, action, quantity) in signals {
        map.insert(date, (action, quantity));
    }
    map
}
