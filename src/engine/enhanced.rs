use crate::data::PriceBar;
use crate::engine::backtest::{build_signal_map, BacktestConfig, BacktestResult, SignalEntry};
use crate::engine::risk::{RiskConfig, RiskConfigError, RiskOverlay, RiskStats, StopReason};
use crate::engine::trade::Trade;
use crate::metrics::{calculate_equity_curve, BacktestMetrics, MetricsError};
use crate::portfolio::BacktestAccount;
use crate::signals::TradeAction;
use std::collections::HashMap;

//backtester with a risk overlay consulted before each day's signal:
//fixed and trailing stop-losses, a portfolio drawdown circuit breaker,
//and a per-buy position size cap
pub struct EnhancedBacktester {
    config: BacktestConfig,
    account: BacktestAccount,
    overlay: RiskOverlay,
}

impl EnhancedBacktester {
    //fails fast on an invalid risk configuration
    pub fn new(config: BacktestConfig, risk_config: RiskConfig) -> Result<Self, RiskConfigError> {
        let account = BacktestAccount::new(config.initial_cash, config.commission_rate);
        let overlay = RiskOverlay::new(risk_config, config.initial_cash)?;
        Ok(EnhancedBacktester {
            config,
            account,
            overlay,
        })
    }

    //runs the backtest for one symbol
    //per-bar order: risk exits, peak update, the day's signal (against the
    //possibly-now-flat position), trailing-high update, equity recording
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

            //1. forced exits run before any new signal
            self.check_risk_exits(symbol, bar.date, current_price);

            //2. ratchet the equity peak used by the drawdown breaker
            let current_equity = self.equity_at(symbol, current_price);
            self.overlay.update_peak(current_equity);

            //3. apply the day's signal, if any
            if let Some(&(action, quantity)) = signal_map.get(&bar.date) {
                if self.overlay.should_halt_entries(current_equity) {
                    log::warn!(
                        "{}: max portfolio drawdown reached, skipping signals",
                        bar.date
                    );
                } else if action != TradeAction::Hold {
                    let adjusted_quantity = self.adjust_position_size(quantity, current_price, action);

                    if adjusted_quantity > 0 {
                        let trade =
                            Trade::new(bar.date, action, symbol, adjusted_quantity, current_price);
                        let success = self.account.execute_trade(trade);

                        if success && action == TradeAction::Buy {
                            self.overlay.record_entry(symbol, current_price);
                        }
                    }
                }
            }

            //4. ratchet the trailing high while a position is open
            self.overlay.update_highest(symbol, current_price);

            //5. record daily equity (also on halted days)
            let equity = self.equity_at(symbol, current_price);
            self.account.record_equity(bar.date, equity);
        }

        let result = self.build_result()?;

        let stats = self.overlay.stats();
        if stats.stop_loss_exits > 0 || stats.trailing_stop_exits > 0 || stats.drawdown_stops > 0 {
            log::info!(
                "risk controls fired: {} stop-loss, {} trailing-stop, {} drawdown halts",
                stats.stop_loss_exits,
                stats.trailing_stop_exits,
                stats.drawdown_stops
            );
        }

        Ok(result)
    }

    //force-sells the full position when a stop triggers
    fn check_risk_exits(&mut self, symbol: &str, date: chrono::NaiveDate, current_price: f64) {
        let Some(position) = self.account.get_position(symbol) else {
            return;
        };
        let quantity = position.quantity;
        if quantity == 0 {
            return;
        }

        let Some(reason) = self.overlay.check_exit(symbol, current_price) else {
            return;
        };

        log::warn!(
            "{}: {} triggered, closing {} shares @ ${:.2}",
            date,
            match reason {
                StopReason::StopLoss => "fixed stop-loss",
                StopReason::TrailingStop => "trailing stop",
            },
            quantity,
            current_price
        );

        let trade = Trade::new(date, TradeAction::Sell, symbol, quantity, current_price);
        if self.account.execute_trade(trade) {
            self.overlay.record_exit(symbol, reason);
        }
    }

    //clamps buys to the configured fraction of available cash
    fn adjust_position_size(&self, quantity: u32, price: f64, action: TradeAction) -> u32 {
        if action != TradeAction::Buy {
            return quantity;
        }
        self.overlay.cap_buy_quantity(quantity, self.account.cash, price)
    }

    fn equity_at(&self, symbol: &str, price: f64) -> f64 {
        let mut prices = HashMap::new();
        prices.insert(symbol.to_string(), price);
        self.account.total_equity(&prices)
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

    //returns the overlay counters
    pub fn risk_stats(&self) -> RiskStats {
        self.overlay.stats()
    }
}
