use crate::engine::trade::Trade;
use crate::portfolio::position::Position;
use crate::signals::TradeAction;
use chrono::NaiveDate;
use std::collections::HashMap;

//simulated cash-and-positions ledger
//cash and positions are mutated exclusively through execute_trade
#[derive(Debug, Clone)]
pub struct BacktestAccount {
    //starting cash balance
    pub initial_cash: f64,

    //current cash
    pub cash: f64,

    //open positions by symbol
    pub positions: HashMap<String, Position>,

    //append-only trade log (rejected trades are not logged)
    pub trade_log: Vec<Trade>,

    //one (date, total equity) sample per simulated day
    pub equity_curve: Vec<(NaiveDate, f64)>,

    //commission charged on pre-commission notional per side
    pub commission_rate: f64,
}

impl BacktestAccount {
    pub fn new(initial_cash: f64, commission_rate: f64) -> Self {
        BacktestAccount {
            initial_cash,
            cash: initial_cash,
            positions: HashMap::new(),
            trade_log: Vec::new(),
            equity_curve: Vec::new(),
            commission_rate,
        }
    }

    //returns the position for a symbol, if any
    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    //executes a trade against the ledger
    //insufficient cash or shares is non-fatal: the trade is skipped with a
    //warning and the account state is left unchanged
    pub fn execute_trade(&mut self, mut trade: Trade) -> bool {
        //commission on the pre-commission notional
        trade.commission = trade.total_cost() * self.commission_rate;

        match trade.action {
            TradeAction::Buy => {
                let total_cost = trade.total_cost();
                if self.cash < total_cost {
                    log::warn!(
                        "insufficient cash: need ${:.2}, available ${:.2}",
                        total_cost,
                        self.cash
                    );
                    return false;
                }

                self.cash -= total_cost;

                let position = self
                    .positions
                    .entry(trade.symbol.clone())
                    .or_insert_with(|| Position::new(trade.symbol.clone()));
                position.apply(&trade);
            }
            TradeAction::Sell => {
                let Some(position) = self.positions.get_mut(&trade.symbol) else {
                    log::warn!("insufficient shares: no open position in {}", trade.symbol);
                    return false;
                };
                if position.quantity < trade.quantity {
                    log::warn!(
                        "insufficient shares: {} holds {}, tried to sell {}",
                        trade.symbol,
                        position.quantity,
                        trade.quantity
                    );
                    return false;
                }

                let proceeds = trade.quantity as f64 * trade.price - trade.commission;
                self.cash += proceeds;

                position.apply(&trade);
                if position.is_flat() {
                    self.positions.remove(&trade.symbol);
                }
            }
            TradeAction::Hold => return false,
        }

        self.trade_log.push(trade);
        true
    }

    //total equity: cash plus positions marked to the given prices
    //falls back to average cost when a symbol has no quote
    pub fn total_equity(&self, current_prices: &HashMap<String, f64>) -> f64 {
        let positions_value: f64 = self
            .positions
            .values()
            .map(|position| {
                let price = current_prices
                    .get(&position.symbol)
                    .copied()
                    .unwrap_or(position.avg_cost);
                position.quantity as f64 * price
            })
            .sum();

        self.cash + positions_value
    }

    //appends a daily equity sample
    pub fn record_equity(&mut self, date: NaiveDate, equity: f64) {
        self.equity_curve.push((date, equity));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, day).unwrap()
    }

    fn trade(action: TradeAction, quantity: u32, price: f64) -> Trade {
        Trade::new(date(1), action, "TSLA", quantity, price)
    }

    #[test]
    fn initial_state() {
        let account = BacktestAccount::new(100_000.0, 0.001);
        assert_eq!(account.cash, 100_000.0);
        assert!(account.positions.is_empty());
        assert!(account.trade_log.is_empty());
    }

    #[test]
    fn buy_deducts_notional_plus_commission() {
        let mut account = BacktestAccount::new(100_000.0, 0.001);
        assert!(account.execute_trade(trade(TradeAction::Buy, 100, 100.0)));

        //100_000 - (100*100 + 100*100*0.001) = 89_990
        assert!((account.cash - 89_990.0).abs() < 1e-9);
        let position = account.get_position("TSLA").unwrap();
        assert_eq!(position.quantity, 100);
        assert_eq!(position.avg_cost, 100.0);
        assert_eq!(account.trade_log.len(), 1);
    }

    #[test]
    fn buy_rejected_when_cash_insufficient() {
        let mut account = BacktestAccount::new(100_000.0, 0.001);
        assert!(!account.execute_trade(trade(TradeAction::Buy, 10_000, 100.0)));

        //state unchanged, nothing logged
        assert_eq!(account.cash, 100_000.0);
        assert!(account.positions.is_empty());
        assert!(account.trade_log.is_empty());
    }

    #[test]
    fn sell_rejected_without_position() {
        let mut account = BacktestAccount::new(100_000.0, 0.001);
        assert!(!account.execute_trade(trade(TradeAction::Sell, 10, 100.0)));
        assert!(account.trade_log.is_empty());
    }

    #[test]
    fn sell_rejected_when_quantity_exceeds_position() {
        let mut account = BacktestAccount::new(100_000.0, 0.001);
        account.execute_trade(trade(TradeAction::Buy, 10, 100.0));
        assert!(!account.execute_trade(trade(TradeAction::Sell, 11, 100.0)));
        assert_eq!(account.get_position("TSLA").unwrap().quantity, 10);
    }

    #[test]
    fn sell_credits_proceeds_and_removes_flat_position() {
        let mut account = BacktestAccount::new(100_000.0, 0.0);
        account.execute_trade(trade(TradeAction::Buy, 10, 100.0));
        assert!(account.execute_trade(trade(TradeAction::Sell, 10, 120.0)));

        assert!(account.get_position("TSLA").is_none());
        assert!((account.cash - 100_200.0).abs() < 1e-9);
    }

    #[test]
    fn partial_sell_keeps_position_open() {
        let mut account = BacktestAccount::new(100_000.0, 0.001);
        account.execute_trade(trade(TradeAction::Buy, 10, 100.0));
        assert!(account.execute_trade(trade(TradeAction::Sell, 5, 120.0)));
        assert_eq!(account.get_position("TSLA").unwrap().quantity, 5);
    }

    #[test]
    fn total_equity_marks_positions_to_market() {
        let mut account = BacktestAccount::new(100_000.0, 0.001);
        account.execute_trade(trade(TradeAction::Buy, 100, 100.0));

        let mut prices = HashMap::new();
        prices.insert("TSLA".to_string(), 150.0);

        let expected = account.cash + 100.0 * 150.0;
        assert!((account.total_equity(&prices) - expected).abs() < 1e-9);
    }
}
