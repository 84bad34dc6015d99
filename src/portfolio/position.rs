use crate::engine::trade::Trade;
use crate::signals::TradeAction;
use serde::{Deserialize, Serialize};

//exactly one open position per symbol
//created on first buy, removed by the account when quantity reaches zero
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,

    //share count, never negative
    pub quantity: u32,

    //weighted-average entry price (pre-commission notional)
    pub avg_cost: f64,
}

impl Position {
    //creates a new flat position
    pub fn new(symbol: impl Into<String>) -> Self {
        Position {
            symbol: symbol.into(),
            quantity: 0,
            avg_cost: 0.0,
        }
    }

    //current value at the average cost
    pub fn market_value(&self) -> f64 {
        self.quantity as f64 * self.avg_cost
    }

    //applies an executed trade
    //buy: weighted-average cost; sell: pro-rata reduction
    pub fn apply(&mut self, trade: &Trade) {
        match trade.action {
            TradeAction::Buy => {
                let total_cost =
                    self.market_value() + trade.quantity as f64 * trade.price;
                self.quantity += trade.quantity;
                self.avg_cost = if self.quantity > 0 {
                    total_cost / self.quantity as f64
                } else {
                    0.0
                };
            }
            TradeAction::Sell => {
                self.quantity = self.quantity.saturating_sub(trade.quantity);
                if self.quantity == 0 {
                    self.avg_cost = 0.0;
                }
            }
            TradeAction::Hold => {}
        }
    }

    //returns true if the position holds no shares
    pub fn is_flat(&self) -> bool {
        self.quantity == 0
    }
}
