use crate::signals::TradeAction;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

//a single executed trade, appended to the trade log and never mutated after
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub symbol: String,
    pub quantity: u32,
    pub price: f64,
    pub commission: f64,
}

impl Trade {
    //creates a trade with commission not yet assessed
    pub fn new(
        date: NaiveDate,
        action: TradeAction,
        symbol: impl Into<String>,
        quantity: u32,
        price: f64,
    ) -> Self {
        Trade {
            date,
            action,
            symbol: symbol.into(),
            quantity,
            price,
            commission: 0.0,
        }
    }

    //total cost including commission
    pub fn total_cost(&self) -> f64 {
        (self.quantity as f64 * self.price).abs() + self.commission
    }
}
