pub mod momentum;

pub use momentum::{MomentumSignalModel, SignalError};

use crate::data::PriceBar;
use serde::{Deserialize, Serialize};

//trade action (closed enum, no string comparisons)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl TradeAction {
    //returns the display form used in csv output and tables
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
            TradeAction::Hold => "HOLD",
        }
    }
}

//one decision per bar, produced by the signal model and never mutated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalDecision {
    pub bar: PriceBar,
    pub action: TradeAction,
    pub score: f64,
    pub reason: String,
}
