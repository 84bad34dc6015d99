use crate::signals::{SignalDecision, TradeAction};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("reference price must be positive, got {0}")]
    NonPositivePrice(f64),
}

//capital and per-trade risk limits used to size positions
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskBudget {
    pub capital: f64,
    pub max_allocation_pct: f64,
    pub risk_per_trade_pct: f64,
}

impl RiskBudget {
    pub fn new(capital: f64) -> Self {
        RiskBudget {
            capital,
            max_allocation_pct: 0.2,
            risk_per_trade_pct: 0.01,
        }
    }
}

//a sizing recommendation derived from one decision, consumed immediately
//by the backtest or a broker stub
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionPlan {
    pub symbol: String,
    pub quantity: u32,
    pub action: TradeAction,
    pub rationale: String,
    pub target_price: f64,
}

//converts decisions into concrete share quantities bounded by the budget
pub struct PositionAllocator {
    symbol: String,
    risk_budget: RiskBudget,
}

impl PositionAllocator {
    pub fn new(symbol: impl Into<String>, risk_budget: RiskBudget) -> Self {
        PositionAllocator {
            symbol: symbol.into(),
            risk_budget,
        }
    }

    //returns none for hold decisions, errors on a non-positive reference
    //price (caller bug, not a market condition)
    pub fn propose(
        &self,
        decision: &SignalDecision,
        price: Option<f64>,
    ) -> Result<Option<PositionPlan>, AllocationError> {
        if decision.action == TradeAction::Hold {
            return Ok(None);
        }

        let reference_price = price.unwrap_or(decision.bar.close);
        if reference_price <= 0.0 {
            return Err(AllocationError::NonPositivePrice(reference_price));
        }

        let max_position_value = self.risk_budget.capital * self.risk_budget.max_allocation_pct;
        let risk_per_trade_value = self.risk_budget.capital * self.risk_budget.risk_per_trade_pct;

        //simplified sizing: notional stays within max allocation and a 4x
        //risk-per-trade cap, floored to a minimum of one share
        //TODO: replace with a sizing rule tied to realized volatility
        let raw_quantity = (max_position_value.min(risk_per_trade_value * 4.0)
            / reference_price) as u32;
        let quantity = raw_quantity.max(1);

        Ok(Some(PositionPlan {
            symbol: self.symbol.clone(),
            quantity,
            action: decision.action,
            rationale: decision.reason.clone(),
            target_price: reference_price,
        }))
    }
}
