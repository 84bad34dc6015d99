use crate::portfolio::PositionPlan;
use serde::{Deserialize, Serialize};

//order lifecycle state reported by the broker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Filled,
    Cancelled,
}

//result of submitting or cancelling an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub order_id: String,
    pub status: OrderStatus,
    pub filled_quantity: u32,
    pub avg_price: f64,
    pub message: String,
}

//broker adapter for dry-run execution: every order fills immediately at
//the plan's target price
#[derive(Debug, Default)]
pub struct MockBroker;

impl MockBroker {
    pub fn new() -> Self {
        MockBroker
    }

    pub fn send_order(&self, plan: &PositionPlan) -> ExecutionReport {
        let order_id = format!(
            "MOCK-{}-{}-{}",
            plan.symbol,
            plan.action.as_str(),
            plan.quantity
        );
        log::info!(
            "submitting mock order {}: {} {} {} @ ${:.2} ({})",
            order_id,
            plan.action.as_str(),
            plan.quantity,
            plan.symbol,
            plan.target_price,
            plan.rationale
        );

        ExecutionReport {
            order_id,
            status: OrderStatus::Filled,
            filled_quantity: plan.quantity,
            avg_price: plan.target_price,
            message: "Simulated fill".to_string(),
        }
    }

    pub fn cancel_order(&self, order_id: &str) -> ExecutionReport {
        log::warn!("cancelling mock order {}", order_id);
        ExecutionReport {
            order_id: order_id.to_string(),
            status: OrderStatus::Cancelled,
            filled_quantity: 0,
            avg_price: 0.0,
            message: "Cancelled in simulation".to_string(),
        }
    }
}
