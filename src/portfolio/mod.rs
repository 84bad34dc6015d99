pub mod account;
pub mod allocator;
pub mod position;

pub use account::BacktestAccount;
pub use allocator::{AllocationError, PositionAllocator, PositionPlan, RiskBudget};
pub use position::Position;
