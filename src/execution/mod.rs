pub mod broker;

pub use broker::{ExecutionReport, MockBroker, OrderStatus};
