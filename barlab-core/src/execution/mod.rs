//! Execution: the cost model and the broker that turns orders into fills.

pub mod broker;
pub mod cost_model;

pub use broker::{base_fill_price, Broker, SimulatedBroker};
pub use cost_model::{round_to, CostModel, FeeModel};
